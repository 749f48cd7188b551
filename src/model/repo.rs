use std::collections::BTreeSet;

use super::{Canonical, Kind, RoleBuckets};
use crate::permission::RepoRole;

/// Who can reach a repository, and how.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryAccess {
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub direct_collabs: RoleBuckets<RepoRole>,
    #[serde(default)]
    pub outside_collabs: RoleBuckets<RepoRole>,
    /// Team slugs by the permission the team holds on the repository.
    #[serde(default)]
    pub teams: RoleBuckets<RepoRole>,
    /// Commit authors. Discovery output only, never reconciled.
    #[serde(default)]
    pub contributors: BTreeSet<String>,
}

impl RepositoryAccess {
    pub fn new(name: impl Into<String>) -> Self {
        RepositoryAccess {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn merge_direct(&mut self, login: &str, role: RepoRole) -> Option<RepoRole> {
        self.direct_collabs.merge(login, role)
    }

    pub fn merge_outside(&mut self, login: &str, role: RepoRole) -> Option<RepoRole> {
        self.outside_collabs.merge(login, role)
    }

    pub fn merge_team(&mut self, slug: &str, role: RepoRole) -> Option<RepoRole> {
        self.teams.merge(slug, role)
    }

    pub fn add_contributor(&mut self, login: &str) {
        self.contributors.insert(login.to_string());
    }
}

impl Canonical for RepositoryAccess {
    const KIND: Kind = Kind::Repo;

    fn key(&self) -> &str {
        &self.name
    }
}
