use std::collections::BTreeSet;

use super::{Canonical, Kind};

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationMembership {
    #[serde(skip)]
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub members: BTreeSet<String>,
    /// Outside collaborators: repository access without membership.
    #[serde(default)]
    pub collaborators: BTreeSet<String>,
    /// Read from the platform only; never a mutation target.
    #[serde(default)]
    pub pending_invites: BTreeSet<String>,
}

impl OrganizationMembership {
    pub fn new(login: impl Into<String>) -> Self {
        OrganizationMembership {
            login: login.into(),
            ..Default::default()
        }
    }

    pub fn merge_member(&mut self, login: &str) {
        self.members.insert(login.to_string());
    }

    pub fn merge_collaborator(&mut self, login: &str) {
        self.collaborators.insert(login.to_string());
    }

    pub fn merge_invitation(&mut self, login: &str) {
        self.pending_invites.insert(login.to_string());
    }
}

impl Canonical for OrganizationMembership {
    const KIND: Kind = Kind::Org;

    fn key(&self) -> &str {
        &self.login
    }
}
