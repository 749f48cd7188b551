use super::{Canonical, Kind, RoleBuckets};
use crate::permission::TeamRole;

/// Team membership keyed by slug. The display name is informational only.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamMembership {
    #[serde(skip)]
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub parent_name: Option<String>,
    #[serde(default)]
    pub members: RoleBuckets<TeamRole>,
}

impl TeamMembership {
    pub fn new(slug: impl Into<String>) -> Self {
        TeamMembership {
            slug: slug.into(),
            ..Default::default()
        }
    }

    /// Files `login` under `role`, returning the role it displaced, if any.
    pub fn merge(&mut self, login: &str, role: TeamRole) -> Option<TeamRole> {
        self.members.merge(login, role)
    }
}

impl Canonical for TeamMembership {
    const KIND: Kind = Kind::Team;

    fn key(&self) -> &str {
        &self.slug
    }
}
