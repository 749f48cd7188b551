//! Boundary to the hosting platform.
//!
//! Discovery and the reconciler only ever talk to a [`Platform`] passed in by
//! the caller; there is no global client. [`GitHub`] is the real
//! implementation, tests provide an in-memory one.

mod github;

pub use github::GitHub;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::permission::{Capabilities, TeamRole};

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgInfo {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentTeam {
    pub id: u64,
    pub name: String,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamInfo {
    pub id: u64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub parent: Option<ParentTeam>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// Request body for creating a team.
#[derive(serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NewTeam {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "parent_team_id", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,
    pub privacy: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affiliation {
    /// Granted explicitly on the repository.
    Direct,
    /// Not an organization member.
    Outside,
}

impl Affiliation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Affiliation::Direct => "direct",
            Affiliation::Outside => "outside",
        }
    }
}

/// Every platform call used by discovery and reconciliation.
///
/// Calls fail with [`Error::NotFound`](crate::Error::NotFound) for unknown
/// logins, teams, repositories or organizations, and with
/// [`Error::Platform`](crate::Error::Platform) for everything else.
#[async_trait]
pub trait Platform: Send + Sync {
    // Organization
    async fn get_org(&self, org: &str) -> Result<OrgInfo>;
    async fn list_org_members(&self, org: &str) -> Result<Vec<String>>;
    async fn list_outside_collaborators(&self, org: &str) -> Result<Vec<String>>;
    async fn list_pending_invitations(&self, org: &str) -> Result<Vec<String>>;
    /// Resolves a login to an existing account, returning its canonical spelling.
    async fn get_user(&self, login: &str) -> Result<String>;
    async fn invite_org_member(&self, org: &str, login: &str) -> Result<()>;
    async fn convert_to_outside_collaborator(&self, org: &str, login: &str) -> Result<()>;
    async fn remove_org_member(&self, org: &str, login: &str) -> Result<()>;
    /// Also revokes every repository grant the account held as a collaborator.
    async fn remove_outside_collaborator(&self, org: &str, login: &str) -> Result<()>;

    // Teams
    async fn list_teams(&self, org: &str) -> Result<Vec<TeamInfo>>;
    async fn get_team(&self, org: &str, slug: &str) -> Result<TeamInfo>;
    async fn create_team(&self, org: &str, team: &NewTeam) -> Result<TeamInfo>;
    async fn list_team_members(&self, org: &str, slug: &str, role: TeamRole)
        -> Result<Vec<String>>;
    /// `None` when the login is not on the team.
    async fn get_team_membership(
        &self,
        org: &str,
        slug: &str,
        login: &str,
    ) -> Result<Option<TeamRole>>;
    async fn set_team_membership(
        &self,
        org: &str,
        slug: &str,
        login: &str,
        role: TeamRole,
    ) -> Result<()>;
    async fn remove_team_membership(&self, org: &str, slug: &str, login: &str) -> Result<()>;
    /// The platform insists on the name being sent along with the description.
    async fn edit_team(&self, org: &str, slug: &str, name: &str, description: &str)
        -> Result<()>;

    // Repositories
    async fn list_repos(&self, org: &str) -> Result<Vec<RepoInfo>>;
    async fn get_repo(&self, org: &str, repo: &str) -> Result<RepoInfo>;
    async fn list_collaborators(
        &self,
        org: &str,
        repo: &str,
        affiliation: Affiliation,
    ) -> Result<Vec<(String, Capabilities)>>;
    /// Team slugs with access to the repository and their computed permissions.
    async fn list_repo_teams(&self, org: &str, repo: &str) -> Result<Vec<(String, Capabilities)>>;
    async fn list_branches(&self, org: &str, repo: &str) -> Result<Vec<String>>;
    /// Author login of every commit reachable from `branch`; `None` for unlinked authors.
    async fn list_commit_authors(
        &self,
        org: &str,
        repo: &str,
        branch: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Option<String>>>;
    /// Aggregate contributors of the default branch.
    async fn list_contributors(&self, org: &str, repo: &str) -> Result<Vec<String>>;
}
