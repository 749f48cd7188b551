use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Repository permission levels, most privileged first.
#[derive(
    serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum RepoRole {
    Admin,
    Maintain,
    Write,
    Triage,
    Read,
}

impl RepoRole {
    pub const ALL: [RepoRole; 5] = [
        RepoRole::Admin,
        RepoRole::Maintain,
        RepoRole::Write,
        RepoRole::Triage,
        RepoRole::Read,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RepoRole::Admin => "admin",
            RepoRole::Maintain => "maintain",
            RepoRole::Write => "write",
            RepoRole::Triage => "triage",
            RepoRole::Read => "read",
        }
    }

    /// Accepts both the UI names and the REST names (`push`, `pull`).
    pub fn from_api_name(name: &str) -> Option<RepoRole> {
        match name {
            "admin" => Some(RepoRole::Admin),
            "maintain" => Some(RepoRole::Maintain),
            "write" | "push" => Some(RepoRole::Write),
            "triage" => Some(RepoRole::Triage),
            "read" | "pull" => Some(RepoRole::Read),
            _ => None,
        }
    }
}

impl fmt::Display for RepoRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepoRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RepoRole::from_api_name(s)
            .ok_or_else(|| Error::Document(format!("unknown repository role `{s}`")))
    }
}

#[derive(
    serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Maintainer,
    Member,
}

impl TeamRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Maintainer => "maintainer",
            TeamRole::Member => "member",
        }
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maintainer" => Ok(TeamRole::Maintainer),
            "member" => Ok(TeamRole::Member),
            _ => Err(Error::Document(format!("unknown team role `{s}`"))),
        }
    }
}

/// Boolean capability flags as the platform reports them for a collaborator or a team.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub maintain: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub triage: bool,
    #[serde(default)]
    pub pull: bool,
}

impl Capabilities {
    /// The single effective role: the highest satisfied flag in the order
    /// admin > maintain > push > triage > pull. Lower flags are ignored.
    pub fn effective_role(&self) -> Option<RepoRole> {
        if self.admin {
            Some(RepoRole::Admin)
        } else if self.maintain {
            Some(RepoRole::Maintain)
        } else if self.push {
            Some(RepoRole::Write)
        } else if self.triage {
            Some(RepoRole::Triage)
        } else if self.pull {
            Some(RepoRole::Read)
        } else {
            None
        }
    }

    /// Flags implied by a single role, e.g. write implies triage and read.
    pub fn from_role(role: RepoRole) -> Capabilities {
        // Variants are declared most privileged first, so `role <= r` means "grants r".
        let at_least = |r: RepoRole| role <= r;
        Capabilities {
            admin: at_least(RepoRole::Admin),
            maintain: at_least(RepoRole::Maintain),
            push: at_least(RepoRole::Write),
            triage: at_least(RepoRole::Triage),
            pull: at_least(RepoRole::Read),
        }
    }
}

impl From<&octocrab::models::Permissions> for Capabilities {
    fn from(perm: &octocrab::models::Permissions) -> Self {
        Capabilities {
            admin: perm.admin,
            maintain: perm.maintain,
            push: perm.push,
            triage: perm.triage,
            pull: perm.pull,
        }
    }
}
