//! In-memory access-control entities.
//!
//! Each entity is built fresh per run, either from a parsed document (desired
//! state) or from discovery (observed state). Entities only ever grow through
//! `merge`; deciding what to remove is the reconciler's job.

mod buckets;
mod org;
mod repo;
mod team;

pub use buckets::RoleBuckets;
pub use org::OrganizationMembership;
pub use repo::RepositoryAccess;
pub use team::TeamMembership;

use serde_yaml::{Mapping, Value};

use crate::error::Result;

/// Entity kind tag written to the `type` field of every document entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Repo,
    Team,
    Org,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Repo => "repo",
            Kind::Team => "team",
            Kind::Org => "org",
        }
    }

    pub fn parse(tag: &str) -> Option<Kind> {
        match tag {
            "repo" => Some(Kind::Repo),
            "team" => Some(Kind::Team),
            "org" => Some(Kind::Org),
            _ => None,
        }
    }
}

/// Common shape of the three entities as far as the document is concerned.
pub trait Canonical: serde::Serialize {
    const KIND: Kind;

    /// Document key: repository name, team slug or organization login.
    fn key(&self) -> &str;

    /// Nested mapping with sets flattened to sequences and `type` first.
    fn canonical_form(&self) -> Result<Value> {
        let mut form = Mapping::new();
        form.insert("type".into(), Self::KIND.as_str().into());
        if let Value::Mapping(fields) = serde_yaml::to_value(self)? {
            form.extend(fields);
        }
        Ok(Value::Mapping(form))
    }
}

/// Any entity that can appear in a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Repo(RepositoryAccess),
    Team(TeamMembership),
    Org(OrganizationMembership),
}

impl Entity {
    pub fn key(&self) -> &str {
        match self {
            Entity::Repo(repo) => repo.key(),
            Entity::Team(team) => team.key(),
            Entity::Org(org) => org.key(),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Entity::Repo(_) => Kind::Repo,
            Entity::Team(_) => Kind::Team,
            Entity::Org(_) => Kind::Org,
        }
    }

    pub fn canonical_form(&self) -> Result<Value> {
        match self {
            Entity::Repo(repo) => repo.canonical_form(),
            Entity::Team(team) => team.canonical_form(),
            Entity::Org(org) => org.canonical_form(),
        }
    }
}

impl From<RepositoryAccess> for Entity {
    fn from(repo: RepositoryAccess) -> Self {
        Entity::Repo(repo)
    }
}

impl From<TeamMembership> for Entity {
    fn from(team: TeamMembership) -> Self {
        Entity::Team(team)
    }
}

impl From<OrganizationMembership> for Entity {
    fn from(org: OrganizationMembership) -> Self {
        Entity::Org(org)
    }
}
