pub mod config;
pub mod discovery;
pub mod document;
pub mod error;
pub mod model;
pub mod permission;
pub mod platform;
pub mod reconcile;

pub use error::{Error, Result};
pub use model::{Entity, OrganizationMembership, RepositoryAccess, TeamMembership};
pub use permission::{Capabilities, RepoRole, TeamRole};
pub use platform::{GitHub, Platform};
pub use reconcile::{Reconciler, Report};
