//! Drives live state toward a desired document.
//!
//! Each reconciliation reads the observed state right before planning, so
//! there is a window in which someone else may change the platform. Nothing
//! guards against that; re-running converges again.
//!
//! Every change is applied on its own. A failing login is recorded as a
//! warning and the pass carries on with the next one; nothing is retried.

mod org;
mod report;
mod team;

pub use org::{plan_org, OrgPlan};
pub use report::{Action, Change, Outcome, Report, Summary};
pub use team::{plan_team, TeamPlan};

use crate::platform::Platform;

pub struct Reconciler<'a, P: Platform + ?Sized> {
    platform: &'a P,
    org: &'a str,
    dry_run: bool,
    create_teams: bool,
}

impl<'a, P: Platform + ?Sized> Reconciler<'a, P> {
    pub fn new(platform: &'a P, org: &'a str) -> Self {
        Reconciler {
            platform,
            org,
            dry_run: false,
            create_teams: false,
        }
    }

    /// Report planned changes without issuing any mutation.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Create teams that exist in the document but not on the platform.
    pub fn create_teams(mut self, create_teams: bool) -> Self {
        self.create_teams = create_teams;
        self
    }
}
