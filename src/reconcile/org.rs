use tracing::warn;

use super::{Action, Change, Reconciler, Report};
use crate::discovery::discover_org;
use crate::model::OrganizationMembership;
use crate::platform::Platform;

/// Organization membership changes, in the order they are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgPlan {
    /// Desired members who are neither members nor invited.
    pub invites: Vec<String>,
    /// Desired members with an invitation still pending.
    pub already_invited: Vec<String>,
    /// Current members listed only as collaborators.
    pub demotions: Vec<String>,
    /// Current members listed nowhere.
    pub member_removals: Vec<String>,
    /// Current outside collaborators listed nowhere.
    pub collaborator_removals: Vec<String>,
}

impl OrgPlan {
    pub fn is_empty(&self) -> bool {
        self.invites.is_empty()
            && self.demotions.is_empty()
            && self.member_removals.is_empty()
            && self.collaborator_removals.is_empty()
    }
}

/// Removal checks look at the desired sets only, never at partially applied state.
pub fn plan_org(desired: &OrganizationMembership, observed: &OrganizationMembership) -> OrgPlan {
    let mut plan = OrgPlan::default();

    for login in desired
        .members
        .iter()
        .filter(|login| !observed.members.contains(*login))
    {
        if observed.pending_invites.contains(login) {
            plan.already_invited.push(login.clone());
        } else {
            plan.invites.push(login.clone());
        }
    }

    plan.demotions = desired
        .collaborators
        .iter()
        .filter(|login| observed.members.contains(*login) && !desired.members.contains(*login))
        .cloned()
        .collect();

    let listed = |login: &&String| {
        desired.members.contains(*login) || desired.collaborators.contains(*login)
    };
    plan.member_removals = observed
        .members
        .iter()
        .filter(|login| !listed(login))
        .cloned()
        .collect();
    plan.collaborator_removals = observed
        .collaborators
        .iter()
        .filter(|login| !listed(login))
        .cloned()
        .collect();

    plan
}

impl<'a, P: Platform + ?Sized> Reconciler<'a, P> {
    /// Reconciles organization membership: invitations, then demotions, then removals.
    pub async fn reconcile_org(&self, desired: &OrganizationMembership) -> Report {
        let mut report = Report::default();
        let org = self.org;

        let observed = match discover_org(self.platform, org).await {
            Ok(observed) => observed,
            Err(err) => {
                report.push(Change::new(Action::ReadOrg, org, org).failed(&err));
                return report;
            }
        };
        let plan = plan_org(desired, &observed);

        for login in &plan.invites {
            let change = Change::new(Action::InviteOrgMember, org, login);
            report.push(
                self.mutate(change, login, || self.platform.invite_org_member(org, login))
                    .await,
            );
        }
        for login in &plan.already_invited {
            report.push(
                Change::new(Action::InviteOrgMember, org, login).unchanged("pending invitation"),
            );
        }
        for login in &plan.demotions {
            let change = Change::new(Action::ConvertToOutsideCollaborator, org, login);
            report.push(
                self.mutate(change, login, || {
                    self.platform.convert_to_outside_collaborator(org, login)
                })
                .await,
            );
        }
        for login in &plan.member_removals {
            let change = Change::new(Action::RemoveOrgMember, org, login);
            report.push(
                self.mutate(change, login, || self.platform.remove_org_member(org, login))
                    .await,
            );
        }
        for login in &plan.collaborator_removals {
            warn!(
                org,
                login = %login,
                "removing outside collaborator revokes access to every repository in the organization"
            );
            let change = Change::new(Action::RemoveOutsideCollaborator, org, login)
                .with_detail("access to all organization repositories revoked");
            report.push(
                self.mutate(change, login, || {
                    self.platform.remove_outside_collaborator(org, login)
                })
                .await,
            );
        }

        report
    }

    /// Resolves `login`, then runs `op` unless this is a dry run.
    async fn mutate<F, Fut>(&self, change: Change, login: &str, op: F) -> Change
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = crate::Result<()>>,
    {
        if self.dry_run {
            return change.planned();
        }
        if let Err(err) = self.platform.get_user(login).await {
            return change.failed(&err);
        }
        change.settle(op().await)
    }
}
