use super::{Action, Change, Reconciler, Report};
use crate::discovery::discover_team;
use crate::model::TeamMembership;
use crate::permission::TeamRole;
use crate::platform::{NewTeam, Platform, TeamInfo};

/// What it takes to turn `observed` into `desired` for one team.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamPlan {
    /// Logins whose observed `(role, login)` pair is not desired.
    pub removals: Vec<String>,
    /// Desired `(login, role)` pairs not observed at exactly that role.
    pub additions: Vec<(String, TeamRole)>,
    /// New description, when the document sets one that differs.
    pub description: Option<String>,
}

impl TeamPlan {
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.additions.is_empty() && self.description.is_none()
    }
}

/// Role is part of the identity being compared, so a role change shows up as
/// one removal plus one addition.
pub fn plan_team(desired: &TeamMembership, observed: &TeamMembership) -> TeamPlan {
    let removals = observed
        .members
        .pairs()
        .filter(|(role, login)| !desired.members.contains(*role, login))
        .map(|(_, login)| login.to_string())
        .collect();
    let additions = desired
        .members
        .pairs()
        .filter(|(role, login)| !observed.members.contains(*role, login))
        .map(|(role, login)| (login.to_string(), role))
        .collect();
    // An absent description in the document leaves the team's alone.
    let description = desired
        .description
        .as_deref()
        .filter(|wanted| observed.description.as_deref().unwrap_or("") != *wanted)
        .map(str::to_string);

    TeamPlan {
        removals,
        additions,
        description,
    }
}

impl<'a, P: Platform + ?Sized> Reconciler<'a, P> {
    /// Reconciles one team's membership and description against `desired`.
    pub async fn reconcile_team(&self, desired: &TeamMembership) -> Report {
        let mut report = Report::default();
        let Some(observed) = self.observe_team(desired, &mut report).await else {
            return report;
        };

        let plan = plan_team(desired, &observed);
        let slug = observed.slug.as_str();
        tracing::debug!(
            team = slug,
            removals = plan.removals.len(),
            additions = plan.additions.len(),
            "planned team changes"
        );

        // Removals first, then additions: a role change removes the old pair
        // before setting the new one.
        for login in &plan.removals {
            report.push(self.remove_team_member(slug, login).await);
        }
        for (login, role) in &plan.additions {
            report.push(self.add_team_member(slug, login, *role).await);
        }
        if let Some(description) = &plan.description {
            report.push(self.update_description(&observed, description).await);
        }
        report
    }

    async fn observe_team(
        &self,
        desired: &TeamMembership,
        report: &mut Report,
    ) -> Option<TeamMembership> {
        let slug = desired.slug.as_str();
        let info = match self.platform.get_team(self.org, slug).await {
            Ok(info) => info,
            Err(err) if err.is_not_found() && self.create_teams => {
                return self.create_team(desired, report).await;
            }
            Err(err) => {
                report.push(Change::new(Action::ReadTeam, slug, slug).failed(&err));
                return None;
            }
        };
        self.discover(&info, report).await
    }

    async fn discover(&self, info: &TeamInfo, report: &mut Report) -> Option<TeamMembership> {
        match discover_team(self.platform, self.org, info).await {
            Ok(observed) => Some(observed),
            Err(err) => {
                report.push(Change::new(Action::ReadTeam, &info.slug, &info.slug).failed(&err));
                None
            }
        }
    }

    /// Creates the team, or adopts an existing one with the same display name.
    async fn create_team(
        &self,
        desired: &TeamMembership,
        report: &mut Report,
    ) -> Option<TeamMembership> {
        let name = desired.name.clone().unwrap_or_else(|| desired.slug.clone());
        let change = Change::new(Action::CreateTeam, self.org, &desired.slug);

        if self.dry_run {
            report.push(change.planned());
            let mut planned = TeamMembership::new(&desired.slug);
            planned.name = Some(name);
            planned.description = desired.description.clone();
            return Some(planned);
        }

        let existing = match self.platform.list_teams(self.org).await {
            Ok(teams) => teams.into_iter().find(|team| team.name == name),
            Err(err) => {
                report.push(change.failed(&err));
                return None;
            }
        };
        let info = match existing {
            Some(team) => {
                report.push(change.unchanged(format!(
                    "a team named {name} already exists with slug {}",
                    team.slug
                )));
                team
            }
            None => {
                let request = NewTeam {
                    name,
                    description: desired.description.clone(),
                    parent_id: desired.parent_id,
                    privacy: "closed".to_string(),
                };
                match self.platform.create_team(self.org, &request).await {
                    Ok(team) => {
                        report.push(change.with_detail(format!("slug {}", team.slug)));
                        team
                    }
                    Err(err) => {
                        report.push(change.failed(&err));
                        return None;
                    }
                }
            }
        };
        self.discover(&info, report).await
    }

    async fn remove_team_member(&self, slug: &str, login: &str) -> Change {
        let change = Change::new(Action::RemoveTeamMember, slug, login);
        if self.dry_run {
            return change.planned();
        }
        if let Err(err) = self.platform.get_user(login).await {
            return change.failed(&err);
        }
        change.settle(
            self.platform
                .remove_team_membership(self.org, slug, login)
                .await,
        )
    }

    async fn add_team_member(&self, slug: &str, login: &str, role: TeamRole) -> Change {
        let change = Change::new(Action::AddTeamMember { role }, slug, login);
        if self.dry_run {
            return change.planned();
        }
        if let Err(err) = self.platform.get_user(login).await {
            return change.failed(&err);
        }
        match self.platform.get_team_membership(self.org, slug, login).await {
            Ok(Some(current)) if current == role => {
                return change.unchanged(format!("already {role}"));
            }
            Ok(_) => {}
            Err(err) => return change.failed(&err),
        }
        change.settle(
            self.platform
                .set_team_membership(self.org, slug, login, role)
                .await,
        )
    }

    /// The display name is sent back unchanged; only the description moves.
    async fn update_description(&self, observed: &TeamMembership, description: &str) -> Change {
        let slug = observed.slug.as_str();
        let change = Change::new(Action::EditTeamDescription, slug, slug);
        if self.dry_run {
            return change.planned();
        }
        let name = observed.name.as_deref().unwrap_or(slug);
        change.settle(
            self.platform
                .edit_team(self.org, slug, name, description)
                .await,
        )
    }
}
