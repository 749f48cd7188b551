//! Builds entities from live platform state.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::{OrganizationMembership, RepositoryAccess, TeamMembership};
use crate::platform::{Affiliation, Platform, RepoInfo, TeamInfo};
use crate::permission::TeamRole;

/// Which commits to walk when collecting contributors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContributorMode {
    #[default]
    Skip,
    /// Aggregate contributor listing of the default branch. One paged call.
    DefaultBranch,
    /// Every commit on every branch. Expensive on large repositories.
    AllBranches,
    Branch(String),
}

impl ContributorMode {
    /// Maps the command line pair `--complete [--branch <name|all>]`.
    pub fn from_flags(complete: bool, branch: Option<&str>) -> Self {
        match (complete, branch) {
            (false, _) => ContributorMode::Skip,
            (true, None) => ContributorMode::DefaultBranch,
            (true, Some("all")) => ContributorMode::AllBranches,
            (true, Some(name)) => ContributorMode::Branch(name.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RepoOptions {
    pub contributors: ContributorMode,
    /// Lower bound for the commit sweep; ignored by [`ContributorMode::DefaultBranch`].
    pub since: Option<DateTime<Utc>>,
}

pub async fn discover_org<P: Platform + ?Sized>(
    platform: &P,
    org: &str,
) -> Result<OrganizationMembership> {
    let info = platform.get_org(org).await?;
    let mut membership = OrganizationMembership::new(info.login);
    membership.name = info.name;
    membership.description = info.description;

    for login in empty_if_absent(platform.list_org_members(org).await)? {
        membership.merge_member(&login);
    }
    for login in empty_if_absent(platform.list_outside_collaborators(org).await)? {
        membership.merge_collaborator(&login);
    }
    for login in empty_if_absent(platform.list_pending_invitations(org).await)? {
        membership.merge_invitation(&login);
    }

    debug!(
        org,
        members = membership.members.len(),
        collaborators = membership.collaborators.len(),
        invitations = membership.pending_invites.len(),
        "discovered organization"
    );
    Ok(membership)
}

pub async fn discover_team<P: Platform + ?Sized>(
    platform: &P,
    org: &str,
    team: &TeamInfo,
) -> Result<TeamMembership> {
    let mut membership = TeamMembership::new(&team.slug);
    membership.name = Some(team.name.clone());
    membership.description = team.description.clone();
    membership.html_url = team.html_url.clone();
    membership.id = Some(team.id);
    if let Some(parent) = &team.parent {
        membership.parent_id = Some(parent.id);
        membership.parent_name = Some(parent.name.clone());
    }

    // Maintainers first, then members. A login reported under both ends up a
    // member: the later pass wins.
    for role in [TeamRole::Maintainer, TeamRole::Member] {
        for login in platform.list_team_members(org, &team.slug, role).await? {
            if let Some(previous) = membership.merge(&login, role) {
                warn!(
                    team = %team.slug,
                    login = %login,
                    "platform reports login as both {previous} and {role}; keeping {role}"
                );
            }
        }
    }

    Ok(membership)
}

pub async fn discover_team_by_slug<P: Platform + ?Sized>(
    platform: &P,
    org: &str,
    slug: &str,
) -> Result<TeamMembership> {
    let info = platform.get_team(org, slug).await?;
    discover_team(platform, org, &info).await
}

pub async fn discover_repo<P: Platform + ?Sized>(
    platform: &P,
    org: &str,
    repo: &RepoInfo,
    options: &RepoOptions,
) -> Result<RepositoryAccess> {
    let mut access = RepositoryAccess::new(&repo.name);
    access.description = repo.description.clone();
    access.html_url = repo.html_url.clone();

    for affiliation in [Affiliation::Direct, Affiliation::Outside] {
        for (login, capabilities) in platform
            .list_collaborators(org, &repo.name, affiliation)
            .await?
        {
            let Some(role) = capabilities.effective_role() else {
                debug!(repo = %repo.name, %login, "collaborator without any permission flag");
                continue;
            };
            match affiliation {
                Affiliation::Direct => access.merge_direct(&login, role),
                Affiliation::Outside => access.merge_outside(&login, role),
            };
        }
    }

    for (slug, capabilities) in platform.list_repo_teams(org, &repo.name).await? {
        match capabilities.effective_role() {
            Some(role) => {
                access.merge_team(&slug, role);
            }
            None => debug!(repo = %repo.name, team = %slug, "team without any permission flag"),
        }
    }

    discover_contributors(platform, org, repo, options, &mut access).await;
    Ok(access)
}

/// Best effort: failures are logged and whatever was collected is kept.
async fn discover_contributors<P: Platform + ?Sized>(
    platform: &P,
    org: &str,
    repo: &RepoInfo,
    options: &RepoOptions,
    access: &mut RepositoryAccess,
) {
    let branches = match &options.contributors {
        ContributorMode::Skip => return,
        ContributorMode::DefaultBranch => {
            match platform.list_contributors(org, &repo.name).await {
                Ok(logins) => logins.iter().for_each(|login| access.add_contributor(login)),
                Err(err) => warn!(repo = %repo.name, "failed to list contributors: {err}"),
            }
            return;
        }
        ContributorMode::Branch(name) => vec![name.clone()],
        ContributorMode::AllBranches => match platform.list_branches(org, &repo.name).await {
            Ok(branches) => branches,
            Err(err) => {
                warn!(repo = %repo.name, "failed to list branches: {err}");
                return;
            }
        },
    };

    for branch in branches {
        match platform
            .list_commit_authors(org, &repo.name, &branch, options.since)
            .await
        {
            Ok(authors) => authors
                .iter()
                .flatten()
                .for_each(|login| access.add_contributor(login)),
            Err(err) => warn!(repo = %repo.name, %branch, "failed to walk commits: {err}"),
        }
    }
}

fn empty_if_absent(listing: Result<Vec<String>>) -> Result<Vec<String>> {
    match listing {
        Err(err) if err.is_not_found() => Ok(vec![]),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contributor_mode_follows_flags() {
        assert_eq!(ContributorMode::from_flags(false, Some("all")), ContributorMode::Skip);
        assert_eq!(ContributorMode::from_flags(true, None), ContributorMode::DefaultBranch);
        assert_eq!(ContributorMode::from_flags(true, Some("all")), ContributorMode::AllBranches);
        assert_eq!(
            ContributorMode::from_flags(true, Some("release")),
            ContributorMode::Branch("release".to_string())
        );
    }
}
