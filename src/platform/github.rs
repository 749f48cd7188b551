use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::models::Repository;
use octocrab::{Octocrab, Page};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{Affiliation, NewTeam, OrgInfo, Platform, RepoInfo, TeamInfo};
use crate::error::Result;
use crate::permission::{Capabilities, RepoRole, TeamRole};

const PER_PAGE: u8 = 100;

#[derive(serde::Deserialize)]
struct Login {
    login: String,
}

#[derive(serde::Deserialize)]
struct Invitation {
    login: Option<String>,
}

#[derive(serde::Deserialize)]
struct Collaborator {
    login: String,
    #[serde(default)]
    permissions: Capabilities,
}

#[derive(serde::Deserialize)]
struct RepoTeam {
    slug: String,
    #[serde(default)]
    permission: Option<String>,
    #[serde(default)]
    permissions: Option<Capabilities>,
}

impl RepoTeam {
    fn capabilities(&self) -> Capabilities {
        match (&self.permissions, &self.permission) {
            (Some(flags), _) => *flags,
            (None, Some(name)) => RepoRole::from_api_name(name)
                .map(Capabilities::from_role)
                .unwrap_or_default(),
            (None, None) => Capabilities::default(),
        }
    }
}

#[derive(serde::Deserialize)]
struct TeamMembershipState {
    role: TeamRole,
}

/// [`Platform`] backed by the GitHub REST API.
pub struct GitHub {
    client: Octocrab,
}

impl GitHub {
    pub fn new(token: &str) -> Result<Self> {
        let client = octocrab::OctocrabBuilder::new()
            .personal_token(token.to_string())
            .build()?;
        Ok(GitHub { client })
    }

    pub fn from_client(client: Octocrab) -> Self {
        GitHub { client }
    }

    /// Follows `page` numbers until the `Link` header has no `next`.
    async fn get_all<T: DeserializeOwned>(
        &self,
        route: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut items = vec![];
        let mut page = 1u32;
        loop {
            let page_number = page.to_string();
            let per_page = PER_PAGE.to_string();
            let mut query = vec![("per_page", per_page.as_str()), ("page", page_number.as_str())];
            query.extend_from_slice(params);

            debug!(route, page, "GET");
            let mut response: Page<T> = self.client.get(route, Some(&query)).await?;
            items.extend(response.take_items());

            if response.next.is_none() {
                break;
            } else {
                page += 1;
            }
        }
        Ok(items)
    }

    async fn logins(&self, route: &str, params: &[(&str, &str)]) -> Result<Vec<String>> {
        let users: Vec<Login> = self.get_all(route, params).await?;
        Ok(users.into_iter().map(|user| user.login).collect())
    }

    /// For endpoints answering `204 No Content`.
    async fn delete_empty(&self, route: &str) -> Result<()> {
        debug!(route, "DELETE");
        let response = self.client._delete(route, None::<&()>).await?;
        octocrab::map_github_error(response).await?;
        Ok(())
    }

    async fn put_empty(&self, route: &str) -> Result<()> {
        debug!(route, "PUT");
        let response = self.client._put(route, None::<&()>).await?;
        octocrab::map_github_error(response).await?;
        Ok(())
    }
}

fn repo_info(repo: Repository) -> RepoInfo {
    RepoInfo {
        name: repo.name,
        description: repo.description,
        html_url: repo.html_url.map(|url| url.to_string()),
        default_branch: repo.default_branch,
    }
}

#[async_trait]
impl Platform for GitHub {
    async fn get_org(&self, org: &str) -> Result<OrgInfo> {
        Ok(self.client.get(format!("/orgs/{org}"), None::<&()>).await?)
    }

    async fn list_org_members(&self, org: &str) -> Result<Vec<String>> {
        self.logins(&format!("/orgs/{org}/members"), &[]).await
    }

    async fn list_outside_collaborators(&self, org: &str) -> Result<Vec<String>> {
        self.logins(&format!("/orgs/{org}/outside_collaborators"), &[])
            .await
    }

    async fn list_pending_invitations(&self, org: &str) -> Result<Vec<String>> {
        let invitations: Vec<Invitation> = self
            .get_all(&format!("/orgs/{org}/invitations"), &[])
            .await?;
        // Invitations sent by email have no login yet.
        Ok(invitations
            .into_iter()
            .filter_map(|invitation| invitation.login)
            .collect())
    }

    async fn get_user(&self, login: &str) -> Result<String> {
        let user: Login = self
            .client
            .get(format!("/users/{login}"), None::<&()>)
            .await?;
        Ok(user.login)
    }

    async fn invite_org_member(&self, org: &str, login: &str) -> Result<()> {
        let _: serde_json::Value = self
            .client
            .put(
                format!("/orgs/{org}/memberships/{login}"),
                Some(&serde_json::json!({ "role": "member" })),
            )
            .await?;
        Ok(())
    }

    async fn convert_to_outside_collaborator(&self, org: &str, login: &str) -> Result<()> {
        self.put_empty(&format!("/orgs/{org}/outside_collaborators/{login}"))
            .await
    }

    async fn remove_org_member(&self, org: &str, login: &str) -> Result<()> {
        self.delete_empty(&format!("/orgs/{org}/members/{login}"))
            .await
    }

    async fn remove_outside_collaborator(&self, org: &str, login: &str) -> Result<()> {
        self.delete_empty(&format!("/orgs/{org}/outside_collaborators/{login}"))
            .await
    }

    async fn list_teams(&self, org: &str) -> Result<Vec<TeamInfo>> {
        self.get_all(&format!("/orgs/{org}/teams"), &[]).await
    }

    async fn get_team(&self, org: &str, slug: &str) -> Result<TeamInfo> {
        Ok(self
            .client
            .get(format!("/orgs/{org}/teams/{slug}"), None::<&()>)
            .await?)
    }

    async fn create_team(&self, org: &str, team: &NewTeam) -> Result<TeamInfo> {
        Ok(self
            .client
            .post(format!("/orgs/{org}/teams"), Some(team))
            .await?)
    }

    async fn list_team_members(
        &self,
        org: &str,
        slug: &str,
        role: TeamRole,
    ) -> Result<Vec<String>> {
        self.logins(
            &format!("/orgs/{org}/teams/{slug}/members"),
            &[("role", role.as_str())],
        )
        .await
    }

    async fn get_team_membership(
        &self,
        org: &str,
        slug: &str,
        login: &str,
    ) -> Result<Option<TeamRole>> {
        let membership: Result<TeamMembershipState> = self
            .client
            .get(
                format!("/orgs/{org}/teams/{slug}/memberships/{login}"),
                None::<&()>,
            )
            .await
            .map_err(Into::into);
        match membership {
            Ok(state) => Ok(Some(state.role)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn set_team_membership(
        &self,
        org: &str,
        slug: &str,
        login: &str,
        role: TeamRole,
    ) -> Result<()> {
        let _: serde_json::Value = self
            .client
            .put(
                format!("/orgs/{org}/teams/{slug}/memberships/{login}"),
                Some(&serde_json::json!({ "role": role })),
            )
            .await?;
        Ok(())
    }

    async fn remove_team_membership(&self, org: &str, slug: &str, login: &str) -> Result<()> {
        self.delete_empty(&format!("/orgs/{org}/teams/{slug}/memberships/{login}"))
            .await
    }

    async fn edit_team(
        &self,
        org: &str,
        slug: &str,
        name: &str,
        description: &str,
    ) -> Result<()> {
        let _: serde_json::Value = self
            .client
            .patch(
                format!("/orgs/{org}/teams/{slug}"),
                Some(&serde_json::json!({ "name": name, "description": description })),
            )
            .await?;
        Ok(())
    }

    async fn list_repos(&self, org: &str) -> Result<Vec<RepoInfo>> {
        let mut repos = vec![];
        let mut page = 1u32;
        loop {
            let mut response = self
                .client
                .orgs(org)
                .list_repos()
                .page(page)
                .per_page(PER_PAGE)
                .send()
                .await?;
            repos.extend(response.take_items().into_iter().map(repo_info));

            if response.next.is_none() {
                break;
            } else {
                page += 1;
            }
        }
        Ok(repos)
    }

    async fn get_repo(&self, org: &str, repo: &str) -> Result<RepoInfo> {
        Ok(repo_info(self.client.repos(org, repo).get().await?))
    }

    async fn list_collaborators(
        &self,
        org: &str,
        repo: &str,
        affiliation: Affiliation,
    ) -> Result<Vec<(String, Capabilities)>> {
        let collaborators: Vec<Collaborator> = self
            .get_all(
                &format!("/repos/{org}/{repo}/collaborators"),
                &[("affiliation", affiliation.as_str())],
            )
            .await?;
        Ok(collaborators
            .into_iter()
            .map(|collaborator| (collaborator.login, collaborator.permissions))
            .collect())
    }

    async fn list_repo_teams(&self, org: &str, repo: &str) -> Result<Vec<(String, Capabilities)>> {
        let teams: Vec<RepoTeam> = self
            .get_all(&format!("/repos/{org}/{repo}/teams"), &[])
            .await?;
        Ok(teams
            .into_iter()
            .map(|team| {
                let capabilities = team.capabilities();
                (team.slug, capabilities)
            })
            .collect())
    }

    async fn list_branches(&self, org: &str, repo: &str) -> Result<Vec<String>> {
        let mut branches = vec![];
        let mut page = 1u32;
        loop {
            let mut response = self
                .client
                .repos(org, repo)
                .list_branches()
                .per_page(PER_PAGE)
                .page(page)
                .send()
                .await?;
            branches.extend(response.take_items().into_iter().map(|branch| branch.name));

            if response.next.is_none() {
                break;
            } else {
                page += 1;
            }
        }
        Ok(branches)
    }

    async fn list_commit_authors(
        &self,
        org: &str,
        repo: &str,
        branch: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Option<String>>> {
        let repo_client = self.client.repos(org, repo);
        let mut authors = vec![];
        let mut page = 1u32;
        loop {
            let mut request = repo_client
                .list_commits()
                .branch(branch)
                .per_page(PER_PAGE)
                .page(page);
            if let Some(since) = since {
                request = request.since(since);
            }
            let mut response = request.send().await?;
            authors.extend(
                response
                    .take_items()
                    .into_iter()
                    .map(|commit| commit.author.map(|author| author.login)),
            );

            if response.next.is_none() {
                break;
            } else {
                page += 1;
            }
        }
        Ok(authors)
    }

    async fn list_contributors(&self, org: &str, repo: &str) -> Result<Vec<String>> {
        self.logins(&format!("/repos/{org}/{repo}/contributors"), &[])
            .await
    }
}
