//! In-memory platform for integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use gh_access::platform::{Affiliation, NewTeam, OrgInfo, ParentTeam, RepoInfo, TeamInfo};
use gh_access::{Capabilities, Error, Platform, Result, TeamRole};

/// Every mutation the platform received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    InviteOrgMember(String),
    ConvertToOutsideCollaborator(String),
    RemoveOrgMember(String),
    RemoveOutsideCollaborator(String),
    CreateTeam(String),
    SetTeamMembership(String, String, TeamRole),
    RemoveTeamMembership(String, String),
    EditTeam(String, String, String),
}

#[derive(Default)]
struct FakeTeam {
    info: TeamInfo,
    members: BTreeMap<String, TeamRole>,
    /// Reported by the role listings on top of `members`.
    extra_listing: Vec<(String, TeamRole)>,
    /// Visible to membership lookups but missing from listings.
    hidden: BTreeMap<String, TeamRole>,
}

#[derive(Default)]
pub struct FakeRepo {
    pub info: RepoInfo,
    pub direct: Vec<(String, Capabilities)>,
    pub outside: Vec<(String, Capabilities)>,
    pub teams: Vec<(String, Capabilities)>,
    pub branches: BTreeMap<String, Vec<Option<String>>>,
    pub broken_branches: HashSet<String>,
    pub contributors: Vec<String>,
}

#[derive(Default)]
struct State {
    org: OrgInfo,
    users: BTreeSet<String>,
    members: BTreeSet<String>,
    outside: BTreeSet<String>,
    invitations: Option<BTreeSet<String>>,
    teams: BTreeMap<String, FakeTeam>,
    repos: BTreeMap<String, FakeRepo>,
    failing: HashSet<String>,
    calls: Vec<Call>,
    next_team_id: u64,
}

pub struct FakePlatform {
    state: Mutex<State>,
}

impl FakePlatform {
    pub fn new(org: &str) -> Self {
        let state = State {
            org: OrgInfo {
                login: org.to_string(),
                name: Some(format!("{org} inc.")),
                description: None,
            },
            invitations: Some(BTreeSet::new()),
            next_team_id: 100,
            ..Default::default()
        };
        FakePlatform {
            state: Mutex::new(state),
        }
    }

    fn with(self, f: impl FnOnce(&mut State)) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            f(&mut *state);
        }
        self
    }

    /// An account that exists but has no relationship with the org yet.
    pub fn user(self, login: &str) -> Self {
        self.with(|s| {
            s.users.insert(login.to_string());
        })
    }

    pub fn member(self, login: &str) -> Self {
        self.with(|s| {
            s.users.insert(login.to_string());
            s.members.insert(login.to_string());
        })
    }

    pub fn outside(self, login: &str) -> Self {
        self.with(|s| {
            s.users.insert(login.to_string());
            s.outside.insert(login.to_string());
        })
    }

    pub fn invited(self, login: &str) -> Self {
        self.with(|s| {
            s.users.insert(login.to_string());
            s.invitations
                .get_or_insert_with(BTreeSet::new)
                .insert(login.to_string());
        })
    }

    /// Makes the invitation listing answer "not found".
    pub fn without_invitation_listing(self) -> Self {
        self.with(|s| s.invitations = None)
    }

    pub fn team(self, slug: &str, members: &[(&str, TeamRole)]) -> Self {
        self.with(|s| {
            s.next_team_id += 1;
            let team = FakeTeam {
                info: TeamInfo {
                    id: s.next_team_id,
                    slug: slug.to_string(),
                    name: slug.to_uppercase(),
                    description: None,
                    html_url: Some(format!("https://github.com/orgs/{}/teams/{slug}", s.org.login)),
                    parent: None,
                },
                ..Default::default()
            };
            s.teams.insert(slug.to_string(), team);
            for (login, role) in members {
                s.users.insert(login.to_string());
                s.teams
                    .get_mut(slug)
                    .unwrap()
                    .members
                    .insert(login.to_string(), *role);
            }
        })
    }

    pub fn team_description(self, slug: &str, description: &str) -> Self {
        self.with(|s| {
            s.teams.get_mut(slug).unwrap().info.description = Some(description.to_string());
        })
    }

    pub fn team_parent(self, slug: &str, parent_id: u64, parent_name: &str) -> Self {
        self.with(|s| {
            s.teams.get_mut(slug).unwrap().info.parent = Some(ParentTeam {
                id: parent_id,
                name: parent_name.to_string(),
            });
        })
    }

    pub fn also_listed(self, slug: &str, login: &str, role: TeamRole) -> Self {
        self.with(|s| {
            s.users.insert(login.to_string());
            s.teams
                .get_mut(slug)
                .unwrap()
                .extra_listing
                .push((login.to_string(), role));
        })
    }

    pub fn hidden_member(self, slug: &str, login: &str, role: TeamRole) -> Self {
        self.with(|s| {
            s.users.insert(login.to_string());
            s.teams
                .get_mut(slug)
                .unwrap()
                .hidden
                .insert(login.to_string(), role);
        })
    }

    pub fn repo(self, repo: FakeRepo) -> Self {
        self.with(|s| {
            s.repos.insert(repo.info.name.clone(), repo);
        })
    }

    /// Every mutation targeting `login` fails with a generic platform error.
    pub fn failing(self, login: &str) -> Self {
        self.with(|s| {
            s.failing.insert(login.to_string());
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn members(&self) -> BTreeSet<String> {
        self.state.lock().unwrap().members.clone()
    }

    pub fn outside_collaborators(&self) -> BTreeSet<String> {
        self.state.lock().unwrap().outside.clone()
    }

    pub fn team_members(&self, slug: &str) -> BTreeMap<String, TeamRole> {
        self.state.lock().unwrap().teams[slug].members.clone()
    }

    pub fn team_info(&self, slug: &str) -> TeamInfo {
        self.state.lock().unwrap().teams[slug].info.clone()
    }
}

fn not_found(what: &str) -> Error {
    Error::NotFound(format!("{what} Not Found"))
}

impl State {
    /// Records `call` unless `login` is set up to fail.
    fn mutate(&mut self, login: &str, call: Call) -> Result<()> {
        if self.failing.contains(login) {
            return Err(Error::Platform(format!("refusing to touch {login} (status 422)")));
        }
        self.calls.push(call);
        Ok(())
    }

    fn team(&mut self, slug: &str) -> Result<&mut FakeTeam> {
        self.teams
            .get_mut(slug)
            .ok_or_else(|| not_found(&format!("team {slug}")))
    }

    fn repo(&self, repo: &str) -> Result<&FakeRepo> {
        self.repos
            .get(repo)
            .ok_or_else(|| not_found(&format!("repository {repo}")))
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn get_org(&self, org: &str) -> Result<OrgInfo> {
        let s = self.state.lock().unwrap();
        if s.org.login != org {
            return Err(not_found(&format!("org {org}")));
        }
        Ok(s.org.clone())
    }

    async fn list_org_members(&self, _org: &str) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().members.iter().cloned().collect())
    }

    async fn list_outside_collaborators(&self, _org: &str) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().outside.iter().cloned().collect())
    }

    async fn list_pending_invitations(&self, _org: &str) -> Result<Vec<String>> {
        match &self.state.lock().unwrap().invitations {
            Some(invitations) => Ok(invitations.iter().cloned().collect()),
            None => Err(not_found("invitations")),
        }
    }

    async fn get_user(&self, login: &str) -> Result<String> {
        let s = self.state.lock().unwrap();
        match s.users.contains(login) {
            true => Ok(login.to_string()),
            false => Err(not_found(&format!("user {login}"))),
        }
    }

    async fn invite_org_member(&self, _org: &str, login: &str) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        s.mutate(login, Call::InviteOrgMember(login.to_string()))?;
        s.invitations
            .get_or_insert_with(BTreeSet::new)
            .insert(login.to_string());
        Ok(())
    }

    async fn convert_to_outside_collaborator(&self, _org: &str, login: &str) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        s.mutate(login, Call::ConvertToOutsideCollaborator(login.to_string()))?;
        s.members.remove(login);
        s.outside.insert(login.to_string());
        Ok(())
    }

    async fn remove_org_member(&self, _org: &str, login: &str) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        s.mutate(login, Call::RemoveOrgMember(login.to_string()))?;
        s.members.remove(login);
        for team in s.teams.values_mut() {
            team.members.remove(login);
        }
        Ok(())
    }

    async fn remove_outside_collaborator(&self, _org: &str, login: &str) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        s.mutate(login, Call::RemoveOutsideCollaborator(login.to_string()))?;
        s.outside.remove(login);
        Ok(())
    }

    async fn list_teams(&self, _org: &str) -> Result<Vec<TeamInfo>> {
        let s = self.state.lock().unwrap();
        Ok(s.teams.values().map(|team| team.info.clone()).collect())
    }

    async fn get_team(&self, _org: &str, slug: &str) -> Result<TeamInfo> {
        let mut s = self.state.lock().unwrap();
        Ok(s.team(slug)?.info.clone())
    }

    async fn create_team(&self, _org: &str, team: &NewTeam) -> Result<TeamInfo> {
        let mut s = self.state.lock().unwrap();
        let slug = team.name.to_lowercase().replace(' ', "-");
        s.mutate(&team.name, Call::CreateTeam(slug.clone()))?;
        s.next_team_id += 1;
        let info = TeamInfo {
            id: s.next_team_id,
            slug: slug.clone(),
            name: team.name.clone(),
            description: team.description.clone(),
            html_url: None,
            parent: None,
        };
        s.teams.insert(
            slug,
            FakeTeam {
                info: info.clone(),
                ..Default::default()
            },
        );
        Ok(info)
    }

    async fn list_team_members(
        &self,
        _org: &str,
        slug: &str,
        role: TeamRole,
    ) -> Result<Vec<String>> {
        let mut s = self.state.lock().unwrap();
        let team = s.team(slug)?;
        Ok(team
            .members
            .iter()
            .map(|(login, r)| (login.clone(), *r))
            .chain(team.extra_listing.iter().cloned())
            .filter(|(_, r)| *r == role)
            .map(|(login, _)| login)
            .collect())
    }

    async fn get_team_membership(
        &self,
        _org: &str,
        slug: &str,
        login: &str,
    ) -> Result<Option<TeamRole>> {
        let mut s = self.state.lock().unwrap();
        let team = s.team(slug)?;
        Ok(team
            .members
            .get(login)
            .or_else(|| team.hidden.get(login))
            .copied())
    }

    async fn set_team_membership(
        &self,
        _org: &str,
        slug: &str,
        login: &str,
        role: TeamRole,
    ) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        s.team(slug)?;
        s.mutate(
            login,
            Call::SetTeamMembership(slug.to_string(), login.to_string(), role),
        )?;
        s.team(slug)?.members.insert(login.to_string(), role);
        Ok(())
    }

    async fn remove_team_membership(&self, _org: &str, slug: &str, login: &str) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        s.team(slug)?;
        s.mutate(
            login,
            Call::RemoveTeamMembership(slug.to_string(), login.to_string()),
        )?;
        s.team(slug)?.members.remove(login);
        Ok(())
    }

    async fn edit_team(
        &self,
        _org: &str,
        slug: &str,
        name: &str,
        description: &str,
    ) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        s.team(slug)?;
        s.mutate(
            slug,
            Call::EditTeam(slug.to_string(), name.to_string(), description.to_string()),
        )?;
        let team = s.team(slug)?;
        team.info.name = name.to_string();
        team.info.description = Some(description.to_string());
        Ok(())
    }

    async fn list_repos(&self, _org: &str) -> Result<Vec<RepoInfo>> {
        let s = self.state.lock().unwrap();
        Ok(s.repos.values().map(|repo| repo.info.clone()).collect())
    }

    async fn get_repo(&self, _org: &str, repo: &str) -> Result<RepoInfo> {
        Ok(self.state.lock().unwrap().repo(repo)?.info.clone())
    }

    async fn list_collaborators(
        &self,
        _org: &str,
        repo: &str,
        affiliation: Affiliation,
    ) -> Result<Vec<(String, Capabilities)>> {
        let s = self.state.lock().unwrap();
        let repo = s.repo(repo)?;
        Ok(match affiliation {
            Affiliation::Direct => repo.direct.clone(),
            Affiliation::Outside => repo.outside.clone(),
        })
    }

    async fn list_repo_teams(&self, _org: &str, repo: &str) -> Result<Vec<(String, Capabilities)>> {
        Ok(self.state.lock().unwrap().repo(repo)?.teams.clone())
    }

    async fn list_branches(&self, _org: &str, repo: &str) -> Result<Vec<String>> {
        let s = self.state.lock().unwrap();
        Ok(s.repo(repo)?.branches.keys().cloned().collect())
    }

    async fn list_commit_authors(
        &self,
        _org: &str,
        repo: &str,
        branch: &str,
        _since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Option<String>>> {
        let s = self.state.lock().unwrap();
        let repo = s.repo(repo)?;
        if repo.broken_branches.contains(branch) {
            return Err(Error::Platform("API rate limit exceeded (status 403)".to_string()));
        }
        repo.branches
            .get(branch)
            .cloned()
            .ok_or_else(|| not_found(&format!("branch {branch}")))
    }

    async fn list_contributors(&self, _org: &str, repo: &str) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().repo(repo)?.contributors.clone())
    }
}
