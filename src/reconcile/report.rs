use std::fmt;

use serde::Serialize;

use crate::error::Error;
use crate::permission::TeamRole;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Changed,
    Unchanged,
    Warning,
}

impl Outcome {
    pub fn tag(&self) -> &'static str {
        match self {
            Outcome::Changed => "[CHANGED]",
            Outcome::Unchanged => "[UNCHANGED]",
            Outcome::Warning => "[WARNING]",
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Look up the team itself before touching its members.
    ReadTeam,
    CreateTeam,
    EditTeamDescription,
    AddTeamMember { role: TeamRole },
    RemoveTeamMember,
    ReadOrg,
    InviteOrgMember,
    ConvertToOutsideCollaborator,
    RemoveOrgMember,
    RemoveOutsideCollaborator,
}

/// One attempted (or planned) change and how it went.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub action: Action,
    /// Team slug or organization login the change applies to.
    pub entity: String,
    /// Login being changed, or the team slug for team-level actions.
    pub subject: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Change {
    pub fn new(action: Action, entity: &str, subject: &str) -> Self {
        Change {
            action,
            entity: entity.to_string(),
            subject: subject.to_string(),
            outcome: Outcome::Changed,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn unchanged(mut self, detail: impl Into<String>) -> Self {
        self.outcome = Outcome::Unchanged;
        self.detail = Some(detail.into());
        self
    }

    pub fn failed(mut self, error: &Error) -> Self {
        self.outcome = Outcome::Warning;
        self.detail = Some(error.to_string());
        self
    }

    /// A planned change reported without calling the platform.
    pub fn planned(self) -> Self {
        self.with_detail("dry run")
    }

    pub fn settle(self, result: crate::Result<()>) -> Self {
        match result {
            Ok(()) => self,
            Err(err) => self.failed(&err),
        }
    }

    fn done(&self) -> String {
        let (entity, subject) = (&self.entity, &self.subject);
        match self.action {
            Action::ReadTeam => format!("Team: {entity} read"),
            Action::CreateTeam => format!("Created Team: {subject} in Org: {entity}"),
            Action::EditTeamDescription => format!("Description of Team: {subject} updated"),
            Action::AddTeamMember { role } => {
                format!("Login: {subject} added to Team: {entity} with Role: {role}")
            }
            Action::RemoveTeamMember => format!("Login: {subject} removed from Team: {entity}"),
            Action::ReadOrg => format!("Org: {entity} read"),
            Action::InviteOrgMember => format!("Login: {subject} was invited to Org: {entity}"),
            Action::ConvertToOutsideCollaborator => format!(
                "Login: {subject} was converted to outside collaborator for Org: {entity}"
            ),
            Action::RemoveOrgMember => format!("Login: {subject} was removed from Org: {entity}"),
            Action::RemoveOutsideCollaborator => format!(
                "Login: {subject} was removed as outside collaborator from Org: {entity}"
            ),
        }
    }

    fn attempted(&self) -> String {
        let (entity, subject) = (&self.entity, &self.subject);
        match self.action {
            Action::ReadTeam => format!("read Team: {entity}"),
            Action::CreateTeam => format!("create Team: {subject} in Org: {entity}"),
            Action::EditTeamDescription => format!("update description of Team: {subject}"),
            Action::AddTeamMember { role } => {
                format!("add Login: {subject} to Team: {entity} with Role: {role}")
            }
            Action::RemoveTeamMember => format!("remove Login: {subject} from Team: {entity}"),
            Action::ReadOrg => format!("read Org: {entity}"),
            Action::InviteOrgMember => format!("invite Login: {subject} to Org: {entity}"),
            Action::ConvertToOutsideCollaborator => format!(
                "convert Login: {subject} to outside collaborator for Org: {entity}"
            ),
            Action::RemoveOrgMember => format!("remove Login: {subject} from Org: {entity}"),
            Action::RemoveOutsideCollaborator => format!(
                "remove Login: {subject} as outside collaborator from Org: {entity}"
            ),
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.outcome.tag();
        match self.outcome {
            Outcome::Changed => write!(f, "{tag} {}", self.done())?,
            Outcome::Unchanged => write!(f, "{tag} Login: {} in {}", self.subject, self.entity)?,
            Outcome::Warning => write!(f, "{tag} Something prevented: {}", self.attempted())?,
        }
        match &self.detail {
            Some(detail) => write!(f, " ({detail})"),
            None => Ok(()),
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub changed: usize,
    pub unchanged: usize,
    pub warnings: usize,
}

/// Ordered record of everything a reconciliation pass did.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub changes: Vec<Change>,
}

impl Report {
    pub fn push(&mut self, change: Change) {
        match change.outcome {
            Outcome::Changed => tracing::info!("{change}"),
            Outcome::Unchanged => tracing::debug!("{change}"),
            Outcome::Warning => tracing::warn!("{change}"),
        }
        self.changes.push(change);
    }

    pub fn extend(&mut self, other: Report) {
        self.changes.extend(other.changes);
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for change in &self.changes {
            match change.outcome {
                Outcome::Changed => summary.changed += 1,
                Outcome::Unchanged => summary.unchanged += 1,
                Outcome::Warning => summary.warnings += 1,
            }
        }
        summary
    }

    pub fn has_warnings(&self) -> bool {
        self.summary().warnings > 0
    }

    pub fn with_outcome(&self, outcome: Outcome) -> impl Iterator<Item = &Change> {
        self.changes
            .iter()
            .filter(move |change| change.outcome == outcome)
    }
}
