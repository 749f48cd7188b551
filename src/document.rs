//! Declarative YAML documents.
//!
//! A document is a mapping from entity key (repository name, team slug or
//! organization login) to that entity's canonical form, tagged with `type`.
//! Several `---` separated documents in one file are read as one, which is
//! what repeated `discover --file` runs produce.

use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};
use crate::model::{Entity, Kind, OrganizationMembership, RepositoryAccess, TeamMembership};

/// Marker written before a freshly rendered batch of entities.
pub const DOCUMENT_START: &str = "---\n";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: Vec<Entity>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!(
                "input document not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut document = Document::new();
        for part in serde_yaml::Deserializer::from_str(text) {
            let value = Value::deserialize(part)?;
            let mapping = match value {
                Value::Null => continue,
                Value::Mapping(mapping) => mapping,
                _ => {
                    return Err(Error::Document(
                        "top level must be a mapping of entity keys".to_string(),
                    ))
                }
            };
            for (key, body) in mapping {
                let key = match key {
                    Value::String(key) => key,
                    Value::Number(n) => n.to_string(),
                    other => {
                        return Err(Error::Document(format!(
                            "entity key must be a string, got {other:?}"
                        )))
                    }
                };
                document.push(parse_entity(key, body)?);
            }
        }
        Ok(document)
    }

    /// Adds an entity. A key seen before is replaced in place so output order stays stable.
    pub fn push(&mut self, entity: Entity) {
        match self.entries.iter_mut().find(|e| e.key() == entity.key()) {
            Some(existing) => {
                tracing::warn!(key = entity.key(), "duplicate document key, later entry wins");
                *existing = entity;
            }
            None => self.entries.push(entity),
        }
    }

    pub fn entries(&self) -> &[Entity] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&Entity> {
        self.entries.iter().find(|entity| entity.key() == key)
    }

    pub fn team(&self, slug: &str) -> Result<&TeamMembership> {
        match self.get(slug) {
            Some(Entity::Team(team)) => Ok(team),
            Some(other) => Err(Error::Document(format!(
                "`{slug}` is a {} entry, not a team",
                other.kind().as_str()
            ))),
            None => Err(Error::Document(format!(
                "team slug `{slug}` not found in document"
            ))),
        }
    }

    pub fn org(&self, login: &str) -> Result<&OrganizationMembership> {
        match self.get(login) {
            Some(Entity::Org(org)) => Ok(org),
            Some(other) => Err(Error::Document(format!(
                "`{login}` is a {} entry, not an org",
                other.kind().as_str()
            ))),
            None => Err(Error::Document(format!(
                "organization `{login}` not found in document"
            ))),
        }
    }

    pub fn teams(&self) -> impl Iterator<Item = &TeamMembership> {
        self.entries.iter().filter_map(|entity| match entity {
            Entity::Team(team) => Some(team),
            _ => None,
        })
    }

    pub fn render(&self) -> Result<String> {
        let mut root = Mapping::new();
        for entity in &self.entries {
            root.insert(entity.key().into(), entity.canonical_form()?);
        }
        Ok(indent_sequences(&serde_yaml::to_string(&Value::Mapping(root))?))
    }
}

/// Renders one entity as a single-key mapping.
pub fn render_entity(entity: &Entity) -> Result<String> {
    let mut document = Document::new();
    document.push(entity.clone());
    document.render()
}

fn parse_entity(key: String, body: Value) -> Result<Entity> {
    let tag = body
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Document(format!("entry `{key}` has no `type` field")))?;
    let kind = Kind::parse(tag)
        .ok_or_else(|| Error::Document(format!("entry `{key}` has unknown type `{tag}`")))?;

    let entity = match kind {
        Kind::Repo => {
            let mut repo: RepositoryAccess = serde_yaml::from_value(body)?;
            repo.name = key;
            Entity::Repo(repo)
        }
        Kind::Team => {
            let mut team: TeamMembership = serde_yaml::from_value(body)?;
            team.slug = key;
            Entity::Team(team)
        }
        Kind::Org => {
            let mut org: OrganizationMembership = serde_yaml::from_value(body)?;
            org.login = key;
            Entity::Org(org)
        }
    };
    Ok(entity)
}

/// Offsets block sequence items under their parent key instead of leaving
/// them flush with it, which is what yamllint's default `indentation` rule
/// expects.
fn indent_sequences(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    // Indent of a `key:` line whose value starts on the next line.
    let mut open_key: Option<usize> = None;
    // Indent of the sequence currently being shifted.
    let mut shifted: Option<usize> = None;
    // Indent of the line that opened a block scalar still in progress.
    let mut block: Option<usize> = None;

    for line in text.lines() {
        let indent = line.len() - line.trim_start_matches(' ').len();
        let body = &line[indent..];

        if let Some(opener) = block {
            if body.is_empty() || indent > opener {
                // Scalar content only moves along with an enclosing shifted sequence.
                if !body.is_empty() && shifted.is_some_and(|seq| indent > seq) {
                    out.push_str("  ");
                }
                out.push_str(line);
                out.push('\n');
                continue;
            }
            block = None;
        }

        let is_item = body == "-" || body.starts_with("- ");

        let shift = match shifted {
            Some(seq) if is_item && indent == seq => true,
            Some(seq) if !body.is_empty() && indent > seq => true,
            _ => is_item && open_key == Some(indent),
        };
        shifted = match (shift, is_item) {
            (true, true) => Some(indent),
            (true, false) => shifted,
            (false, _) => None,
        };
        open_key = if !is_item && body.ends_with(':') {
            Some(indent)
        } else {
            None
        };
        if opens_block_scalar(body) {
            block = Some(indent);
        }

        if shift {
            out.push_str("  ");
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// `key: |-`, `- >` and the like: the lines that follow are scalar text.
fn opens_block_scalar(body: &str) -> bool {
    let Some((head, indicator)) = body.rsplit_once(' ') else {
        return false;
    };
    let mut chars = indicator.chars();
    (head.ends_with(':') || head == "-")
        && matches!(chars.next(), Some('|' | '>'))
        && chars.all(|c| matches!(c, '+' | '-' | '0'..='9'))
}
