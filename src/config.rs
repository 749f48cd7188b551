//! Settings shared by the command line tools.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub const TOKEN_VAR: &str = "GITHUB_PRIVATE_TOKEN";
pub const ORG_VAR: &str = "GITHUB_ORG_NAME";

/// Organization selection shared by every command.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PlatformArgs {
    /// Name of the GitHub organization. Can be read from GITHUB_ORG_NAME
    #[arg(short, long, env = ORG_VAR)]
    pub org: Option<String>,
}

impl PlatformArgs {
    /// Reads the token from the environment. Nothing is sent anywhere before this succeeds.
    pub fn resolve(&self) -> Result<Settings> {
        Settings::new(self.org.clone(), std::env::var(TOKEN_VAR).ok())
    }
}

#[derive(Clone)]
pub struct Settings {
    pub org: String,
    pub token: String,
}

impl Settings {
    pub fn new(org: Option<String>, token: Option<String>) -> Result<Self> {
        let token = token.filter(|token| !token.trim().is_empty()).ok_or_else(|| {
            Error::Config(format!(
                "{TOKEN_VAR} empty or not defined. Set as ENV var {TOKEN_VAR}"
            ))
        })?;
        let org = org.filter(|org| !org.trim().is_empty()).ok_or_else(|| {
            Error::Config(format!(
                "GitHub Organization name not set. Set as ENV var {ORG_VAR} or use arg --org <GH-ORG-NAME>"
            ))
        })?;
        Ok(Settings { org, token })
    }
}

// Keeps the token out of debug logs.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("org", &self.org)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// `all`, or a single repository name / team slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Named(String),
}

impl FromStr for Selection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" => Err(Error::Config("empty selection".to_string())),
            "all" => Ok(Selection::All),
            name => Ok(Selection::Named(name.to_string())),
        }
    }
}

/// Installs the stderr subscriber. `RUST_LOG` overrides the default level.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gh_access=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_is_reported_first() {
        let err = Settings::new(None, None).unwrap_err();
        assert!(err.to_string().contains(TOKEN_VAR), "{err}");
    }

    #[test]
    fn missing_org_is_reported() {
        let err = Settings::new(Some("  ".to_string()), Some("t0ken".to_string())).unwrap_err();
        assert!(err.to_string().contains(ORG_VAR), "{err}");
    }

    #[test]
    fn debug_output_hides_token() {
        let settings = Settings::new(Some("acme".to_string()), Some("s3cret".to_string())).unwrap();
        let debug = format!("{settings:?}");
        assert!(debug.contains("acme"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn selection_parses_all() {
        assert_eq!("all".parse::<Selection>().unwrap(), Selection::All);
        assert_eq!(
            "infra".parse::<Selection>().unwrap(),
            Selection::Named("infra".to_string())
        );
        assert!("".parse::<Selection>().is_err());
    }
}
