use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The platform does not know the requested login, team, repository or organization.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other platform failure: rate limits, permission problems of the calling token, etc.
    #[error("platform error: {0}")]
    Platform(String),

    #[error("invalid document: {0}")]
    Document(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// GitHub answers every 404 with the message `Not Found`; octocrab keeps
    /// the body but not the status.
    fn from_github(source: &octocrab::GitHubError) -> Self {
        if source.message == "Not Found" {
            Error::NotFound(source.message.clone())
        } else {
            Error::Platform(source.message.clone())
        }
    }
}

impl From<octocrab::Error> for Error {
    fn from(error: octocrab::Error) -> Self {
        match &error {
            octocrab::Error::GitHub { source, .. } => Error::from_github(source),
            _ => Error::Platform(error.to_string()),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        let location = match error.location() {
            Some(loc) => format!(" at line {}, column {}", loc.line(), loc.column()),
            None => String::new(),
        };
        Error::Document(format!("invalid YAML{location}: {error}"))
    }
}
