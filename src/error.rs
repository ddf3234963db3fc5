//! Error types for mr-autopilot

use thiserror::Error;

/// Errors raised while talking to the platform or evaluating projects
#[derive(Debug, Error)]
pub enum Error {
    /// GitLab API returned an error response
    #[error("GitLab API error: {0}")]
    GitLabApi(String),

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic platform failure (used by non-GitLab implementations)
    #[error("platform error: {0}")]
    Platform(String),

    /// Acting account lacks the role required on a project
    #[error("not authorized: {0}")]
    Authorization(String),

    /// Platform data is present but cannot be interpreted
    #[error("inconsistent platform data: {0}")]
    DataInconsistency(String),

    /// Configuration could not be loaded or is invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// No usable credentials
    #[error("authentication error: {0}")]
    Auth(String),
}

impl Error {
    /// Whether this error came from reading or writing platform data.
    ///
    /// Transport errors on derived data degrade evaluation to a conservative
    /// outcome instead of aborting the project.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::GitLabApi(_) | Self::Http(_) | Self::Platform(_))
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
