//! GitLab token resolution

use super::AuthSource;
use crate::config::GitLabConfig;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::User;
use tracing::debug;

/// Environment variable holding the access token
pub const GITLAB_TOKEN_ENV: &str = "GITLAB_ACCESS_TOKEN";

/// Resolved GitLab credentials
#[derive(Clone)]
pub struct GitLabAuthConfig {
    /// Personal/project access token
    pub token: String,
    /// Instance base URL
    pub url: String,
    /// Where the token came from
    pub source: AuthSource,
}

impl std::fmt::Debug for GitLabAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabAuthConfig")
            .field("token", &"<redacted>")
            .field("url", &self.url)
            .field("source", &self.source)
            .finish()
    }
}

/// Resolve credentials: `GITLAB_ACCESS_TOKEN` first, then the config file
pub fn get_gitlab_auth(config: &GitLabConfig) -> Result<GitLabAuthConfig> {
    let from_env = std::env::var(GITLAB_TOKEN_ENV)
        .ok()
        .filter(|t| !t.trim().is_empty());

    let (token, source) = match from_env {
        Some(token) => (token, AuthSource::EnvVar),
        None => match config.access_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => (token.to_string(), AuthSource::ConfigFile),
            _ => {
                return Err(Error::Auth(format!(
                    "no GitLab token: set {GITLAB_TOKEN_ENV} or gitlab.access_token"
                )));
            }
        },
    };

    debug!(?source, "resolved GitLab token");
    Ok(GitLabAuthConfig {
        token: token.trim().to_string(),
        url: config.url.clone(),
        source,
    })
}

/// Verify the token by fetching the current user
pub async fn test_gitlab_auth(platform: &dyn PlatformService) -> Result<User> {
    platform
        .current_user()
        .await
        .map_err(|e| Error::Auth(format!("GitLab token rejected: {e}")))
}
