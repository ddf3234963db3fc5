//! Authentication for GitLab
//!
//! Supports environment variables and the config file.

mod gitlab;

pub use gitlab::{GITLAB_TOKEN_ENV, GitLabAuthConfig, get_gitlab_auth, test_gitlab_auth};

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from environment variable
    EnvVar,
    /// Token from the config file
    ConfigFile,
}
