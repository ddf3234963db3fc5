//! Shared command context for CLI commands
//!
//! Extracts the setup shared by run, once and projects.

use mr_autopilot::auth::{get_gitlab_auth, test_gitlab_auth};
use mr_autopilot::config::{Config, default_config_path, load_config};
use mr_autopilot::error::Result;
use mr_autopilot::merge::EvaluationOptions;
use mr_autopilot::platform::{GitLabService, PlatformService};
use mr_autopilot::scheduler::{Scheduler, SchedulerConfig, discover_projects};
use mr_autopilot::types::User;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Shared context for CLI commands that talk to GitLab
///
/// This struct encapsulates:
/// - Loading the config file
/// - Resolving and verifying credentials
/// - Creating the platform service
pub struct CommandContext {
    /// Loaded configuration
    pub config: Config,
    /// Platform service
    pub platform: Arc<dyn PlatformService>,
    /// The account the bot acts as
    pub user: User,
}

impl CommandContext {
    /// Load configuration from `config_path` (or the default location)
    pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
        let path = config_path.map_or_else(default_config_path, Path::to_path_buf);
        load_config(&path)
    }

    /// Create a context from loaded configuration
    pub async fn new(config: Config) -> Result<Self> {
        let auth = get_gitlab_auth(&config.gitlab)?;
        let platform: Arc<dyn PlatformService> =
            Arc::new(GitLabService::new(auth.token, &auth.url)?);
        let user = test_gitlab_auth(platform.as_ref()).await?;
        info!(user = %user.username, url = %auth.url, source = ?auth.source, "authenticated");

        Ok(Self {
            config,
            platform,
            user,
        })
    }

    /// Discover projects and build a scheduler over them
    ///
    /// Fails when a configured project is not maintained by the bot account.
    pub async fn scheduler(&self, dry_run: bool) -> Result<Scheduler> {
        let projects =
            discover_projects(self.platform.as_ref(), &self.config.gitlab.projects).await?;
        let config = SchedulerConfig {
            poll_interval: self.config.poll_interval(),
            max_concurrent_projects: self.config.max_concurrent_projects,
            evaluation: EvaluationOptions {
                dry_run,
                merge_method: self.config.merge_method,
            },
        };
        Ok(Scheduler::new(Arc::clone(&self.platform), projects, config))
    }
}
