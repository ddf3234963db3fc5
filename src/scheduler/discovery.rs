//! Startup project discovery and authorization
//!
//! Explicitly configured projects must all be maintained by the acting
//! account before any cycle runs. Without configuration, every project the
//! account maintains is picked up.

use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use crate::merge::resolve_project_roles;
use crate::platform::PlatformService;
use crate::types::Project;
use tracing::{debug, info, warn};

/// Resolve the list of projects to evaluate
///
/// Fails with `Error::Authorization` when the acting account does not
/// maintain a configured project.
pub async fn discover_projects(
    platform: &dyn PlatformService,
    configured: &[ProjectConfig],
) -> Result<Vec<Project>> {
    let user = platform.current_user().await?;
    info!(user = %user.username, "discovering projects");

    if configured.is_empty() {
        return list_maintained_projects(platform, user.id).await;
    }

    let mut projects = Vec::with_capacity(configured.len());
    for entry in configured {
        let project = platform.get_project(entry.id).await?;
        if let Some(path) = entry.path.as_deref()
            && path != project.path
        {
            warn!(
                project_id = project.id,
                configured = path,
                actual = %project.path,
                "configured path does not match project"
            );
        }

        let roles = resolve_project_roles(platform, &project).await?;
        if !roles.is_maintainer(user.id) {
            return Err(Error::Authorization(format!(
                "{} does not maintain {project}",
                user.username
            )));
        }
        projects.push(project);
    }

    info!(count = projects.len(), "using configured projects");
    Ok(projects)
}

/// Every member project the account maintains
///
/// Projects whose members cannot be listed are left out with a warning.
async fn list_maintained_projects(
    platform: &dyn PlatformService,
    user_id: u64,
) -> Result<Vec<Project>> {
    let candidates = platform.list_member_projects().await?;
    let mut maintained = Vec::new();

    for project in candidates {
        match resolve_project_roles(platform, &project).await {
            Ok(roles) if roles.is_maintainer(user_id) => maintained.push(project),
            Ok(_) => debug!(project = %project.path, "not a maintainer; skipping"),
            Err(e) => warn!(project = %project.path, error = %e, "failed to check membership"),
        }
    }

    info!(count = maintained.len(), "discovered maintained projects");
    Ok(maintained)
}
