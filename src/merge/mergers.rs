//! Merger set resolution - whose approval counts for a target branch

use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::{AccessGrant, BranchProtection, MergerSet, Project, ProjectRoles, RoleClass};
use tracing::{debug, warn};

/// Compute the merger set for a branch from its protection rule (PURE)
///
/// Maintainers are always included. `None` means the branch is unprotected,
/// which lets every developer approve as well.
pub fn merger_set_for_rule(roles: &ProjectRoles, rule: Option<&BranchProtection>) -> MergerSet {
    let mut mergers: MergerSet = roles.maintainers.keys().copied().collect();

    let Some(rule) = rule else {
        mergers.extend(roles.developers.keys().copied());
        return mergers;
    };

    // Push access also gates integration into the branch
    for grant in rule.merge_access.iter().chain(&rule.push_access) {
        match grant {
            AccessGrant::User(user_id) => {
                mergers.insert(*user_id);
            }
            AccessGrant::Role(RoleClass::DevelopersAndMaintainers) => {
                mergers.extend(roles.developers.keys().copied());
            }
            AccessGrant::Role(RoleClass::Maintainers | RoleClass::NoOne) => {}
            AccessGrant::Unrecognized(description) => {
                warn!(
                    branch = %rule.branch,
                    grant = %description,
                    "ignoring unrecognized protection grant"
                );
            }
        }
    }

    mergers
}

/// Resolve the merger set for one target branch
///
/// Errors other than "branch not protected" are returned as-is; the caller
/// must hold back every MR targeting the branch for this cycle.
pub async fn resolve_mergers(
    platform: &dyn PlatformService,
    project: &Project,
    roles: &ProjectRoles,
    branch: &str,
) -> Result<MergerSet> {
    let rule = platform.get_branch_protection(project.id, branch).await?;
    let mergers = merger_set_for_rule(roles, rule.as_ref());
    debug!(
        project = %project.path,
        branch,
        protected = rule.is_some(),
        mergers = mergers.len(),
        "resolved merger set"
    );
    Ok(mergers)
}
