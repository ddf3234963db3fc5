//! Role resolution - who maintains and who develops a project

use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::{Member, Project, ProjectRoles};
use tracing::debug;

/// Partition members by access level (PURE)
///
/// Maintainer-or-above members land in `maintainers`, exact developers in
/// `developers`; everyone else is dropped.
pub fn partition_members(members: impl IntoIterator<Item = Member>) -> ProjectRoles {
    let mut roles = ProjectRoles::default();
    for member in members {
        if member.access_level.is_maintainer_or_above() {
            roles.maintainers.insert(member.id, member);
        } else if member.access_level.is_developer() {
            roles.developers.insert(member.id, member);
        }
    }
    roles
}

/// Fetch the complete member list and partition it
///
/// A failed or partial listing is an error for the whole project; it is
/// never read as "no maintainers".
pub async fn resolve_project_roles(
    platform: &dyn PlatformService,
    project: &Project,
) -> Result<ProjectRoles> {
    let members = platform.list_members(project.id).await?;
    let roles = partition_members(members);
    debug!(
        project = %project.path,
        maintainers = roles.maintainers.len(),
        developers = roles.developers.len(),
        "resolved project roles"
    );
    Ok(roles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccessLevel;

    fn member(id: u64, level: u32) -> Member {
        Member {
            id,
            username: format!("user{id}"),
            access_level: AccessLevel::from(level),
        }
    }

    #[test]
    fn test_partition_by_threshold() {
        let roles = partition_members(vec![
            member(1, 50),
            member(2, 40),
            member(3, 30),
            member(4, 20),
            member(5, 10),
            member(6, 0),
        ]);

        assert_eq!(roles.maintainers.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(roles.developers.keys().copied().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_duplicate_member_entries_collapse() {
        // members/all can list an account once per inherited membership
        let roles = partition_members(vec![member(1, 40), member(1, 40)]);
        assert_eq!(roles.maintainers.len(), 1);
    }
}
