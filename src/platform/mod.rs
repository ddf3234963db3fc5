//! Platform services for GitLab
//!
//! Provides the read and write operations the merge engine needs, behind a
//! trait so evaluation can run against a mock in tests.

mod gitlab;

pub use gitlab::GitLabService;

use crate::error::Result;
use crate::types::{
    AcceptOptions, BranchProtection, Member, MergeRequest, MergeRequestDetails, MergeResult,
    Project, User,
};
use async_trait::async_trait;

/// Platform service trait for MR operations
///
/// Every list operation returns the complete result set; implementations
/// must page to completion and fail rather than return a truncated list.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// The account the service authenticates as
    async fn current_user(&self) -> Result<User>;

    /// Look up a project by ID
    async fn get_project(&self, project_id: u64) -> Result<Project>;

    /// List non-archived projects the acting account is a member of
    async fn list_member_projects(&self) -> Result<Vec<Project>>;

    /// List all project members, including inherited ones
    async fn list_members(&self, project_id: u64) -> Result<Vec<Member>>;

    /// Get the protection rule for a branch
    ///
    /// Returns `Ok(None)` when the branch is not protected. Any other
    /// failure is an error, never an implicit "unprotected".
    async fn get_branch_protection(
        &self,
        project_id: u64,
        branch: &str,
    ) -> Result<Option<BranchProtection>>;

    /// List open, non-draft MRs ordered by creation time ascending
    async fn list_open_merge_requests(&self, project_id: u64) -> Result<Vec<MergeRequest>>;

    /// Get full MR details including approval state
    async fn get_merge_request(&self, project_id: u64, iid: u64) -> Result<MergeRequestDetails>;

    /// Get the commit SHA at the head of a branch
    async fn get_branch_head(&self, project_id: u64, branch: &str) -> Result<String>;

    // =========================================================================
    // Write operations
    // =========================================================================

    /// Accept (merge) an MR, or arm merge-when-pipeline-succeeds
    async fn accept_merge_request(
        &self,
        project_id: u64,
        iid: u64,
        options: AcceptOptions,
    ) -> Result<MergeResult>;

    /// Rebase an MR's source branch onto its target branch
    async fn rebase_merge_request(&self, project_id: u64, iid: u64) -> Result<()>;
}
