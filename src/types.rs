//! Core types for mr-autopilot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A GitLab project the bot evaluates
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Project {
    /// Numeric project ID
    pub id: u64,
    /// Path with namespace (e.g., "group/repo")
    pub path: String,
}

impl std::fmt::Display for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (#{})", self.path, self.id)
    }
}

/// The account the bot acts as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account ID
    pub id: u64,
    /// Login name
    pub username: String,
}

// =============================================================================
// Access roles
// =============================================================================

/// Project access level, ordered from least to most privileged
///
/// Built from GitLab's numeric levels. Values between the well-known
/// thresholds collapse onto the highest role they reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum AccessLevel {
    /// No access
    NoAccess,
    /// Guest
    Guest,
    /// Reporter
    Reporter,
    /// Developer
    Developer,
    /// Maintainer
    Maintainer,
    /// Owner
    Owner,
}

impl AccessLevel {
    const GUEST: u32 = 10;
    const REPORTER: u32 = 20;
    const DEVELOPER: u32 = 30;
    const MAINTAINER: u32 = 40;
    const OWNER: u32 = 50;

    /// Maintainers and owners keep merge rights on every branch
    pub fn is_maintainer_or_above(self) -> bool {
        self >= Self::Maintainer
    }

    /// Exactly developer level
    pub fn is_developer(self) -> bool {
        self == Self::Developer
    }

    /// GitLab's numeric representation
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::NoAccess => 0,
            Self::Guest => Self::GUEST,
            Self::Reporter => Self::REPORTER,
            Self::Developer => Self::DEVELOPER,
            Self::Maintainer => Self::MAINTAINER,
            Self::Owner => Self::OWNER,
        }
    }
}

impl From<u32> for AccessLevel {
    fn from(level: u32) -> Self {
        match level {
            l if l >= Self::OWNER => Self::Owner,
            l if l >= Self::MAINTAINER => Self::Maintainer,
            l if l >= Self::DEVELOPER => Self::Developer,
            l if l >= Self::REPORTER => Self::Reporter,
            l if l >= Self::GUEST => Self::Guest,
            _ => Self::NoAccess,
        }
    }
}

impl From<AccessLevel> for u32 {
    fn from(level: AccessLevel) -> Self {
        level.as_u32()
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAccess => write!(f, "none"),
            Self::Guest => write!(f, "guest"),
            Self::Reporter => write!(f, "reporter"),
            Self::Developer => write!(f, "developer"),
            Self::Maintainer => write!(f, "maintainer"),
            Self::Owner => write!(f, "owner"),
        }
    }
}

/// A project member with its effective access level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Account ID
    pub id: u64,
    /// Login name
    pub username: String,
    /// Effective access level (direct or inherited)
    pub access_level: AccessLevel,
}

/// Project members partitioned by role
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRoles {
    /// Members at maintainer level or above, by account ID
    pub maintainers: BTreeMap<u64, Member>,
    /// Members at exactly developer level, by account ID
    pub developers: BTreeMap<u64, Member>,
}

impl ProjectRoles {
    /// Whether the account maintains the project
    pub fn is_maintainer(&self, user_id: u64) -> bool {
        self.maintainers.contains_key(&user_id)
    }
}

// =============================================================================
// Branch protection
// =============================================================================

/// Named role classes a protection grant can refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleClass {
    /// "Maintainers"
    Maintainers,
    /// "Developers + Maintainers"
    DevelopersAndMaintainers,
    /// "No one"
    NoOne,
}

/// One entry of a protected branch's merge or push access list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessGrant {
    /// A specific account
    User(u64),
    /// A role class
    Role(RoleClass),
    /// Anything else (group grants, admin-only levels, malformed entries)
    Unrecognized(String),
}

/// Protection rule for one branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchProtection {
    /// Protected branch name
    pub branch: String,
    /// Who may merge into the branch
    pub merge_access: Vec<AccessGrant>,
    /// Who may push to the branch
    pub push_access: Vec<AccessGrant>,
}

/// Accounts whose approval is authoritative for one target branch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergerSet(BTreeSet<u64>);

impl MergerSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account
    pub fn insert(&mut self, user_id: u64) -> bool {
        self.0.insert(user_id)
    }

    /// Whether the account may merge
    pub fn contains(&self, user_id: u64) -> bool {
        self.0.contains(&user_id)
    }

    /// Number of accounts
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nobody may merge
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate account IDs in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.iter().copied()
    }
}

impl Extend<u64> for MergerSet {
    fn extend<T: IntoIterator<Item = u64>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl FromIterator<u64> for MergerSet {
    fn from_iter<T: IntoIterator<Item = u64>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// Merge requests
// =============================================================================

/// Head pipeline status of a merge request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum PipelineStatus {
    /// Pipeline is executing
    Running,
    /// Pipeline passed
    Success,
    /// Pipeline failed
    Failed,
    /// Pipeline was canceled
    Canceled,
    /// Pipeline was skipped
    Skipped,
    /// Any other state (created, pending, manual, scheduled, ...)
    Other(String),
}

impl PipelineStatus {
    /// Terminal success-class status
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::Skipped)
    }

    /// Terminal failure-class status
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Canceled)
    }
}

impl From<String> for PipelineStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "running" => Self::Running,
            "success" => Self::Success,
            "failed" => Self::Failed,
            "canceled" | "cancelled" => Self::Canceled,
            "skipped" => Self::Skipped,
            _ => Self::Other(status),
        }
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
            Self::Canceled => write!(f, "canceled"),
            Self::Skipped => write!(f, "skipped"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// An open merge request as returned by the project listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequest {
    /// Project-scoped MR number
    pub iid: u64,
    /// MR title
    pub title: String,
    /// Source branch name
    pub source_branch: String,
    /// Target branch name
    pub target_branch: String,
    /// Whether the MR is a draft
    pub is_draft: bool,
    /// Creation time, used for first-come-first-served ordering
    pub created_at: DateTime<Utc>,
    /// Web URL for the MR
    pub web_url: String,
}

/// Full merge request state needed for readiness classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequestDetails {
    /// Project-scoped MR number
    pub iid: u64,
    /// MR title
    pub title: String,
    /// Source branch name
    pub source_branch: String,
    /// Target branch name
    pub target_branch: String,
    /// Whether the MR is a draft
    pub is_draft: bool,
    /// Legacy work-in-progress flag
    pub work_in_progress: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Status of the head pipeline (`None` when no pipeline exists yet)
    pub head_pipeline: Option<PipelineStatus>,
    /// Target commit the diff was last computed against
    pub base_sha: Option<String>,
    /// Whether the MR has unresolved conflicts
    pub has_conflicts: bool,
    /// Accounts that approved through the approval rules
    pub approved_by: Vec<u64>,
    /// Web URL for the MR
    pub web_url: String,
}

impl From<&MergeRequestDetails> for MergeRequest {
    fn from(details: &MergeRequestDetails) -> Self {
        Self {
            iid: details.iid,
            title: details.title.clone(),
            source_branch: details.source_branch.clone(),
            target_branch: details.target_branch.clone(),
            is_draft: details.is_draft,
            created_at: details.created_at,
            web_url: details.web_url.clone(),
        }
    }
}

// =============================================================================
// Merge actions
// =============================================================================

/// Merge strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeMethod {
    /// Squash all commits into one
    #[default]
    Squash,
    /// Fast-forward (or the project's configured merge method) without squashing
    FastForward,
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Squash => write!(f, "squash"),
            Self::FastForward => write!(f, "fast-forward"),
        }
    }
}

/// Options passed to the accept-merge-request call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptOptions {
    /// Squash commits on merge
    pub squash: bool,
    /// Arm merge-when-pipeline-succeeds instead of merging now
    pub merge_when_pipeline_succeeds: bool,
}

/// Result of an accept call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// Whether the MR is merged now
    pub merged: bool,
    /// Whether merge-when-pipeline-succeeds is armed
    pub auto_merge_armed: bool,
    /// The SHA of the merge commit (if merged)
    pub sha: Option<String>,
}
