//! Readiness classification - an ordered predicate chain per MR
//!
//! The order of the checks is part of the contract: rebase need is only
//! computed for MRs that are ready, approved and not failed, and any
//! missing information classifies the MR as `NotReady`.

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{MergeRequestDetails, MergerSet, Project};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Outcome of readiness evaluation for one MR in one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Draft, work in progress, or information needed to decide is unknown
    NotReady,
    /// No approval from an account in the target branch's merger set
    Unapproved,
    /// Head pipeline failed or was canceled
    PipelineFailed,
    /// Target branch advanced past the MR's diff base
    NeedsRebase,
    /// Head pipeline still in flight
    PipelineRunning,
    /// All preconditions met
    MergeableNow,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotReady => write!(f, "not ready"),
            Self::Unapproved => write!(f, "unapproved"),
            Self::PipelineFailed => write!(f, "pipeline failed"),
            Self::NeedsRebase => write!(f, "needs rebase"),
            Self::PipelineRunning => write!(f, "pipeline running"),
            Self::MergeableNow => write!(f, "mergeable"),
        }
    }
}

/// Whether any approval comes from a merger
fn is_approved_by_merger(details: &MergeRequestDetails, mergers: &MergerSet) -> bool {
    details.approved_by.iter().any(|id| mergers.contains(*id))
}

/// Run the first three checks (PURE)
///
/// Returns `Some` when the MR is settled without looking at the target
/// branch, `None` when the target head is needed to continue.
pub fn precheck(details: &MergeRequestDetails, mergers: &MergerSet) -> Option<Classification> {
    if details.is_draft || details.work_in_progress {
        return Some(Classification::NotReady);
    }
    if !is_approved_by_merger(details, mergers) {
        return Some(Classification::Unapproved);
    }
    if details.head_pipeline.as_ref().is_some_and(|p| p.is_failure()) {
        return Some(Classification::PipelineFailed);
    }
    None
}

/// The MR's diff base, which GitLab omits until the diff is computed
pub fn diff_base(details: &MergeRequestDetails) -> Result<&str> {
    details.base_sha.as_deref().ok_or_else(|| {
        Error::DataInconsistency(format!("MR !{} has no diff_refs.base_sha", details.iid))
    })
}

/// Classify an MR against its merger set and the current target head (PURE)
pub fn classify(
    details: &MergeRequestDetails,
    mergers: &MergerSet,
    target_head: &str,
) -> Classification {
    if let Some(settled) = precheck(details, mergers) {
        return settled;
    }

    // Without a diff base the rebase need is unknown
    let Ok(base_sha) = diff_base(details) else {
        return Classification::NotReady;
    };
    if base_sha != target_head {
        return Classification::NeedsRebase;
    }

    // A missing head pipeline counts as in flight
    match &details.head_pipeline {
        Some(status) if status.is_success() => Classification::MergeableNow,
        _ => Classification::PipelineRunning,
    }
}

/// Target branch heads observed during one cycle
///
/// Each branch is fetched at most once; a failed fetch is remembered as
/// unknown for the rest of the cycle. Never reuse across cycles.
#[derive(Debug, Default)]
pub struct TargetHeads {
    heads: HashMap<String, Option<String>>,
}

impl TargetHeads {
    /// Create an empty cache for a new cycle
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the head of `branch`, fetching it on first use
    pub async fn get(
        &mut self,
        platform: &dyn PlatformService,
        project: &Project,
        branch: &str,
    ) -> Option<&str> {
        if !self.heads.contains_key(branch) {
            let head = match platform.get_branch_head(project.id, branch).await {
                Ok(sha) => Some(sha),
                Err(e) => {
                    warn!(
                        project = %project.path,
                        branch,
                        error = %e,
                        "failed to get target branch head"
                    );
                    None
                }
            };
            self.heads.insert(branch.to_string(), head);
        }
        self.heads.get(branch).and_then(Option::as_deref)
    }
}

/// Classify an MR, fetching the target head only when the chain needs it
pub async fn classify_merge_request(
    platform: &dyn PlatformService,
    project: &Project,
    details: &MergeRequestDetails,
    mergers: &MergerSet,
    heads: &mut TargetHeads,
) -> Classification {
    let classification = match precheck(details, mergers) {
        Some(settled) => settled,
        None => match diff_base(details) {
            Err(e) => {
                warn!(
                    project = %project.path,
                    mr_iid = details.iid,
                    error = %e,
                    "cannot tell whether MR needs a rebase"
                );
                Classification::NotReady
            }
            Ok(_) => match heads.get(platform, project, &details.target_branch).await {
                Some(head) => classify(details, mergers, head),
                None => Classification::NotReady,
            },
        },
    };

    debug!(
        project = %project.path,
        mr_iid = details.iid,
        %classification,
        "classified MR"
    );
    classification
}
