//! Merge planning - pure functions for sequencing a project's MRs
//!
//! This module contains the pure, testable logic for deciding what to do
//! with each classified MR in a cycle. No I/O happens here.
//!
//! Merges and rebases both consume CI runner capacity and a merge moves the
//! target head, so a cycle merges at most one MR and holds back rebases
//! while any pipeline is already occupied.

use crate::merge::readiness::Classification;
use crate::types::MergeRequest;

/// A classified MR, input to planning
#[derive(Debug, Clone)]
pub struct ClassifiedMergeRequest {
    /// The MR as listed this cycle
    pub mr: MergeRequest,
    /// Whether the MR has unresolved conflicts
    pub has_conflicts: bool,
    /// Readiness classification for this cycle
    pub classification: Classification,
}

/// Why an MR gets no action this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Its classification is not actionable
    Classified(Classification),
    /// Needs a rebase but conflicts must be resolved by a human
    HasConflicts,
    /// Needs a rebase but another MR's pipeline may still move the target
    PipelinesOccupied,
    /// Needs a rebase but this cycle's merge will move the target
    TargetWillAdvance,
    /// Not examined because this cycle already merges an older MR
    Deferred,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classified(classification) => write!(f, "{classification}"),
            Self::HasConflicts => write!(f, "needs rebase but has conflicts"),
            Self::PipelinesOccupied => write!(f, "rebase held back while pipelines run"),
            Self::TargetWillAdvance => write!(f, "rebase held back until merge lands"),
            Self::Deferred => write!(f, "deferred to next cycle"),
        }
    }
}

/// A single step in the merge plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeStep {
    /// Merge this MR now
    Merge {
        /// MR number
        iid: u64,
        /// MR title (for display)
        title: String,
    },
    /// Arm merge-when-pipeline-succeeds
    SetAutoMerge {
        /// MR number
        iid: u64,
        /// MR title (for display)
        title: String,
    },
    /// Rebase onto the current target head
    Rebase {
        /// MR number
        iid: u64,
        /// MR title (for display)
        title: String,
    },
    /// Take no action
    Skip {
        /// MR number
        iid: u64,
        /// MR title (for display)
        title: String,
        /// Why nothing happens
        reason: SkipReason,
    },
}

impl MergeStep {
    /// MR number this step applies to
    pub const fn iid(&self) -> u64 {
        match self {
            Self::Merge { iid, .. }
            | Self::SetAutoMerge { iid, .. }
            | Self::Rebase { iid, .. }
            | Self::Skip { iid, .. } => *iid,
        }
    }

    /// Whether the step writes to the platform
    pub const fn is_action(&self) -> bool {
        !matches!(self, Self::Skip { .. })
    }
}

impl std::fmt::Display for MergeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merge { iid, title } => write!(f, "merge !{iid}: {title}"),
            Self::SetAutoMerge { iid, title } => {
                write!(f, "merge !{iid} when pipeline succeeds: {title}")
            }
            Self::Rebase { iid, title } => write!(f, "rebase !{iid}: {title}"),
            Self::Skip { iid, title, reason } => write!(f, "skip !{iid} ({reason}): {title}"),
        }
    }
}

/// Merge plan - the functional core output
///
/// Created by `create_merge_plan()` (pure) and executed by
/// `execute_plan()` (effectful). Steps follow MR creation order.
#[derive(Debug, Clone, Default)]
pub struct MergePlan {
    /// One step per MR, oldest first
    pub steps: Vec<MergeStep>,
    /// Whether some MR's pipeline is occupied this cycle
    pub pipelines_occupied: bool,
}

impl MergePlan {
    /// Check if the plan writes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.steps.iter().any(MergeStep::is_action)
    }

    /// Count direct merges (0 or 1)
    #[must_use]
    pub fn merge_count(&self) -> usize {
        self.count(|s| matches!(s, MergeStep::Merge { .. }))
    }

    /// Count merge-when-pipeline-succeeds arms
    #[must_use]
    pub fn auto_merge_count(&self) -> usize {
        self.count(|s| matches!(s, MergeStep::SetAutoMerge { .. }))
    }

    /// Count rebases
    #[must_use]
    pub fn rebase_count(&self) -> usize {
        self.count(|s| matches!(s, MergeStep::Rebase { .. }))
    }

    /// Step planned for an MR
    pub fn step_for(&self, iid: u64) -> Option<&MergeStep> {
        self.steps.iter().find(|s| s.iid() == iid)
    }

    fn count(&self, pred: impl Fn(&MergeStep) -> bool) -> usize {
        self.steps.iter().filter(|s| pred(s)).count()
    }
}

/// Create a merge plan (PURE - no I/O, easily testable)
///
/// Entries are processed oldest first. The first `MergeableNow` entry is
/// merged and ends the scan; `PipelineRunning` entries before it get
/// merge-when-pipeline-succeeds. Rebases are only planned when nothing is
/// merged and no pipeline is occupied.
#[must_use]
pub fn create_merge_plan(entries: &[ClassifiedMergeRequest]) -> MergePlan {
    let mut ordered: Vec<&ClassifiedMergeRequest> = entries.iter().collect();
    ordered.sort_by_key(|e| (e.mr.created_at, e.mr.iid));

    let merge_at = ordered
        .iter()
        .position(|e| e.classification == Classification::MergeableNow);
    let scanned = merge_at.map_or(ordered.len(), |i| i + 1);
    let pipelines_occupied = ordered[..scanned]
        .iter()
        .any(|e| e.classification == Classification::PipelineRunning);

    let steps = ordered
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let iid = entry.mr.iid;
            let title = entry.mr.title.clone();
            let skip = |reason| MergeStep::Skip {
                iid,
                title: entry.mr.title.clone(),
                reason,
            };

            if index >= scanned {
                return skip(SkipReason::Deferred);
            }

            match entry.classification {
                Classification::MergeableNow => MergeStep::Merge { iid, title },
                Classification::PipelineRunning => MergeStep::SetAutoMerge { iid, title },
                Classification::NeedsRebase if merge_at.is_some() => {
                    skip(SkipReason::TargetWillAdvance)
                }
                Classification::NeedsRebase if pipelines_occupied => {
                    skip(SkipReason::PipelinesOccupied)
                }
                Classification::NeedsRebase if entry.has_conflicts => {
                    skip(SkipReason::HasConflicts)
                }
                Classification::NeedsRebase => MergeStep::Rebase { iid, title },
                other @ (Classification::NotReady
                | Classification::Unapproved
                | Classification::PipelineFailed) => skip(SkipReason::Classified(other)),
            }
        })
        .collect();

    MergePlan {
        steps,
        pipelines_occupied,
    }
}
