//! Merge execution - effectful operations
//!
//! This module takes a `MergePlan` (created by the pure planning functions)
//! and issues its steps via the platform API. Failed writes are logged and
//! recorded; execution continues with the next step and nothing is retried
//! within the cycle.

use crate::merge::plan::{MergePlan, MergeStep};
use crate::platform::PlatformService;
use crate::types::{AcceptOptions, MergeMethod, MergeResult, Project};
use tracing::{debug, error, info};

/// Result of plan execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// MRs merged immediately
    pub merged: Vec<u64>,
    /// MRs with merge-when-pipeline-succeeds armed
    pub auto_merge_armed: Vec<u64>,
    /// MRs a rebase was requested for
    pub rebased: Vec<u64>,
    /// MRs whose write failed, with the error message
    pub failed: Vec<(u64, String)>,
}

impl ExecutionReport {
    /// Check if every write succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Count of successful writes
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.merged.len() + self.auto_merge_armed.len() + self.rebased.len()
    }

    /// File an accepted MR by what GitLab actually did with it
    fn record_accept(&mut self, project: &Project, iid: u64, result: &MergeResult) {
        if result.merged {
            debug!(project = %project.path, mr_iid = iid, sha = ?result.sha, "merged");
            self.merged.push(iid);
        } else {
            // Queued rather than merged (pipeline pending or merge train)
            info!(project = %project.path, mr_iid = iid, "accepted, waiting to merge");
            self.auto_merge_armed.push(iid);
        }
    }
}

/// Execute the merge plan (EFFECTFUL)
pub async fn execute_plan(
    plan: &MergePlan,
    project: &Project,
    platform: &dyn PlatformService,
    method: MergeMethod,
) -> ExecutionReport {
    let mut report = ExecutionReport::default();
    let squash = method == MergeMethod::Squash;

    for step in &plan.steps {
        let iid = step.iid();
        let outcome = match step {
            MergeStep::Merge { title, .. } => {
                info!(project = %project.path, mr_iid = iid, %title, %method, "merging");
                let options = AcceptOptions {
                    squash,
                    merge_when_pipeline_succeeds: false,
                };
                platform
                    .accept_merge_request(project.id, iid, options)
                    .await
                    .map(|result| report.record_accept(project, iid, &result))
            }
            MergeStep::SetAutoMerge { title, .. } => {
                info!(
                    project = %project.path,
                    mr_iid = iid,
                    %title,
                    "setting merge when pipeline succeeds"
                );
                let options = AcceptOptions {
                    squash,
                    merge_when_pipeline_succeeds: true,
                };
                platform
                    .accept_merge_request(project.id, iid, options)
                    .await
                    .map(|result| report.record_accept(project, iid, &result))
            }
            MergeStep::Rebase { title, .. } => {
                info!(project = %project.path, mr_iid = iid, %title, "rebasing");
                platform
                    .rebase_merge_request(project.id, iid)
                    .await
                    .map(|()| report.rebased.push(iid))
            }
            MergeStep::Skip { reason, .. } => {
                debug!(project = %project.path, mr_iid = iid, %reason, "skipping");
                Ok(())
            }
        };

        if let Err(e) = outcome {
            error!(project = %project.path, mr_iid = iid, error = %e, "action failed");
            report.failed.push((iid, e.to_string()));
        }
    }

    report
}
