//! Project evaluation - one cycle for one project
//!
//! Gather (roles, MRs, merger sets) → classify → plan → execute. Steps run
//! strictly in sequence; each consumes the previous step's output.

use crate::error::Result;
use crate::merge::access::resolve_project_roles;
use crate::merge::execute::{ExecutionReport, execute_plan};
use crate::merge::mergers::resolve_mergers;
use crate::merge::plan::{ClassifiedMergeRequest, MergePlan, MergeStep, create_merge_plan};
use crate::merge::readiness::{Classification, TargetHeads, classify_merge_request};
use crate::platform::PlatformService;
use crate::types::{MergeMethod, MergeRequest, MergerSet, Project};
use std::collections::BTreeMap;
use tracing::{error, info, warn};

/// Options for evaluating a project
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationOptions {
    /// Plan without writing to the platform
    pub dry_run: bool,
    /// Merge strategy for merges and auto-merges
    pub merge_method: MergeMethod,
}

/// Classified MRs of one project in one cycle, with the plan and outcome
#[derive(Debug, Clone)]
pub struct EvaluationBatch {
    /// The evaluated project
    pub project: Project,
    /// Classified MRs, oldest first
    pub entries: Vec<ClassifiedMergeRequest>,
    /// Planned steps
    pub plan: MergePlan,
    /// Execution outcome (`None` on dry runs)
    pub report: Option<ExecutionReport>,
}

impl EvaluationBatch {
    /// Pair each MR with its classification and planned step
    pub fn decisions(&self) -> impl Iterator<Item = (&MergeRequest, Classification, &MergeStep)> {
        self.entries.iter().filter_map(|entry| {
            self.plan
                .step_for(entry.mr.iid)
                .map(|step| (&entry.mr, entry.classification, step))
        })
    }

    /// Classification of an MR in this batch
    pub fn classification_of(&self, iid: u64) -> Option<Classification> {
        self.entries
            .iter()
            .find(|e| e.mr.iid == iid)
            .map(|e| e.classification)
    }
}

/// Classify one listed MR
async fn classify_entry(
    platform: &dyn PlatformService,
    project: &Project,
    mr: MergeRequest,
    mergers: Option<&MergerSet>,
    heads: &mut TargetHeads,
) -> ClassifiedMergeRequest {
    let not_ready = |mr: MergeRequest| ClassifiedMergeRequest {
        mr,
        has_conflicts: false,
        classification: Classification::NotReady,
    };

    let Some(mergers) = mergers else {
        // Merger set unresolved: hold back every MR targeting the branch
        return not_ready(mr);
    };

    match platform.get_merge_request(project.id, mr.iid).await {
        Ok(details) => {
            let classification =
                classify_merge_request(platform, project, &details, mergers, heads).await;
            ClassifiedMergeRequest {
                mr,
                has_conflicts: details.has_conflicts,
                classification,
            }
        }
        Err(e) => {
            warn!(
                project = %project.path,
                mr_iid = mr.iid,
                error = %e,
                "failed to get MR details; treating as not ready"
            );
            not_ready(mr)
        }
    }
}

/// Evaluate one project for one cycle
///
/// Failing to resolve roles or list MRs aborts this project only; the next
/// cycle retries from scratch.
pub async fn evaluate_project(
    platform: &dyn PlatformService,
    project: &Project,
    options: EvaluationOptions,
) -> Result<EvaluationBatch> {
    let roles = resolve_project_roles(platform, project).await?;
    let mrs = platform.list_open_merge_requests(project.id).await?;
    info!(project = %project.path, count = mrs.len(), "evaluating merge requests");

    // One merger set per distinct target branch, computed fresh each cycle
    let mut mergers: BTreeMap<String, Option<MergerSet>> = BTreeMap::new();
    for mr in &mrs {
        if mergers.contains_key(&mr.target_branch) {
            continue;
        }
        let resolved = match resolve_mergers(platform, project, &roles, &mr.target_branch).await
        {
            Ok(set) => Some(set),
            Err(e) => {
                error!(
                    project = %project.path,
                    branch = %mr.target_branch,
                    error = %e,
                    "failed to resolve mergers; skipping MRs targeting branch"
                );
                None
            }
        };
        mergers.insert(mr.target_branch.clone(), resolved);
    }

    let mut heads = TargetHeads::new();
    let mut entries = Vec::with_capacity(mrs.len());
    for mr in mrs {
        let branch_mergers = mergers.get(&mr.target_branch).and_then(Option::as_ref);
        entries.push(classify_entry(platform, project, mr, branch_mergers, &mut heads).await);
    }
    entries.sort_by_key(|e| (e.mr.created_at, e.mr.iid));

    let plan = create_merge_plan(&entries);
    info!(
        project = %project.path,
        merges = plan.merge_count(),
        auto_merges = plan.auto_merge_count(),
        rebases = plan.rebase_count(),
        pipelines_occupied = plan.pipelines_occupied,
        "planned cycle"
    );

    let report = if options.dry_run {
        None
    } else {
        Some(execute_plan(&plan, project, platform, options.merge_method).await)
    };

    Ok(EvaluationBatch {
        project: project.clone(),
        entries,
        plan,
        report,
    })
}
