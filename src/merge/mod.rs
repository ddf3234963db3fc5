//! Merge engine for a project's open merge requests
//!
//! Three-phase pattern:
//! 1. Gather - resolve roles and merger sets, fetch MR details (effectful)
//! 2. Classify + plan - readiness chain and sequencing (pure, testable)
//! 3. Execute - perform merges, auto-merges and rebases (effectful)

pub mod access;
mod evaluate;
mod execute;
pub mod mergers;
mod plan;
pub mod readiness;

pub use access::{partition_members, resolve_project_roles};
pub use evaluate::{EvaluationBatch, EvaluationOptions, evaluate_project};
pub use execute::{ExecutionReport, execute_plan};
pub use mergers::{merger_set_for_rule, resolve_mergers};
pub use plan::{ClassifiedMergeRequest, MergePlan, MergeStep, SkipReason, create_merge_plan};
pub use readiness::{
    Classification, TargetHeads, classify, classify_merge_request, diff_base, precheck,
};
