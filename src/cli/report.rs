//! Human-readable cycle output

use crate::cli::style::{Stylize, check};
use anstream::println;
use mr_autopilot::merge::{EvaluationBatch, MergeStep};
use mr_autopilot::scheduler::{CycleReport, ProjectOutcome};
use mr_autopilot::types::{Project, User};

/// Print every project's decisions for one cycle
pub fn report_cycle(report: &CycleReport, dry_run: bool) {
    for outcome in &report.outcomes {
        match outcome {
            ProjectOutcome::Evaluated(batch) => report_batch(batch, dry_run),
            ProjectOutcome::Failed { project, error } => {
                println!("{}", project.to_string().emphasis());
                println!("  {} {}", "✗ Evaluation failed:".warn(), error);
                println!();
            }
        }
    }

    for project in &report.skipped_busy {
        println!(
            "{} {}",
            project.to_string().emphasis(),
            "(still busy, skipped)".muted()
        );
    }

    let evaluated = report.batches().count();
    let failed = report.failed_count();
    if failed == 0 {
        println!("{} Evaluated {} project(s)", check(), evaluated.accent());
    } else {
        println!(
            "{} Evaluated {} project(s), {} failed",
            "⚠".warn(),
            evaluated.accent(),
            failed.warn()
        );
    }
}

fn report_batch(batch: &EvaluationBatch, dry_run: bool) {
    println!("{}", batch.project.to_string().emphasis());

    if batch.entries.is_empty() {
        println!("  {}", "No open merge requests".muted());
        println!();
        return;
    }

    for (mr, classification, step) in batch.decisions() {
        let label = format!("!{}", mr.iid);
        if let MergeStep::Skip { reason, .. } = step {
            println!("  {} {}: {}", "- Skip".muted(), label.accent(), mr.title);
            println!("    {}", format!("{classification}; {reason}").muted());
        } else if let Some(action) = step_action(step, dry_run) {
            println!("  {} {}: {}", action, label.accent(), mr.title);
        }
    }

    if let Some(report) = &batch.report {
        for (iid, error) in &report.failed {
            println!("  {} !{}: {}", "✗ Failed".warn(), iid, error);
        }
    }
    println!();
}

/// Styled action for a write step; `None` for skips
fn step_action(step: &MergeStep, dry_run: bool) -> Option<String> {
    let verb = if dry_run { "Would " } else { "" };
    match step {
        MergeStep::Merge { .. } => Some(format!("✓ {verb}merge").success()),
        MergeStep::SetAutoMerge { .. } => Some(format!("⏳ {verb}set auto-merge").success()),
        MergeStep::Rebase { .. } => Some(format!("↻ {verb}rebase").accent()),
        MergeStep::Skip { .. } => None,
    }
}

/// Print the projects the bot will evaluate
pub fn report_projects(user: &User, projects: &[Project]) {
    if projects.is_empty() {
        println!("{}", format!("No projects maintained by @{}", user.username).muted());
        return;
    }

    println!("{} (as @{}):", "Projects".emphasis(), user.username.accent());
    for project in projects {
        println!("  {} {}", project.path.accent(), format!("#{}", project.id).muted());
    }
}
