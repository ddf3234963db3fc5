//! Run, once and projects commands

use crate::cli::context::CommandContext;
use crate::cli::report::{report_cycle, report_projects};
use mr_autopilot::error::Result;
use tracing::{info, warn};

/// Poll forever, stopping cleanly on Ctrl-C
pub async fn run_daemon(ctx: &CommandContext, dry_run: bool) -> Result<()> {
    let scheduler = ctx.scheduler(dry_run).await?;
    if scheduler.projects().is_empty() {
        warn!("no projects to evaluate");
    }

    scheduler
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown requested");
        })
        .await;

    Ok(())
}

/// Run a single cycle and print its decisions
pub async fn run_once(ctx: &CommandContext, dry_run: bool) -> Result<()> {
    let scheduler = ctx.scheduler(dry_run).await?;
    let report = scheduler.run_cycle().await;
    report_cycle(&report, dry_run);
    Ok(())
}

/// List the projects the bot would evaluate
pub async fn run_projects(ctx: &CommandContext) -> Result<()> {
    let scheduler = ctx.scheduler(true).await?;
    report_projects(&ctx.user, scheduler.projects());
    Ok(())
}
