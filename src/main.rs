//! mr-autopilot CLI

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::CommandContext;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "mr-autopilot")]
#[command(about = "Policy-driven auto-merge bot for GitLab merge requests")]
#[command(version)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, env = "MR_AUTOPILOT_CONFIG")]
    config: Option<PathBuf>,

    /// Plan and report without merging, rebasing or arming auto-merge
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll configured projects until interrupted (default)
    Run,

    /// Run a single evaluation cycle and print the decisions
    Once,

    /// List the projects that would be evaluated
    Projects,
}

/// Install the global subscriber; `RUST_LOG` overrides `level`.
fn init_tracing(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .ok();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CommandContext::load_config(cli.config.as_deref())?;
    init_tracing(config.effective_log_level()?);

    let ctx = CommandContext::new(config).await?;
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cli::run_daemon(&ctx, cli.dry_run).await?,
        Commands::Once => cli::run_once(&ctx, cli.dry_run).await?,
        Commands::Projects => cli::run_projects(&ctx).await?,
    }

    Ok(())
}
