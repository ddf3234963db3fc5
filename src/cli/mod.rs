//! CLI command implementations

pub mod context;
mod report;
mod run;
pub mod style;

pub use context::CommandContext;
pub use run::{run_daemon, run_once, run_projects};
