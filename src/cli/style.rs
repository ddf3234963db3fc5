//! Terminal styling helpers
//!
//! Output goes through `anstream`, which strips the escape codes when stdout
//! is not a terminal.

use owo_colors::OwoColorize;
use std::fmt::Display;

/// Check mark for completed actions
pub const CHECK: &str = "✓";

/// Semantic styles for CLI output
pub trait Stylize: Display + Sized {
    /// Headings and key values
    fn emphasis(&self) -> String {
        self.bold().to_string()
    }

    /// Identifiers (project paths, MR numbers)
    fn accent(&self) -> String {
        self.cyan().to_string()
    }

    /// Secondary detail
    fn muted(&self) -> String {
        self.dimmed().to_string()
    }

    /// Successful outcomes
    fn success(&self) -> String {
        self.green().to_string()
    }

    /// Skips and failures
    fn warn(&self) -> String {
        self.yellow().to_string()
    }
}

impl<T: Display> Stylize for T {}

/// Styled check mark
pub fn check() -> String {
    CHECK.success()
}
