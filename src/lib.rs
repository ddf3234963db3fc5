//! mr-autopilot: policy-driven auto-merge for GitLab merge requests
//!
//! Each poll cycle works out who may merge into each target branch and
//! classifies open merge requests through an ordered readiness chain. At most
//! one merge per project is issued per cycle; rebases wait while pipelines
//! are already occupying CI runners.

pub mod auth;
pub mod config;
pub mod error;
pub mod merge;
pub mod platform;
pub mod scheduler;
pub mod types;
