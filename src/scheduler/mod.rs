//! Poll scheduling - timer-driven evaluation cycles
//!
//! Every tick dispatches one task per project. Tasks share a bounded pool of
//! permits, and a project still being evaluated from an earlier tick is
//! skipped rather than evaluated twice concurrently.

mod discovery;
mod in_flight;

pub use discovery::discover_projects;
pub use in_flight::{InFlight, InFlightGuard};

use crate::merge::{EvaluationBatch, EvaluationOptions, evaluate_project};
use crate::platform::PlatformService;
use crate::types::Project;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Scheduler settings
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Time between cycle starts
    pub poll_interval: Duration,
    /// Maximum projects evaluated at once
    pub max_concurrent_projects: usize,
    /// Options passed to every project evaluation
    pub evaluation: EvaluationOptions,
}

/// Outcome of one project's evaluation task
#[derive(Debug)]
pub enum ProjectOutcome {
    /// Evaluation completed
    Evaluated(EvaluationBatch),
    /// Evaluation aborted; retried next cycle
    Failed {
        /// The project
        project: Project,
        /// Why evaluation stopped
        error: String,
    },
}

/// Tasks started by one tick
#[derive(Debug, Default)]
pub struct CycleDispatch {
    /// Running evaluation tasks
    pub handles: Vec<JoinHandle<ProjectOutcome>>,
    /// Projects skipped because they were still busy
    pub skipped_busy: Vec<Project>,
}

/// Collected results of a finished cycle
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Per-project outcomes, in completion order
    pub outcomes: Vec<ProjectOutcome>,
    /// Projects skipped because they were still busy
    pub skipped_busy: Vec<Project>,
}

impl CycleReport {
    /// Completed evaluation batches
    pub fn batches(&self) -> impl Iterator<Item = &EvaluationBatch> {
        self.outcomes.iter().filter_map(|o| match o {
            ProjectOutcome::Evaluated(batch) => Some(batch),
            ProjectOutcome::Failed { .. } => None,
        })
    }

    /// Number of projects whose evaluation failed
    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ProjectOutcome::Failed { .. }))
            .count()
    }
}

/// Await and drop finished tasks, logging any that panicked
///
/// Returns how many of the reaped tasks panicked.
async fn reap_finished<T>(pending: &mut Vec<JoinHandle<T>>) -> usize {
    let (finished, running): (Vec<_>, Vec<_>) =
        pending.drain(..).partition(JoinHandle::is_finished);
    *pending = running;

    let mut panicked = 0;
    for handle in finished {
        if let Err(e) = handle.await {
            error!(error = %e, "evaluation task panicked");
            panicked += 1;
        }
    }
    panicked
}

/// Drives evaluation cycles over a fixed project list
pub struct Scheduler {
    platform: Arc<dyn PlatformService>,
    projects: Vec<Project>,
    config: SchedulerConfig,
    in_flight: Arc<InFlight>,
    permits: Arc<Semaphore>,
}

impl Scheduler {
    /// Create a scheduler
    pub fn new(
        platform: Arc<dyn PlatformService>,
        projects: Vec<Project>,
        config: SchedulerConfig,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_projects.max(1)));
        Self {
            platform,
            projects,
            config,
            in_flight: InFlight::new(),
            permits,
        }
    }

    /// Projects this scheduler evaluates
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Start one cycle without waiting for it
    ///
    /// Projects are claimed before their tasks are spawned, so a dispatch
    /// issued while a previous one is running skips the busy projects.
    pub fn dispatch_cycle(&self) -> CycleDispatch {
        let mut dispatch = CycleDispatch::default();

        for project in &self.projects {
            let Some(guard) = self.in_flight.try_claim(project.id) else {
                warn!(project = %project.path, "previous evaluation still running; skipping");
                dispatch.skipped_busy.push(project.clone());
                continue;
            };

            let platform = Arc::clone(&self.platform);
            let permits = Arc::clone(&self.permits);
            let project = project.clone();
            let options = self.config.evaluation;

            dispatch.handles.push(tokio::spawn(async move {
                let _guard = guard;
                let _permit = permits.acquire_owned().await.ok();

                match evaluate_project(platform.as_ref(), &project, options).await {
                    Ok(batch) => ProjectOutcome::Evaluated(batch),
                    Err(e) => {
                        error!(project = %project.path, error = %e, "project evaluation failed");
                        ProjectOutcome::Failed {
                            project,
                            error: e.to_string(),
                        }
                    }
                }
            }));
        }

        dispatch
    }

    /// Run one cycle to completion
    pub async fn run_cycle(&self) -> CycleReport {
        let dispatch = self.dispatch_cycle();
        let mut report = CycleReport {
            outcomes: Vec::with_capacity(dispatch.handles.len()),
            skipped_busy: dispatch.skipped_busy,
        };

        for handle in dispatch.handles {
            match handle.await {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => error!(error = %e, "evaluation task panicked"),
            }
        }

        report
    }

    /// Run cycles every poll interval until `shutdown` resolves
    ///
    /// Evaluations already running when shutdown is requested are awaited.
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(
            projects = self.projects.len(),
            interval_secs = self.config.poll_interval.as_secs(),
            "starting poll loop"
        );

        let mut pending: Vec<JoinHandle<ProjectOutcome>> = Vec::new();
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    reap_finished(&mut pending).await;
                    pending.extend(self.dispatch_cycle().handles);
                }
            }
        }

        info!(pending = pending.len(), "shutting down; waiting for running evaluations");
        for handle in pending {
            if let Err(e) = handle.await {
                error!(error = %e, "evaluation task panicked");
            }
        }
    }
}
