//! Per-project mutual exclusion across overlapping cycles

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Set of projects currently being evaluated
#[derive(Debug, Default)]
pub struct InFlight {
    projects: Mutex<HashSet<u64>>,
}

impl InFlight {
    /// Create an empty registry
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claim a project for evaluation
    ///
    /// Returns `None` when the project is still claimed by an earlier cycle.
    /// The claim is released when the guard drops, including on panic.
    pub fn try_claim(self: &Arc<Self>, project_id: u64) -> Option<InFlightGuard> {
        let claimed = self
            .projects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(project_id);
        claimed.then(|| InFlightGuard {
            registry: Arc::clone(self),
            project_id,
        })
    }

    /// Whether a project is currently claimed
    pub fn is_busy(&self, project_id: u64) -> bool {
        self.projects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&project_id)
    }
}

/// Releases a project claim on drop
#[derive(Debug)]
pub struct InFlightGuard {
    registry: Arc<InFlight>,
    project_id: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry
            .projects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.project_id);
    }
}
