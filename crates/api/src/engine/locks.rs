//! Per-project generation lock.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use launchkit_core::types::DbId;

/// Set of projects with a generation in flight.
#[derive(Debug, Default)]
pub struct ProjectLocks {
    busy: Mutex<HashSet<DbId>>,
}

impl ProjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `project_id`, or `None` if it is already claimed.
    ///
    /// The claim is released when the returned guard drops, on every exit
    /// path of whatever task ends up owning it.
    pub fn try_acquire(self: &Arc<Self>, project_id: DbId) -> Option<ProjectLockGuard> {
        if !self.set().insert(project_id) {
            return None;
        }
        Some(ProjectLockGuard {
            locks: Arc::clone(self),
            project_id,
        })
    }

    pub fn is_busy(&self, project_id: DbId) -> bool {
        self.set().contains(&project_id)
    }

    /// Number of projects currently claimed.
    pub fn active_count(&self) -> usize {
        self.set().len()
    }

    // A panic while holding the mutex cannot leave the set half-updated, so a
    // poisoned lock is still safe to use.
    fn set(&self) -> MutexGuard<'_, HashSet<DbId>> {
        self.busy.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// RAII claim on one project's generation slot.
#[derive(Debug)]
pub struct ProjectLockGuard {
    locks: Arc<ProjectLocks>,
    project_id: DbId,
}

impl ProjectLockGuard {
    pub fn project_id(&self) -> DbId {
        self.project_id
    }
}

impl Drop for ProjectLockGuard {
    fn drop(&mut self) {
        self.locks.set().remove(&self.project_id);
    }
}
