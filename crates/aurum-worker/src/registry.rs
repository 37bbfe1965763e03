//! Job registry: look up progress by job id.
//!
//! Each submitted job gets its own [`JobProgress`]; observers resolve
//! a [`JobId`] to a snapshot through the registry. Concurrent jobs are
//! isolated; there is no shared global state to interleave.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::progress::JobProgress;

/// Opaque identifier for a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Maps job ids to their progress handles.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<u64, JobProgress>>,
    next_id: AtomicU64,
}

impl JobRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job, returning its id and progress handle.
    pub fn create(&self) -> (JobId, JobProgress) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let progress = JobProgress::new();
        if let Ok(mut jobs) = self.jobs.lock() {
            jobs.insert(id, progress.clone());
        }
        (JobId(id), progress)
    }

    /// Resolve a job id to its progress handle.
    #[must_use]
    pub fn get(&self, id: JobId) -> Option<JobProgress> {
        self.jobs
            .lock()
            .ok()
            .and_then(|jobs| jobs.get(&id.0).cloned())
    }

    /// Drop a finished job's state.
    pub fn remove(&self, id: JobId) {
        if let Ok(mut jobs) = self.jobs.lock() {
            jobs.remove(&id.0);
        }
    }
}
