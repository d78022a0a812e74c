//! The test scheduler: work runs inline, in program order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

use super::{Scheduler, SchedulerKind, WorkHandle, WorkId, WorkItem};

/// Runs each submitted item on the caller's thread before `submit` returns.
///
/// A panic inside the work item unwinds straight through `submit` into the
/// caller, which is what lets a test observe it.
#[derive(Debug, Clone, Default)]
pub struct SynchronousScheduler {
    executed: Arc<AtomicUsize>,
}

impl SynchronousScheduler {
    /// Creates a new synchronous scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items that ran to completion on this scheduler (and its clones).
    #[must_use]
    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }
}

impl Scheduler for SynchronousScheduler {
    fn submit(&self, work: WorkItem) -> Option<WorkHandle> {
        let id = WorkId::new();
        debug!(work = %id, scheduler = %SchedulerKind::Synchronous, "running work item inline");
        work();
        self.executed.fetch_add(1, Ordering::SeqCst);
        debug!(work = %id, scheduler = %SchedulerKind::Synchronous, "work item completed");
        None
    }

    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Synchronous
    }
}
