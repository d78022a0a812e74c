//! Tokio integration: work items on a runtime's blocking pool.
//!
//! Work items are plain blocking closures, so they go through
//! `spawn_blocking` rather than onto the async worker threads.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use task_facility::scheduler::TokioScheduler;
//! use task_facility::delayed::DelayedOperation;
//!
//! #[tokio::main]
//! async fn main() {
//!     let scheduler = Arc::new(TokioScheduler::current());
//!     DelayedOperation::new(scheduler).run_after_delay(3, |v| println!("{v}"));
//! }
//! ```

use std::sync::Arc;

use ::tokio::runtime::Handle;
use tracing::{debug, warn};

use super::work::WorkSlot;
use super::{execute_guarded, FaultLog, Scheduler, SchedulerKind, WorkHandle, WorkId, WorkItem};

/// Runs submitted items on a tokio runtime's blocking thread pool.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
    faults: FaultLog,
}

impl TokioScheduler {
    /// Creates a scheduler bound to the given runtime.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            faults: FaultLog::new(),
        }
    }

    /// Creates a scheduler bound to the runtime the caller is running in.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime; see [`try_current`](Self::try_current).
    #[must_use]
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Like [`current`](Self::current), returning `None` outside a runtime.
    #[must_use]
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    /// Panics caught from items this scheduler ran.
    #[must_use]
    pub fn faults(&self) -> &FaultLog {
        &self.faults
    }
}

/// A work item in flight to the blocking pool.
///
/// A runtime that is shutting down drops queued blocking tasks without
/// polling them. Dropping an unrun submission executes the item inline on
/// the dropping thread, so every item still runs exactly once.
struct Submission {
    id: WorkId,
    work: Option<WorkItem>,
    slot: Arc<WorkSlot>,
    faults: FaultLog,
}

impl Submission {
    fn run(mut self) {
        if let Some(work) = self.work.take() {
            execute_guarded(self.id, SchedulerKind::Tokio, work, &self.slot, &self.faults);
        }
    }
}

impl Drop for Submission {
    fn drop(&mut self) {
        if let Some(work) = self.work.take() {
            warn!(
                work = %self.id,
                scheduler = %SchedulerKind::Tokio,
                "runtime dropped the work item, running it inline"
            );
            execute_guarded(self.id, SchedulerKind::Tokio, work, &self.slot, &self.faults);
        }
    }
}

impl Scheduler for TokioScheduler {
    fn submit(&self, work: WorkItem) -> Option<WorkHandle> {
        let kind = SchedulerKind::Tokio;
        let id = WorkId::new();
        let handle = WorkHandle::new(id);
        debug!(work = %id, scheduler = %kind, "work item submitted");

        let submission = Submission {
            id,
            work: Some(work),
            slot: handle.slot(),
            faults: self.faults.clone(),
        };
        // Detached; the WorkHandle is the observation point.
        drop(self.handle.spawn_blocking(move || submission.run()));

        Some(handle)
    }

    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Tokio
    }
}
