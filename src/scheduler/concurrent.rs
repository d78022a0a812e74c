//! The production scheduler: one named worker thread per item.

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{execute_guarded, FaultLog, Scheduler, SchedulerKind, WorkHandle, WorkId, WorkItem};
use crate::config::FacilityConfig;

/// Runs every submitted item on its own OS thread.
///
/// `submit` never blocks and never observes a panic from the work item;
/// panics are recorded in [`faults`](ConcurrentScheduler::faults) and
/// reported through the returned [`WorkHandle`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use task_facility::scheduler::{ConcurrentScheduler, Scheduler};
///
/// let scheduler = ConcurrentScheduler::new();
/// let handle = scheduler.submit(Box::new(|| panic!("lost connection"))).unwrap();
///
/// assert!(handle.wait(Duration::from_secs(5)).is_err());
/// assert_eq!(scheduler.faults().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ConcurrentScheduler {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    thread_name_prefix: String,
    faults: FaultLog,
}

impl ConcurrentScheduler {
    /// Creates a scheduler with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&FacilityConfig::default())
    }

    /// Creates a scheduler using `config`'s thread naming.
    #[must_use]
    pub fn with_config(config: &FacilityConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                thread_name_prefix: config.thread_name_prefix.clone(),
                faults: FaultLog::new(),
            }),
        }
    }

    /// Panics caught from items this scheduler ran.
    ///
    /// Retained for as long as the scheduler lives; drain with
    /// [`FaultLog::take`].
    #[must_use]
    pub fn faults(&self) -> &FaultLog {
        &self.inner.faults
    }
}

impl Default for ConcurrentScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ConcurrentScheduler {
    fn submit(&self, work: WorkItem) -> Option<WorkHandle> {
        let kind = SchedulerKind::Concurrent;
        let id = WorkId::new();
        let handle = WorkHandle::new(id);
        debug!(work = %id, scheduler = %kind, "work item submitted");

        // Shared so the item survives a failed spawn.
        let pending = Arc::new(Mutex::new(Some(work)));
        let task = Arc::clone(&pending);
        let slot = handle.slot();
        let faults = self.inner.faults.clone();

        let spawned = thread::Builder::new()
            .name(format!("{}-{}", self.inner.thread_name_prefix, id.as_u64()))
            .spawn(move || {
                let work = task.lock().take();
                if let Some(work) = work {
                    execute_guarded(id, kind, work, &slot, &faults);
                }
            });

        if let Err(err) = spawned {
            warn!(work = %id, error = %err, "failed to spawn worker, running work item inline");
            let work = pending.lock().take();
            if let Some(work) = work {
                execute_guarded(id, kind, work, &handle.slot(), &self.inner.faults);
            }
        }

        Some(handle)
    }

    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Concurrent
    }
}
