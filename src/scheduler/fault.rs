//! Out-of-band record of work items that panicked on a worker.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{SchedulerKind, WorkId};

/// A panic caught while a concurrent scheduler executed a work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkFault {
    /// The item that panicked.
    pub id: WorkId,
    /// The scheduler that ran it.
    pub scheduler: SchedulerKind,
    /// Rendered panic payload.
    pub message: String,
}

impl fmt::Display for WorkFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}: {}", self.id, self.scheduler, self.message)
    }
}

/// Shared list of [`WorkFault`]s.
///
/// Clones observe the same list. The log is unbounded: entries stay until
/// [`take`](Self::take) or [`clear`](Self::clear) removes them.
#[derive(Debug, Clone, Default)]
pub struct FaultLog {
    faults: Arc<Mutex<Vec<WorkFault>>>,
}

impl FaultLog {
    /// Create an empty fault log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, fault: WorkFault) {
        self.faults.lock().push(fault);
    }

    /// Snapshot of all recorded faults, oldest first.
    #[must_use]
    pub fn faults(&self) -> Vec<WorkFault> {
        self.faults.lock().clone()
    }

    /// Number of recorded faults.
    #[must_use]
    pub fn len(&self) -> usize {
        self.faults.lock().len()
    }

    /// Returns true if nothing panicked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faults.lock().is_empty()
    }

    /// Removes and returns all recorded faults.
    pub fn take(&self) -> Vec<WorkFault> {
        std::mem::take(&mut *self.faults.lock())
    }

    /// Forget all recorded faults.
    pub fn clear(&self) {
        self.faults.lock().clear();
    }
}
