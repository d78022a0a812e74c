//! Work item identity, state, and handles.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};

/// A deferred unit of computation submitted to a scheduler.
pub type WorkItem = Box<dyn FnOnce() + Send + 'static>;

/// Unique identifier for a submitted work item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkId(u64);

impl WorkId {
    /// Creates a new unique work ID.
    pub(crate) fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Work({})", self.0)
    }
}

/// The current state of a work item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkState {
    /// Submitted but not started.
    Queued,
    /// Currently executing.
    Running,
    /// Ran to completion.
    Completed,
    /// Panicked while executing.
    Failed,
}

impl WorkState {
    /// Returns true once the item will never run again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkState::Completed | WorkState::Failed)
    }
}

impl fmt::Display for WorkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkState::Queued => write!(f, "Queued"),
            WorkState::Running => write!(f, "Running"),
            WorkState::Completed => write!(f, "Completed"),
            WorkState::Failed => write!(f, "Failed"),
        }
    }
}

struct Status {
    state: WorkState,
    failure: Option<String>,
}

/// Shared completion state between a worker and its handles.
pub(crate) struct WorkSlot {
    status: Mutex<Status>,
    finished: Condvar,
}

impl WorkSlot {
    fn new() -> Self {
        Self {
            status: Mutex::new(Status {
                state: WorkState::Queued,
                failure: None,
            }),
            finished: Condvar::new(),
        }
    }

    pub(crate) fn mark_running(&self) {
        self.status.lock().state = WorkState::Running;
    }

    /// Records the outcome and wakes every waiter. `failure` carries the panic message.
    pub(crate) fn finish(&self, failure: Option<String>) {
        let mut status = self.status.lock();
        status.state = if failure.is_some() {
            WorkState::Failed
        } else {
            WorkState::Completed
        };
        status.failure = failure;
        self.finished.notify_all();
    }
}

/// Handle to a work item running on a concurrent scheduler.
///
/// The handle observes the item; dropping it does not cancel anything.
#[derive(Clone)]
pub struct WorkHandle {
    /// The work item's unique identifier.
    pub id: WorkId,
    slot: Arc<WorkSlot>,
}

impl WorkHandle {
    pub(crate) fn new(id: WorkId) -> Self {
        Self {
            id,
            slot: Arc::new(WorkSlot::new()),
        }
    }

    pub(crate) fn slot(&self) -> Arc<WorkSlot> {
        Arc::clone(&self.slot)
    }

    /// Returns the item's current state.
    #[must_use]
    pub fn state(&self) -> WorkState {
        self.slot.status.lock().state
    }

    /// Returns true if the item completed or failed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Blocks until the item finishes or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// [`Error::WorkItemFailure`] if the item panicked, [`Error::Timeout`]
    /// if it is still queued or running when the timeout expires.
    pub fn wait(&self, timeout: Duration) -> Result<()> {
        // `None` when the timeout is too large to represent: wait without a deadline.
        let deadline = Instant::now().checked_add(timeout);
        let mut status = self.slot.status.lock();
        while !status.state.is_terminal() {
            match deadline {
                Some(deadline) => {
                    if self
                        .slot
                        .finished
                        .wait_until(&mut status, deadline)
                        .timed_out()
                        && !status.state.is_terminal()
                    {
                        return Err(Error::Timeout(timeout));
                    }
                }
                None => self.slot.finished.wait(&mut status),
            }
        }
        match &status.failure {
            Some(message) => Err(Error::work_item_failure(message.clone())),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for WorkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkHandle")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_id_unique_and_ordered() {
        let id1 = WorkId::new();
        let id2 = WorkId::new();

        assert_ne!(id1, id2);
        assert!(id1 < id2);
    }

    #[test]
    fn test_work_id_display() {
        let id = WorkId::new();
        assert_eq!(id.to_string(), format!("Work({})", id.as_u64()));
    }

    #[test]
    fn test_work_state_display() {
        assert_eq!(WorkState::Queued.to_string(), "Queued");
        assert_eq!(WorkState::Running.to_string(), "Running");
        assert_eq!(WorkState::Completed.to_string(), "Completed");
        assert_eq!(WorkState::Failed.to_string(), "Failed");
    }

    #[test]
    fn test_handle_initially_queued() {
        let handle = WorkHandle::new(WorkId::new());

        assert_eq!(handle.state(), WorkState::Queued);
        assert!(!handle.is_finished());
    }

    #[test]
    fn test_handle_wait_times_out() {
        let handle = WorkHandle::new(WorkId::new());
        handle.slot().mark_running();

        let result = handle.wait(Duration::from_millis(10));
        assert_eq!(result, Err(Error::Timeout(Duration::from_millis(10))));
    }

    #[test]
    fn test_handle_wait_completed() {
        let handle = WorkHandle::new(WorkId::new());
        handle.slot().finish(None);

        assert_eq!(handle.state(), WorkState::Completed);
        assert!(handle.wait(Duration::ZERO).is_ok());
    }

    #[test]
    fn test_handle_wait_failed() {
        let handle = WorkHandle::new(WorkId::new());
        handle.slot().finish(Some("boom".to_string()));

        assert_eq!(handle.state(), WorkState::Failed);
        assert_eq!(
            handle.wait(Duration::ZERO),
            Err(Error::WorkItemFailure("boom".to_string()))
        );
    }

    #[test]
    fn test_handle_wait_wakes_on_finish_from_other_thread() {
        let handle = WorkHandle::new(WorkId::new());
        let slot = handle.slot();

        let worker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            slot.finish(None);
        });

        assert!(handle.wait(Duration::from_secs(5)).is_ok());
        worker.join().unwrap();
    }

    #[test]
    fn test_handle_wait_unbounded_timeout_on_finished_item() {
        let handle = WorkHandle::new(WorkId::new());
        handle.slot().finish(None);

        assert!(handle.wait(Duration::MAX).is_ok());
    }

    #[test]
    fn test_handle_wait_unbounded_timeout_blocks_until_finish() {
        let handle = WorkHandle::new(WorkId::new());
        let slot = handle.slot();

        let worker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            slot.finish(Some("late failure".to_string()));
        });

        assert_eq!(
            handle.wait(Duration::MAX),
            Err(Error::WorkItemFailure("late failure".to_string()))
        );
        worker.join().unwrap();
    }

    #[test]
    fn test_handle_clone_shares_state() {
        let handle = WorkHandle::new(WorkId::new());
        let clone = handle.clone();

        handle.slot().finish(None);
        assert!(clone.is_finished());
        assert_eq!(clone.id, handle.id);
    }
}
