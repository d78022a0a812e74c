//! The scheduler contract and its variants.
//!
//! A [`Scheduler`] accepts a [`WorkItem`] and guarantees it runs exactly
//! once. Business code depends on the trait only; which variant runs the
//! work decides *when* and *where* it happens:
//!
//! - [`ConcurrentScheduler`] - runs each item on its own worker thread and
//!   returns immediately. Panics are caught on the worker and land in the
//!   scheduler's [`FaultLog`].
//! - [`SynchronousScheduler`] - runs the item inline before `submit`
//!   returns. Panics propagate to the caller of `submit`.
//! - `TokioScheduler` - runs items on a tokio blocking pool (with the
//!   `tokio` feature).
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use task_facility::scheduler::{Scheduler, SynchronousScheduler};
//!
//! let scheduler = SynchronousScheduler::new();
//! let runs = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&runs);
//!
//! let handle = scheduler.submit(Box::new(move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! }));
//!
//! // Inline execution: already done, nothing to wait on.
//! assert!(handle.is_none());
//! assert_eq!(runs.load(Ordering::SeqCst), 1);
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error};

use crate::error::panic_message;

mod concurrent;
mod fault;
mod synchronous;
#[cfg(feature = "tokio")]
mod tokio;
mod work;

pub use concurrent::ConcurrentScheduler;
pub use fault::{FaultLog, WorkFault};
pub use synchronous::SynchronousScheduler;
#[cfg(feature = "tokio")]
pub use self::tokio::TokioScheduler;
pub use work::{WorkHandle, WorkId, WorkItem, WorkState};

use work::WorkSlot;

/// Which execution model a scheduler implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchedulerKind {
    /// Work runs on another thread; `submit` returns immediately.
    Concurrent,
    /// Work runs inline on the submitting thread.
    Synchronous,
    /// Work runs on a tokio blocking pool.
    #[cfg(feature = "tokio")]
    Tokio,
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerKind::Concurrent => write!(f, "Concurrent"),
            SchedulerKind::Synchronous => write!(f, "Synchronous"),
            #[cfg(feature = "tokio")]
            SchedulerKind::Tokio => write!(f, "Tokio"),
        }
    }
}

/// Submit a unit of work for execution.
///
/// Implementations must run every submitted item exactly once and never
/// drop one silently.
pub trait Scheduler: Send + Sync + fmt::Debug {
    /// Submits `work` for execution.
    ///
    /// Returns a [`WorkHandle`] when the item runs detached from the caller,
    /// `None` when it already ran by the time this returns.
    fn submit(&self, work: WorkItem) -> Option<WorkHandle>;

    /// The execution model of this scheduler.
    fn kind(&self) -> SchedulerKind;
}

/// Runs `work` on a worker, turning a panic into a recorded fault.
pub(crate) fn execute_guarded(
    id: WorkId,
    kind: SchedulerKind,
    work: WorkItem,
    slot: &WorkSlot,
    faults: &FaultLog,
) {
    slot.mark_running();
    debug!(work = %id, scheduler = %kind, "work item started");

    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(()) => {
            debug!(work = %id, scheduler = %kind, "work item completed");
            slot.finish(None);
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(work = %id, scheduler = %kind, %message, "work item panicked");
            faults.record(WorkFault {
                id,
                scheduler: kind,
                message: message.clone(),
            });
            slot.finish(Some(message));
        }
    }
}
