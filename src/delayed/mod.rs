//! The delayed operation: simulated long-running work reported through a
//! continuation.
//!
//! [`DelayedOperation`] gets its scheduler injected. The free function
//! [`run_after_delay`] is the composition-root shortcut that asks the
//! [`registry`](crate::registry) at call time.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use task_facility::delayed::DelayedOperation;
//! use task_facility::scheduler::SynchronousScheduler;
//!
//! let op = DelayedOperation::new(Arc::new(SynchronousScheduler::new()))
//!     .with_delay(Duration::from_millis(1));
//!
//! let (tx, rx) = std::sync::mpsc::channel();
//! op.run_after_delay(7, move |v| tx.send(v).unwrap());
//!
//! // Synchronous scheduler: the continuation already ran.
//! assert_eq!(rx.try_recv(), Ok(7));
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;
use std::time::Duration;

use futures::channel::oneshot;
use tracing::debug;

use crate::config::{FacilityConfig, DEFAULT_DELAY};
use crate::error::{Error, Result};
use crate::registry;
use crate::scheduler::{Scheduler, WorkHandle};

/// Submits the delayed operation to the registry's current scheduler.
///
/// Blocks for the default delay inside the work item, then calls
/// `on_complete(value)` exactly once. When and on which thread that happens
/// is up to the installed scheduler.
pub fn run_after_delay<T, F>(value: T, on_complete: F) -> Option<WorkHandle>
where
    T: Send + 'static,
    F: FnOnce(T) + Send + 'static,
{
    DelayedOperation::from_registry().run_after_delay(value, on_complete)
}

/// A simulated expensive computation bound to a scheduler.
#[derive(Clone)]
pub struct DelayedOperation {
    scheduler: Arc<dyn Scheduler>,
    delay: Duration,
}

impl DelayedOperation {
    /// Creates an operation that submits to `scheduler`.
    #[must_use]
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            delay: DEFAULT_DELAY,
        }
    }

    /// Creates an operation bound to the registry's current scheduler.
    #[must_use]
    pub fn from_registry() -> Self {
        Self::new(registry::current())
    }

    /// Sets how long the work item blocks before completing.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Applies the delay from `config`.
    #[must_use]
    pub fn with_config(self, config: &FacilityConfig) -> Self {
        self.with_delay(config.delay)
    }

    /// The simulated duration.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The scheduler work is submitted to.
    #[must_use]
    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    /// Submits the operation; `on_complete(value)` runs once it finishes.
    ///
    /// Returns the scheduler's handle, if it gives one.
    pub fn run_after_delay<T, F>(&self, value: T, on_complete: F) -> Option<WorkHandle>
    where
        T: Send + 'static,
        F: FnOnce(T) + Send + 'static,
    {
        let delay = self.delay;
        debug!(?delay, scheduler = %self.scheduler.kind(), "submitting delayed operation");

        self.scheduler.submit(Box::new(move || {
            thread::sleep(delay);
            on_complete(value);
        }))
    }

    /// Like [`run_after_delay`](Self::run_after_delay), delivering the value
    /// through a [`Completion`] instead of a callback.
    pub fn deliver_after_delay<T>(&self, value: T) -> Completion<T>
    where
        T: Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let handle = self.run_after_delay(value, move |value| {
            // The receiver may already be gone; nobody is waiting then.
            let _ = sender.send(value);
        });
        Completion {
            receiver,
            handle,
            taken: false,
        }
    }
}

impl fmt::Debug for DelayedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelayedOperation")
            .field("scheduler", &self.scheduler.kind())
            .field("delay", &self.delay)
            .finish()
    }
}

/// Single-shot result of a delayed operation.
///
/// Resolves to the delivered value, or [`Error::Disconnected`] if the work
/// item died before delivering. The value is handed out once: after
/// [`try_take`](Self::try_take) returned it, awaiting or waiting yields
/// [`Error::Disconnected`].
pub struct Completion<T> {
    receiver: oneshot::Receiver<T>,
    handle: Option<WorkHandle>,
    taken: bool,
}

impl<T> Completion<T> {
    /// Handle of the underlying work item, when it runs detached.
    #[must_use]
    pub fn handle(&self) -> Option<&WorkHandle> {
        self.handle.as_ref()
    }

    /// Takes the value if it was already delivered.
    ///
    /// Returns `Ok(None)` while the value is pending and on every call after
    /// it was taken.
    ///
    /// # Errors
    ///
    /// [`Error::Disconnected`] if the value can never arrive.
    pub fn try_take(&mut self) -> Result<Option<T>> {
        if self.taken {
            return Ok(None);
        }
        let value = self.receiver.try_recv().map_err(|_| Error::Disconnected)?;
        self.taken = value.is_some();
        Ok(value)
    }

    /// Blocks the current thread until the value arrives.
    ///
    /// # Errors
    ///
    /// [`Error::Disconnected`] if the value can never arrive.
    pub fn wait(self) -> Result<T> {
        futures::executor::block_on(self)
    }
}

impl<T> Future for Completion<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.map_err(|_| Error::Disconnected))
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
