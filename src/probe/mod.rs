// Probe methods are mostly read for their side effects in assertions
#![allow(clippy::must_use_candidate)]

//! Continuation probes for verifying callback delivery.
//!
//! [`CallProbe`] hands out continuations and records every invocation with
//! the delivered value and the thread it arrived on. Clones share the same
//! record, so a probe can be moved into a work item while the test keeps a
//! copy for assertions.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use task_facility::delayed::DelayedOperation;
//! use task_facility::probe::CallProbe;
//! use task_facility::scheduler::ConcurrentScheduler;
//!
//! let op = DelayedOperation::new(Arc::new(ConcurrentScheduler::new()))
//!     .with_delay(Duration::from_millis(10));
//! let probe = CallProbe::new();
//!
//! op.run_after_delay(3, probe.continuation());
//!
//! assert!(probe.wait_for_calls(1, Duration::from_secs(5)));
//! assert_eq!(probe.values(), vec![3]);
//! ```

use std::fmt::{self, Debug};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A recorded continuation invocation.
#[derive(Debug, Clone)]
pub struct ProbeCall<T> {
    /// The value the continuation received.
    pub value: T,
    /// The thread the continuation ran on.
    pub thread: ThreadId,
    /// When the call happened (relative to probe creation).
    pub timestamp: Duration,
}

/// Records continuation invocations; clones share the record.
pub struct CallProbe<T> {
    inner: Arc<ProbeInner<T>>,
}

struct ProbeInner<T> {
    calls: Mutex<Vec<ProbeCall<T>>>,
    arrived: Condvar,
    created_at: Instant,
}

impl<T> CallProbe<T> {
    /// Create a new probe.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ProbeInner {
                calls: Mutex::new(Vec::new()),
                arrived: Condvar::new(),
                created_at: Instant::now(),
            }),
        }
    }

    /// Record a call with the given value on the current thread.
    pub fn record(&self, value: T) {
        let mut calls = self.inner.calls.lock();
        calls.push(ProbeCall {
            value,
            thread: thread::current().id(),
            timestamp: self.inner.created_at.elapsed(),
        });
        self.inner.arrived.notify_all();
    }

    /// A continuation that records into this probe.
    pub fn continuation(&self) -> impl FnOnce(T) + Send + 'static
    where
        T: Send + 'static,
    {
        let probe = self.clone();
        move |value| probe.record(value)
    }

    /// Get the number of recorded calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inner.calls.lock().len()
    }

    /// Check if any calls were recorded.
    #[must_use]
    pub fn was_called(&self) -> bool {
        self.call_count() > 0
    }

    /// Check if called exactly N times.
    #[must_use]
    pub fn was_called_times(&self, n: usize) -> bool {
        self.call_count() == n
    }

    /// Blocks until at least `n` calls were recorded or `timeout` elapses.
    ///
    /// Returns whether the count was reached.
    pub fn wait_for_calls(&self, n: usize, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut calls = self.inner.calls.lock();
        while calls.len() < n {
            match deadline {
                Some(deadline) => {
                    if self
                        .inner
                        .arrived
                        .wait_until(&mut calls, deadline)
                        .timed_out()
                    {
                        return calls.len() >= n;
                    }
                }
                None => self.inner.arrived.wait(&mut calls),
            }
        }
        true
    }

    /// Reset the probe.
    pub fn reset(&self) {
        self.inner.calls.lock().clear();
    }
}

impl<T: Clone> CallProbe<T> {
    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<ProbeCall<T>> {
        self.inner.calls.lock().clone()
    }

    /// Get the delivered values in arrival order.
    pub fn values(&self) -> Vec<T> {
        self.inner
            .calls
            .lock()
            .iter()
            .map(|call| call.value.clone())
            .collect()
    }

    /// Get the Nth recorded call (0-indexed).
    pub fn nth_call(&self, n: usize) -> Option<ProbeCall<T>> {
        self.inner.calls.lock().get(n).cloned()
    }

    /// Get the last recorded call.
    pub fn last_call(&self) -> Option<ProbeCall<T>> {
        self.inner.calls.lock().last().cloned()
    }

    /// Check if called with a specific value.
    pub fn was_called_with(&self, expected: &T) -> bool
    where
        T: PartialEq,
    {
        self.inner.calls.lock().iter().any(|c| &c.value == expected)
    }
}

impl<T> Default for CallProbe<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for CallProbe<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Debug> Debug for CallProbe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let calls = self.inner.calls.lock();
        f.debug_struct("CallProbe")
            .field("call_count", &calls.len())
            .field("calls", &*calls)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_records_values() {
        let probe = CallProbe::new();

        assert!(!probe.was_called());

        probe.record(1);
        probe.record(2);

        assert!(probe.was_called_times(2));
        assert_eq!(probe.values(), vec![1, 2]);
        assert_eq!(probe.nth_call(1).unwrap().value, 2);
        assert!(probe.nth_call(2).is_none());
    }

    #[test]
    fn test_continuation_shares_record() {
        let probe = CallProbe::new();
        let continuation = probe.continuation();

        continuation("hello");

        assert!(probe.was_called_with(&"hello"));
        assert!(!probe.was_called_with(&"world"));
    }

    #[test]
    fn test_records_calling_thread() {
        let probe = CallProbe::new();
        let continuation = probe.continuation();

        let worker = thread::spawn(move || {
            continuation(5);
            thread::current().id()
        })
        .join()
        .unwrap();

        assert_eq!(probe.last_call().unwrap().thread, worker);
    }

    #[test]
    fn test_wait_for_calls_reached() {
        let probe = CallProbe::new();
        let continuation = probe.continuation();

        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            continuation(9);
        });

        assert!(probe.wait_for_calls(1, Duration::from_secs(5)));
        assert_eq!(probe.values(), vec![9]);
    }

    #[test]
    fn test_wait_for_calls_times_out() {
        let probe = CallProbe::<i32>::new();

        assert!(!probe.wait_for_calls(1, Duration::from_millis(10)));
    }

    #[test]
    fn test_wait_for_calls_unbounded_timeout() {
        let recorder = CallProbe::new();
        recorder.record(1);

        assert!(recorder.wait_for_calls(1, Duration::MAX));

        let continuation = recorder.continuation();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            continuation(2);
        });

        assert!(recorder.wait_for_calls(2, Duration::MAX));
        assert_eq!(recorder.values(), vec![1, 2]);
    }

    #[test]
    fn test_probe_reset() {
        let probe = CallProbe::new();

        probe.record(1);
        probe.reset();

        assert_eq!(probe.call_count(), 0);
        assert!(probe.calls().is_empty());
    }

    #[test]
    fn test_probe_debug() {
        let probe = CallProbe::new();
        probe.record(42);

        let debug = format!("{probe:?}");
        assert!(debug.contains("CallProbe"));
        assert!(debug.contains("call_count"));
    }
}
