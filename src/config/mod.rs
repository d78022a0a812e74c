//! Facility configuration.
//!
//! [`FacilityConfig`] collects the knobs shared by the concurrent schedulers
//! and [`DelayedOperation`](crate::delayed::DelayedOperation).
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use task_facility::config::FacilityConfig;
//!
//! let config = FacilityConfig::new()
//!     .delay(Duration::from_millis(20))
//!     .thread_name_prefix("ingest-worker");
//!
//! assert_eq!(config.delay, Duration::from_millis(20));
//! ```

use std::time::Duration;

/// Simulated duration of the delayed operation unless configured otherwise.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Name prefix of threads spawned by the concurrent scheduler.
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "task-facility-worker";

/// Configuration for schedulers and delayed operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityConfig {
    /// How long a delayed operation blocks before completing.
    pub delay: Duration,
    /// Prefix for worker thread names; the work id is appended.
    pub thread_name_prefix: String,
}

impl FacilityConfig {
    /// Create a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the simulated delay.
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }
}

impl Default for FacilityConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }
}
