//! # task-facility
//!
//! > Swappable scheduling for callback-driven code you can actually test
//!
//! **task-facility** separates *what* work runs and how it reports back from
//! *how and when* it runs. Business code submits work through the
//! [`Scheduler`](scheduler::Scheduler) contract; production installs a
//! concurrent scheduler, tests install a synchronous one and get
//! deterministic, inline execution without touching the code under test.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use task_facility::prelude::*;
//!
//! let _guard = registry::install(Arc::new(SynchronousScheduler::new()));
//! let probe = CallProbe::new();
//!
//! run_after_delay(3, probe.continuation());
//!
//! // Ran inline: delivered before `run_after_delay` returned.
//! assert_eq!(probe.values(), vec![3]);
//! ```
//!
//! ## Features
//!
//! - **Scheduler contract** - concurrent, synchronous, and tokio-backed variants
//! - **Registry** - process-wide current scheduler with scoped test guards
//! - **Delayed operations** - callback or [`Completion`](delayed::Completion) delivery
//! - **Log filename validation** - [`LogAnalyzer`](validator::LogAnalyzer)
//! - **Probes** - verify exactly-once continuation delivery

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod delayed;
pub mod error;
pub mod probe;
pub mod registry;
pub mod scheduler;
pub mod validator;

/// Prelude for convenient imports
///
/// ```rust
/// use task_facility::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::FacilityConfig;
    pub use crate::delayed::{run_after_delay, Completion, DelayedOperation};
    pub use crate::error::{Error, Result};
    pub use crate::probe::{CallProbe, ProbeCall};
    pub use crate::registry;
    pub use crate::scheduler::{
        ConcurrentScheduler, FaultLog, Scheduler, SchedulerKind, SynchronousScheduler,
        WorkFault, WorkHandle, WorkId, WorkItem, WorkState,
    };
    #[cfg(feature = "tokio")]
    pub use crate::scheduler::TokioScheduler;
    pub use crate::validator::LogAnalyzer;
}

// Re-exports
pub use error::{Error, Result};

// Re-export the test macro when macros feature is enabled
#[cfg(feature = "macros")]
pub use task_facility_macros::test;
