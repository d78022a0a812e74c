//! Integration tests for the `#[task_facility::test]` macro.

#![cfg(feature = "macros")]

use std::time::Duration;

use task_facility::prelude::*;

/// Default variant is synchronous.
#[task_facility::test]
fn installs_synchronous_by_default() {
    assert_eq!(registry::current().kind(), SchedulerKind::Synchronous);

    let probe = CallProbe::new();
    DelayedOperation::from_registry()
        .with_delay(Duration::from_millis(5))
        .run_after_delay(7, probe.continuation());
    assert_eq!(probe.values(), vec![7]);
}

/// The injected scheduler is the installed one.
#[task_facility::test]
fn injects_synchronous_scheduler(scheduler: SynchronousScheduler) {
    let probe = CallProbe::new();
    run_after_delay(3, probe.continuation());

    assert_eq!(probe.values(), vec![3]);
    assert_eq!(scheduler.executed(), 1);
}

/// Concurrent variant via option.
#[task_facility::test(scheduler = "concurrent")]
fn installs_concurrent_on_request() {
    assert_eq!(registry::current().kind(), SchedulerKind::Concurrent);
    assert!(registry::is_overridden());

    let probe = CallProbe::new();
    let handle = DelayedOperation::from_registry()
        .with_delay(Duration::from_millis(5))
        .run_after_delay(9, probe.continuation());

    assert!(handle.is_some());
    assert!(probe.wait_for_calls(1, Duration::from_secs(5)));
}

/// Injected concurrent scheduler exposes its fault log.
#[task_facility::test]
fn injects_concurrent_scheduler(scheduler: ConcurrentScheduler) {
    let handle = DelayedOperation::from_registry()
        .with_delay(Duration::ZERO)
        .run_after_delay(1, |_| panic!("bad value"))
        .expect("concurrent handle");

    assert!(handle.wait(Duration::from_secs(5)).is_err());
    assert_eq!(scheduler.faults().len(), 1);
}

/// Result-returning tests keep their signature.
#[task_facility::test]
fn supports_result_return() -> task_facility::Result<()> {
    let mut analyzer = LogAnalyzer::new();
    assert!(analyzer.is_valid_log_file_name(Some("trace.slf"))?);
    Ok(())
}
