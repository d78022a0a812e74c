//! Process-wide "current scheduler" slot.
//!
//! The registry is the composition-root default for code that does not get a
//! scheduler injected. Reading it never fails: while nothing is installed,
//! [`current`] yields the shared default [`ConcurrentScheduler`].
//!
//! [`set`] and [`reset`] are last-write-wins and meant for serialized test
//! setup and teardown. Tests that swap the scheduler should prefer
//! [`install`], which serializes against other installers and puts the
//! previous scheduler back when its guard drops, even while unwinding.
//! Guards nest on one thread: the outermost starts from an unset slot, and
//! each inner guard restores whatever its enclosing scope had installed.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use task_facility::registry;
//! use task_facility::scheduler::{SchedulerKind, SynchronousScheduler};
//!
//! {
//!     let _guard = registry::install(Arc::new(SynchronousScheduler::new()));
//!     assert_eq!(registry::current().kind(), SchedulerKind::Synchronous);
//! }
//!
//! assert!(!registry::is_overridden());
//! ```

use std::cell::Cell;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::{const_reentrant_mutex, const_rwlock, ReentrantMutex, ReentrantMutexGuard, RwLock};
use tracing::debug;

use crate::scheduler::{ConcurrentScheduler, FaultLog, Scheduler};

static CURRENT: RwLock<Option<Arc<dyn Scheduler>>> = const_rwlock(None);
// Holds the guard nesting depth of the owning thread.
static ISOLATION: ReentrantMutex<Cell<usize>> = const_reentrant_mutex(Cell::new(0));
static DEFAULT: OnceLock<Arc<ConcurrentScheduler>> = OnceLock::new();

fn default_concurrent() -> &'static Arc<ConcurrentScheduler> {
    DEFAULT.get_or_init(|| Arc::new(ConcurrentScheduler::new()))
}

/// The scheduler used while nothing is installed.
#[must_use]
pub fn default_scheduler() -> Arc<dyn Scheduler> {
    Arc::clone(default_concurrent()) as Arc<dyn Scheduler>
}

/// Panics caught by the default scheduler.
///
/// The default scheduler lives for the whole process and so does this log:
/// it keeps every fault until [`FaultLog::take`] or [`FaultLog::clear`]
/// drains it. Long-running processes that let items panic on the default
/// scheduler should drain it periodically.
#[must_use]
pub fn default_faults() -> FaultLog {
    default_concurrent().faults().clone()
}

/// Returns the installed scheduler, or the default when none is installed.
#[must_use]
pub fn current() -> Arc<dyn Scheduler> {
    match &*CURRENT.read() {
        Some(scheduler) => Arc::clone(scheduler),
        None => default_scheduler(),
    }
}

/// Installs `scheduler` as current for the whole process.
pub fn set(scheduler: Arc<dyn Scheduler>) {
    debug!(scheduler = %scheduler.kind(), "installing scheduler");
    *CURRENT.write() = Some(scheduler);
}

/// Returns the registry to its unset state.
pub fn reset() {
    if CURRENT.write().take().is_some() {
        debug!("scheduler registry reset to default");
    }
}

/// Returns true while a scheduler is installed.
#[must_use]
pub fn is_overridden() -> bool {
    CURRENT.read().is_some()
}

/// Takes exclusive use of the registry until the guard drops.
///
/// Other threads calling `isolate`/`install` block until this guard is gone;
/// the owning thread may nest guards. The outermost guard starts from an
/// unset slot. A nested guard keeps the enclosing scope's scheduler, and
/// every guard restores the scheduler that was current when it was taken.
pub fn isolate() -> RegistryGuard {
    let lock = ISOLATION.lock();
    let depth = lock.get();
    if depth == 0 {
        reset();
    }
    lock.set(depth + 1);
    let previous = CURRENT.read().clone();
    RegistryGuard { previous, lock }
}

/// Installs `scheduler` under an exclusive [`RegistryGuard`].
pub fn install(scheduler: Arc<dyn Scheduler>) -> RegistryGuard {
    let guard = isolate();
    guard.install(scheduler);
    guard
}

/// Exclusive hold on the registry; restores the previous scheduler on drop.
#[must_use = "the previous scheduler is restored as soon as the guard is dropped"]
pub struct RegistryGuard {
    previous: Option<Arc<dyn Scheduler>>,
    lock: ReentrantMutexGuard<'static, Cell<usize>>,
}

impl RegistryGuard {
    /// Installs `scheduler` while the guard is held.
    pub fn install(&self, scheduler: Arc<dyn Scheduler>) {
        set(scheduler);
    }
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        // Runs before `lock` is released.
        let previous = self.previous.take();
        match &previous {
            Some(scheduler) => debug!(scheduler = %scheduler.kind(), "restoring scheduler"),
            None => debug!("scheduler registry restored to default"),
        }
        *CURRENT.write() = previous;
        self.lock.set(self.lock.get() - 1);
    }
}

impl fmt::Debug for RegistryGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryGuard")
            .field("current", &current().kind())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{SchedulerKind, SynchronousScheduler};
    use std::panic::{self, AssertUnwindSafe};

    fn same(a: &Arc<dyn Scheduler>, b: &Arc<dyn Scheduler>) -> bool {
        std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
    }

    #[test]
    fn test_unset_reads_as_concurrent_default() {
        let _guard = isolate();

        assert!(!is_overridden());
        let scheduler = current();
        assert_eq!(scheduler.kind(), SchedulerKind::Concurrent);
        assert!(same(&scheduler, &default_scheduler()));
    }

    #[test]
    fn test_set_is_visible_and_reset_restores_default() {
        let _guard = isolate();
        let sync: Arc<dyn Scheduler> = Arc::new(SynchronousScheduler::new());

        set(Arc::clone(&sync));
        assert!(is_overridden());
        assert!(same(&current(), &sync));

        reset();
        assert!(!is_overridden());
        assert!(same(&current(), &default_scheduler()));
    }

    #[test]
    fn test_last_write_wins() {
        let _guard = isolate();
        let first: Arc<dyn Scheduler> = Arc::new(SynchronousScheduler::new());
        let second: Arc<dyn Scheduler> = Arc::new(ConcurrentScheduler::new());

        set(first);
        set(Arc::clone(&second));

        assert!(same(&current(), &second));
    }

    #[test]
    fn test_reset_when_unset_is_noop() {
        let _guard = isolate();

        reset();
        reset();
        assert_eq!(current().kind(), SchedulerKind::Concurrent);
    }

    #[test]
    fn test_guard_resets_on_drop() {
        let _outer = isolate();
        {
            let _guard = install(Arc::new(SynchronousScheduler::new()));
            assert_eq!(current().kind(), SchedulerKind::Synchronous);
        }

        assert!(!is_overridden());
    }

    #[test]
    fn test_guard_resets_while_unwinding() {
        let _outer = isolate();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = install(Arc::new(SynchronousScheduler::new()));
            panic!("test body failed");
        }));
        assert!(result.is_err());

        assert!(!is_overridden());
    }

    #[test]
    fn test_guard_restores_unset_slot() {
        let _outer = isolate();
        assert!(!is_overridden());

        let inner = isolate();
        set(Arc::new(SynchronousScheduler::new()));
        drop(inner);

        assert!(!is_overridden());
    }

    #[test]
    fn test_nested_install_restores_enclosing_scheduler() {
        let sync: Arc<dyn Scheduler> = Arc::new(SynchronousScheduler::new());
        let _outer = install(Arc::clone(&sync));
        {
            let _inner = install(Arc::new(ConcurrentScheduler::new()));
            assert_eq!(current().kind(), SchedulerKind::Concurrent);
        }

        assert!(is_overridden());
        assert_eq!(current().kind(), SchedulerKind::Synchronous);
        assert!(same(&current(), &sync));
    }

    #[test]
    fn test_nested_isolate_keeps_enclosing_scheduler() {
        let sync: Arc<dyn Scheduler> = Arc::new(SynchronousScheduler::new());
        let _outer = install(Arc::clone(&sync));

        let inner = isolate();
        assert!(same(&current(), &sync));
        set(Arc::new(ConcurrentScheduler::new()));
        drop(inner);

        assert!(same(&current(), &sync));
    }

    #[test]
    fn test_nested_guard_restores_while_unwinding() {
        let _outer = install(Arc::new(SynchronousScheduler::new()));
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _inner = install(Arc::new(ConcurrentScheduler::new()));
            panic!("inner scope failed");
        }));
        assert!(result.is_err());

        assert_eq!(current().kind(), SchedulerKind::Synchronous);
    }

    #[test]
    fn test_default_faults_retained_until_drained() {
        let handle = default_scheduler()
            .submit(Box::new(|| panic!("default worker failed")))
            .unwrap();
        assert!(handle.wait(std::time::Duration::from_secs(5)).is_err());

        let drained = default_faults().take();
        assert!(drained
            .iter()
            .any(|fault| fault.id == handle.id && fault.message == "default worker failed"));
        assert!(default_faults()
            .faults()
            .iter()
            .all(|fault| fault.id != handle.id));
    }

    #[test]
    fn test_guard_debug_names_current_kind() {
        let guard = install(Arc::new(SynchronousScheduler::new()));

        let debug = format!("{guard:?}");
        assert!(debug.contains("RegistryGuard"));
        assert!(debug.contains("Synchronous"));
    }
}
