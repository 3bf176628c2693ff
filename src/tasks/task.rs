//! # Task abstraction.
//!
//! A [`Task`] is an opaque zero-argument unit of work. The pool shares tasks as
//! [`TaskRef`] (`Arc<dyn Task>`); two handles denote the same task when they point
//! to the same allocation, which is what [`EagerPool::remove`](crate::EagerPool::remove)
//! matches on.

use std::sync::Arc;

/// # Synchronous unit of work.
///
/// `run` executes on a worker thread, or on the submitting thread when a
/// caller-runs strategy handles a rejection. A panic inside `run` is caught by
/// the worker and counted as a completed (faulted) run.
///
/// # Example
/// ```
/// use eagerpool::Task;
///
/// struct Flush;
///
/// impl Task for Flush {
///     fn name(&self) -> &str { "flush" }
///     fn run(&self) {
///         // write buffers...
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Returns a human-readable task name used in logs.
    fn name(&self) -> &str {
        "task"
    }

    /// Executes the task to completion.
    fn run(&self);
}

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// Identity comparison between task handles.
#[inline]
pub(crate) fn same_task(a: &TaskRef, b: &TaskRef) -> bool {
    Arc::ptr_eq(a, b)
}
