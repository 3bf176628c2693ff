//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn()`. The closure is `Fn` rather than `FnOnce`
//! so one handle can be shared between the caller (for removal) and the pool.
//!
//! ## Example
//! ```rust
//! use eagerpool::{TaskFn, TaskRef};
//!
//! let t: TaskRef = TaskFn::arc("hello", || println!("hello"));
//! assert_eq!(t.name(), "hello");
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use crate::tasks::task::Task;

/// Function-backed task implementation.
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> std::fmt::Debug for TaskFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskFn").field("name", &self.name).finish()
    }
}

impl<F> Task for TaskFn<F>
where
    F: Fn() + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self) {
        (self.f)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::task::same_task;
    use crate::TaskRef;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn runs_closure_each_time() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let t: TaskRef = TaskFn::arc("count", move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        t.run();
        t.run();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(t.name(), "count");
    }

    #[test]
    fn identity_follows_the_allocation() {
        let a: TaskRef = TaskFn::arc("a", || {});
        let b: TaskRef = TaskFn::arc("a", || {});
        let a2 = Arc::clone(&a);
        assert!(same_task(&a, &a2));
        assert!(!same_task(&a, &b));
    }
}
