//! # Task abstractions.
//!
//! - [`Task`] - trait for a synchronous unit of work
//! - [`TaskFn`] - closure-backed task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)

mod task;
mod task_fn;

pub(crate) use task::same_task;
pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
