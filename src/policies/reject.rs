//! # Rejection strategies.
//!
//! A [`RejectionStrategy`] decides what happens to a task the pool could not
//! admit. It is always invoked through the pool's rejection interceptor, which
//! settles in-flight accounting from the outcome alone:
//!
//! ```text
//! Ok(())   → the strategy disposed of the task (ran, dropped, requeued)
//!            → interceptor decrements in-flight
//! Err(e)   → the caller sees the failure
//!            → the pool decrements in-flight after its retry
//! ```
//!
//! Built-ins:
//! - [`AbortPolicy`] fails the submission (default).
//! - [`CallerRunsPolicy`] runs the task on the submitting thread.
//! - [`DiscardPolicy`] drops the task silently.
//! - [`DiscardOldestPolicy`] evicts the oldest queued task and queues this one.

use std::sync::Arc;

use tracing::debug;

use crate::core::{PoolSnapshot, Shared};
use crate::error::RejectError;
use crate::queue::Origin;
use crate::tasks::TaskRef;

/// Handler for tasks that could not be admitted.
///
/// ### Implementation requirements
/// - Return `Ok(())` only when the task has been disposed of; the pool stops
///   tracking it.
/// - Queue operations go through [`RejectContext`] so they are attributed to
///   rejection handling.
pub trait RejectionStrategy: Send + Sync + 'static {
    /// Handles one rejected task.
    fn rejected(&self, task: TaskRef, ctx: &RejectContext<'_>) -> Result<(), RejectError>;

    /// Returns the strategy name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// View of the rejecting pool handed to a [`RejectionStrategy`].
///
/// Only exists while a strategy runs. Enqueues made through it are attributed
/// to rejection handling and counted as in flight when accepted.
pub struct RejectContext<'a> {
    pool: &'a Shared,
}

impl<'a> RejectContext<'a> {
    pub(crate) fn new(pool: &'a Shared) -> Self {
        Self { pool }
    }

    /// Name of the rejecting pool.
    pub fn pool_name(&self) -> &str {
        self.pool.name()
    }

    /// Whether the pool stopped admitting work.
    pub fn is_shutdown(&self) -> bool {
        self.pool.is_shutdown()
    }

    /// Current occupancy.
    pub fn snapshot(&self) -> PoolSnapshot {
        self.pool.snapshot()
    }

    /// Removes the oldest queued task without running it.
    pub fn evict_oldest(&self) -> Option<TaskRef> {
        self.pool.queue().dequeue()
    }

    /// Plain bounded offer; the task is tracked as in flight when accepted.
    pub fn requeue(&self, task: TaskRef) -> bool {
        self.pool.queue().enqueue(task, Origin::RejectionHandler)
    }

    /// The error a failing strategy should return for the current state.
    pub fn rejection(&self) -> RejectError {
        let pool = self.pool_name().to_owned();
        if self.is_shutdown() {
            RejectError::Shutdown { pool }
        } else {
            RejectError::Saturated { pool }
        }
    }
}

impl std::fmt::Debug for RejectContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RejectContext")
            .field("pool", &self.pool_name())
            .finish()
    }
}

/// Fails the submission with [`RejectError::Saturated`] or
/// [`RejectError::Shutdown`].
#[derive(Clone, Copy, Debug, Default)]
pub struct AbortPolicy;

impl RejectionStrategy for AbortPolicy {
    fn rejected(&self, _task: TaskRef, ctx: &RejectContext<'_>) -> Result<(), RejectError> {
        Err(ctx.rejection())
    }

    fn name(&self) -> &'static str {
        "abort"
    }
}

/// Runs the task on the submitting thread unless the pool is shut down, in which
/// case the task is dropped.
///
/// A panic raised by the task propagates to the submitter.
#[derive(Clone, Copy, Debug, Default)]
pub struct CallerRunsPolicy;

impl RejectionStrategy for CallerRunsPolicy {
    fn rejected(&self, task: TaskRef, ctx: &RejectContext<'_>) -> Result<(), RejectError> {
        if ctx.is_shutdown() {
            debug!(pool = %ctx.pool_name(), task = task.name(), "pool shut down; dropping task");
            return Ok(());
        }
        task.run();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "caller_runs"
    }
}

/// Drops the task.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardPolicy;

impl RejectionStrategy for DiscardPolicy {
    fn rejected(&self, task: TaskRef, ctx: &RejectContext<'_>) -> Result<(), RejectError> {
        debug!(pool = %ctx.pool_name(), task = task.name(), "discarding rejected task");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "discard"
    }
}

/// Evicts the oldest queued task and queues the rejected one in its place.
///
/// Does nothing once the pool is shut down. If another submitter takes the freed
/// slot first, the rejected task is dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardOldestPolicy;

impl RejectionStrategy for DiscardOldestPolicy {
    fn rejected(&self, task: TaskRef, ctx: &RejectContext<'_>) -> Result<(), RejectError> {
        if ctx.is_shutdown() {
            return Ok(());
        }
        if let Some(evicted) = ctx.evict_oldest() {
            debug!(pool = %ctx.pool_name(), task = evicted.name(), "evicted oldest queued task");
        }
        let name = task.name().to_owned();
        if !ctx.requeue(task) {
            debug!(pool = %ctx.pool_name(), task = %name, "queue refilled; dropping task");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "discard_oldest"
    }
}

/// The default strategy.
pub fn default_strategy() -> Arc<dyn RejectionStrategy> {
    Arc::new(AbortPolicy)
}
