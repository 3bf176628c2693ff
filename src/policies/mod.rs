//! Rejection handling.
//!
//! ## Contents
//! - [`RejectionStrategy`] pluggable decision for tasks the pool cannot admit
//! - [`RejectContext`] what a strategy may do with the pool while it runs
//! - [`AbortPolicy`], [`CallerRunsPolicy`], [`DiscardPolicy`], [`DiscardOldestPolicy`]
//!
//! ## Quick wiring
//! ```text
//! EagerPool::submit ──► dispatch ──► RejectionInterceptor::intercept
//!                                        └─► RejectionStrategy::rejected(task, ctx)
//! ```
//!
//! ## Defaults
//! - [`AbortPolicy`], installed by [`PoolBuilder`](crate::PoolBuilder) unless
//!   another strategy is given.

mod interceptor;
mod reject;

pub(crate) use interceptor::RejectionInterceptor;
pub use reject::{
    AbortPolicy, CallerRunsPolicy, DiscardOldestPolicy, DiscardPolicy, RejectContext,
    RejectionStrategy, default_strategy,
};
