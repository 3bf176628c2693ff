//! # eagerpool
//!
//! **eagerpool** is a bounded worker pool that prefers spawning a worker over
//! queueing a task.
//!
//! A classic executor queues first and only grows once the queue is full. An
//! eager pool inverts that: while it is below its maximum size, a task that finds
//! no idle worker gets a new one. The queue only absorbs work once the pool is
//! fully grown. On top of that the pool keeps an exact count of in-flight tasks,
//! lets any rejection strategy plug in without breaking that count, and raises a
//! rate-limited alert when rejections pile up.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   caller ──► EagerPool::submit(task)            in_flight += 1
//!                  │
//!                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  dispatch                                                         │
//! │   1. workers < core            ──► new worker                     │
//! │   2. AdmissionQueue::enqueue   ──► queued  (idle worker present)  │
//! │        └─ "grow" signal        ──► step 3                          │
//! │   3. workers < max             ──► new worker                     │
//! │   4. RejectionInterceptor      ──► RejectionStrategy              │
//! └──────┬───────────────────────────────────────┬────────────────────┘
//!        │ strategy refused                      │ rejected_total += 1
//!        ▼                                       ▼
//!  bounded retry offer                     AlertGate::consider
//!   ├─ queued ──► Ok                          └─ threshold + cooldown + CAS
//!   └─ failed ──► in_flight -= 1, Err               └─► AlertDispatcher thread
//!                                                          └─► webhook POST
//!
//!  worker: run task ──► in_flight -= 1 ──► take next from AdmissionQueue
//! ```
//!
//! ### In-flight accounting
//! ```text
//! +1  submit (before admission)
//! +1  strategy requeues through RejectContext (accepted)
//! -1  task ran (panicked or not)
//! -1  strategy returned Ok (task ran inline, dropped or replaced)
//! -1  submit failed after the retry
//! -n  dequeue / remove / drain / clear on the queue
//! ```
//! Once nothing is running, queued or being submitted, the count is zero.
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                         |
//! |-------------------|----------------------------------------------------------|--------------------------------------------|
//! | **Pool**          | Eager growth, bounded queue, keep-alive, shutdown.       | [`EagerPool`], [`PoolBuilder`], [`Config`] |
//! | **Admission**     | Queue whose enqueue is an admission decision.            | [`AdmissionQueue`]                         |
//! | **Accounting**    | Saturating lock-free in-flight counter.                  | [`InFlightCounter`], [`PoolSnapshot`]      |
//! | **Rejection**     | Pluggable strategies with uniform compensation.          | [`RejectionStrategy`], [`RejectContext`]   |
//! | **Alerting**      | Sliding-window threshold with cooldown, webhook sender.  | [`AlertGate`], [`AlertSink`]               |
//! | **Errors**        | Typed errors for rejection, configuration and alerts.    | [`RejectError`], [`ConfigError`]           |
//! | **Tasks**         | Tasks as trait objects or closures.                      | [`Task`], [`TaskFn`], [`TaskRef`]          |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use eagerpool::{Config, PoolBuilder, TaskFn};
//!
//! let cfg = Config {
//!     name: "io".into(),
//!     core_size: 2,
//!     max_size: 4,
//!     queue_capacity: 16,
//!     ..Config::default()
//! };
//! let pool = PoolBuilder::new(cfg).build()?;
//!
//! pool.submit(TaskFn::arc("hello", || println!("hello from a worker")))?;
//!
//! pool.shutdown();
//! assert!(pool.await_termination(Duration::from_secs(5)));
//! assert_eq!(pool.in_flight_count(), 0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod alert;
mod core;
mod error;
mod gauge;
pub mod policies;
mod queue;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{
    Config, EagerPool, Lifecycle, NamedThreadFactory, PoolBuilder, PoolSnapshot, ThreadFactory,
    WorkerBody,
};
pub use alert::{
    Alert, AlertConfig, AlertDispatcher, AlertGate, AlertSink, AlertTransport,
    RollingWindowCounter, WebhookTransport,
};
pub use error::{AlertError, ConfigError, RejectError};
pub use gauge::InFlightCounter;
pub use policies::{RejectContext, RejectionStrategy};
pub use queue::AdmissionQueue;
pub use tasks::{Task, TaskFn, TaskRef};
