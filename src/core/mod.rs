//! Pool core: configuration, construction and worker lifecycle.
//!
//! The public API from this module is [`EagerPool`], built by [`PoolBuilder`]
//! from a [`Config`].
//!
//! Internal modules:
//! - [`pool`]: the handle, submission and its bounded retry, shutdown;
//! - [`worker`]: dispatch, worker threads, keep-alive and termination;
//! - [`factory`]: how worker threads are created;
//! - [`builder`]: validation and wiring of collaborators.

mod builder;
mod config;
mod factory;
mod pool;
mod snapshot;
mod worker;

pub use builder::PoolBuilder;
pub use config::Config;
pub use factory::{NamedThreadFactory, ThreadFactory, WorkerBody};
pub use pool::{EagerPool, Lifecycle};
pub(crate) use pool::Shared;
pub use snapshot::PoolSnapshot;
