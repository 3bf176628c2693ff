//! Error types used by the eager pool.
//!
//! This module defines three enums:
//!
//! - [`RejectError`] — a submission could not be accepted (the "rejected" failure).
//! - [`ConfigError`] — the builder refused the configuration.
//! - [`AlertError`] — an alert could not be delivered; never surfaced to callers.
//!
//! All of them provide `as_label` for logs.

use thiserror::Error;

/// # Submission rejected.
///
/// Returned by [`EagerPool::submit`](crate::EagerPool::submit) and by rejection
/// strategies. By the time a caller observes it, the pool has already
/// compensated its in-flight counter.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectError {
    /// Worker and queue capacity are both exhausted.
    #[error("pool {pool:?} rejected task: workers and queue are saturated")]
    Saturated {
        /// Name of the rejecting pool.
        pool: String,
    },

    /// The pool no longer admits work.
    #[error("pool {pool:?} rejected task: pool is shutting down")]
    Shutdown {
        /// Name of the rejecting pool.
        pool: String,
    },

    /// The bounded retry wait was cancelled by the caller.
    ///
    /// The caller's [`CancellationToken`](tokio_util::sync::CancellationToken)
    /// stays cancelled.
    #[error("pool {pool:?} rejected task: retry offer was cancelled")]
    Cancelled {
        /// Name of the rejecting pool.
        pool: String,
    },
}

impl RejectError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use eagerpool::RejectError;
    ///
    /// let err = RejectError::Saturated { pool: "io".into() };
    /// assert_eq!(err.as_label(), "reject_saturated");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RejectError::Saturated { .. } => "reject_saturated",
            RejectError::Shutdown { .. } => "reject_shutdown",
            RejectError::Cancelled { .. } => "reject_cancelled",
        }
    }

    /// Name of the pool that rejected the task.
    pub fn pool(&self) -> &str {
        match self {
            RejectError::Saturated { pool }
            | RejectError::Shutdown { pool }
            | RejectError::Cancelled { pool } => pool,
        }
    }

    /// Whether the rejection came from a cancelled retry wait.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RejectError::Cancelled { .. })
    }
}

/// # Invalid pool configuration.
///
/// Only produced by [`PoolBuilder::build`](crate::PoolBuilder::build); a built pool
/// never reports configuration errors.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `core_size` was zero.
    #[error("core_size must be > 0")]
    CoreSize,

    /// `max_size` was below `core_size`.
    #[error("max_size ({max}) must be >= core_size ({core})")]
    MaxSize {
        /// Configured core size.
        core: usize,
        /// Configured max size.
        max: usize,
    },

    /// `queue_capacity` was zero.
    #[error("queue_capacity must be > 0")]
    QueueCapacity,

    /// Alerts were enabled without a webhook URL.
    #[error("alert webhook_url must not be blank when alerts are enabled")]
    MissingWebhookUrl,

    /// Core workers were allowed to time out with a zero `keep_alive`.
    #[error("allow_core_thread_timeout requires a non-zero keep_alive")]
    CoreTimeout,

    /// The alert delivery pipeline could not be started.
    #[error("alert sink could not be started: {0}")]
    AlertSink(String),

    /// A prestarted core worker could not be spawned.
    #[error("worker thread could not be spawned: {0}")]
    ThreadSpawn(String),
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::CoreSize => "config_core_size",
            ConfigError::MaxSize { .. } => "config_max_size",
            ConfigError::QueueCapacity => "config_queue_capacity",
            ConfigError::MissingWebhookUrl => "config_missing_webhook_url",
            ConfigError::CoreTimeout => "config_core_timeout",
            ConfigError::AlertSink(_) => "config_alert_sink",
            ConfigError::ThreadSpawn(_) => "config_thread_spawn",
        }
    }
}

/// # Alert delivery failure.
///
/// Internal to the alert pipeline: failures are logged and dropped, never retried.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlertError {
    /// The request could not be built or sent.
    #[error("alert transport failed: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("alert endpoint answered with status {0}")]
    Status(u16),
}

impl AlertError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            AlertError::Transport(_) => "alert_transport",
            AlertError::Status(_) => "alert_status",
        }
    }
}
