//! # Pool configuration.
//!
//! Provides [`Config`], the construction-time settings consumed by
//! [`PoolBuilder`](crate::PoolBuilder).
//!
//! ## Sentinel values
//! - `retry_offer_timeout = 0s` → the retry after a rejection does not wait
//! - blank `name` → `"eager"`
//!
//! Bounds are fixed once the pool is built.

use std::time::Duration;

use crate::alert::AlertConfig;
use crate::error::ConfigError;

const FALLBACK_NAME: &str = "eager";

/// Construction-time configuration of an [`EagerPool`](crate::EagerPool).
///
/// ## Field semantics
/// - `core_size`: workers kept alive while idle (unless core timeout is allowed)
/// - `max_size`: hard cap on workers; the pool grows to it before queueing
/// - `keep_alive`: idle time after which surplus workers exit
/// - `queue_capacity`: bounded FIFO size
/// - `retry_offer_timeout`: how long a rejected submit may wait for queue space
///
/// ## Notes
/// All fields are public. [`Config::validate`] runs in the builder; invalid
/// combinations never reach a live pool.
#[derive(Clone, Debug)]
pub struct Config {
    /// Pool name, used for worker thread names and in logs and alerts.
    pub name: String,

    /// Number of core workers. Must be `> 0`.
    pub core_size: usize,

    /// Maximum number of workers. Must be `>= core_size`.
    pub max_size: usize,

    /// Idle time before a surplus worker exits.
    pub keep_alive: Duration,

    /// Capacity of the admission queue. Must be `> 0`.
    pub queue_capacity: usize,

    /// Bounded wait of the single queue retry after a rejection.
    pub retry_offer_timeout: Duration,

    /// Lets idle core workers exit after `keep_alive` as well.
    pub allow_core_thread_timeout: bool,

    /// Starts all core workers when the pool is built.
    pub prestart_all_core_threads: bool,

    /// Rejection alerting.
    pub alert: AlertConfig,
}

impl Config {
    /// Trimmed pool name, `"eager"` when blank.
    pub fn pool_name(&self) -> String {
        let name = self.name.trim();
        if name.is_empty() {
            FALLBACK_NAME.to_owned()
        } else {
            name.to_owned()
        }
    }

    /// Checks pool bounds.
    ///
    /// Alert settings are checked by the builder, which knows whether a custom
    /// sink replaces the webhook.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.core_size == 0 {
            return Err(ConfigError::CoreSize);
        }
        if self.max_size < self.core_size {
            return Err(ConfigError::MaxSize {
                core: self.core_size,
                max: self.max_size,
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::QueueCapacity);
        }
        if self.allow_core_thread_timeout && self.keep_alive.is_zero() {
            return Err(ConfigError::CoreTimeout);
        }
        Ok(())
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `name = "eager-pool"`
    /// - `core_size = 8`, `max_size = 64`
    /// - `keep_alive = 60s`
    /// - `queue_capacity = 1024`
    /// - `retry_offer_timeout = 0s`
    /// - no core timeout, no prestart, alerts disabled
    fn default() -> Self {
        Self {
            name: "eager-pool".to_owned(),
            core_size: 8,
            max_size: 64,
            keep_alive: Duration::from_secs(60),
            queue_capacity: 1024,
            retry_offer_timeout: Duration::ZERO,
            allow_core_thread_timeout: false,
            prestart_all_core_threads: false,
            alert: AlertConfig::default(),
        }
    }
}
