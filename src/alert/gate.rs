//! # Alert gate: threshold, cooldown and single-winner election.
//!
//! ```text
//! consider(total)
//!   ├─ disabled or no sink                       ──► no-op
//!   ├─ window.increment()
//!   ├─ window.sum() < threshold                  ──► no-op
//!   ├─ now - last_fired < cooldown, now <= last  ──► no-op
//!   ├─ CAS(last_fired: observed → now) lost      ──► no-op
//!   └─ winner: render alert ──► sink.deliver()
//! ```
//!
//! Only the thread that wins the compare-and-swap builds and dispatches the
//! alert, so racing rejecters crossing the same threshold produce at most one
//! alert per cooldown. Two alerts never share a millisecond timestamp.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::alert::{AlertConfig, AlertSink, RollingWindowCounter, message};
use crate::core::PoolSnapshot;

/// Rate-gated trigger for rejection alerts.
pub struct AlertGate {
    pool: String,
    enabled: AtomicBool,
    last_fired_ms: AtomicU64,
    config: AlertConfig,
    window: RollingWindowCounter,
    sink: Option<Arc<dyn AlertSink>>,
}

impl AlertGate {
    /// Creates a gate. `config` is normalized here.
    pub fn new(pool: &str, config: &AlertConfig, sink: Option<Arc<dyn AlertSink>>) -> Self {
        let config = config.normalized();
        Self {
            pool: pool.to_owned(),
            enabled: AtomicBool::new(config.enabled),
            last_fired_ms: AtomicU64::new(0),
            window: RollingWindowCounter::new(config.window_secs, config.bucket_secs),
            config,
            sink,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, on: bool) {
        self.enabled.store(on, Ordering::Release);
    }

    /// Effective (normalized) configuration.
    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Rejections counted in the trailing window.
    pub fn rejected_in_window(&self) -> u64 {
        self.window.sum_last_window()
    }

    /// Records one rejection and fires an alert when the gate opens.
    ///
    /// `snapshot` is only evaluated by the winning thread. Returns whether this
    /// call dispatched an alert.
    pub fn consider<F>(&self, total_rejected: u64, snapshot: F) -> bool
    where
        F: FnOnce() -> PoolSnapshot,
    {
        self.consider_at(now_ms(), total_rejected, snapshot)
    }

    pub(crate) fn consider_at<F>(&self, now_ms: u64, total_rejected: u64, snapshot: F) -> bool
    where
        F: FnOnce() -> PoolSnapshot,
    {
        let Some(sink) = self.sink.as_ref() else {
            return false;
        };
        if !self.is_enabled() {
            return false;
        }

        let now_secs = now_ms / 1000;
        self.window.increment_at(now_secs);
        let in_window = self.window.sum_at(now_secs);
        if in_window < self.config.threshold_per_window {
            return false;
        }

        let last = self.last_fired_ms.load(Ordering::Acquire);
        if now_ms <= last || now_ms - last < self.config.cooldown_ms() {
            return false;
        }
        if self
            .last_fired_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let alert = message::render(
            &self.pool,
            in_window,
            total_rejected,
            &self.config,
            &snapshot(),
        );
        warn!(
            pool = %self.pool,
            rejected_in_window = in_window,
            rejected_total = total_rejected,
            threshold = self.config.threshold_per_window,
            "rejection threshold crossed; dispatching alert"
        );
        sink.deliver(alert);
        true
    }

    /// Closes the sink; no further alerts are delivered.
    pub(crate) fn close(&self) {
        if let Some(sink) = self.sink.as_ref() {
            sink.close();
        }
    }
}

impl std::fmt::Debug for AlertGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertGate")
            .field("pool", &self.pool)
            .field("enabled", &self.is_enabled())
            .field("last_fired_ms", &self.last_fired_ms.load(Ordering::Relaxed))
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
