//! # Alert configuration.
//!
//! [`AlertConfig`] controls the rejection-storm alert: when a window of rejections
//! crosses `threshold_per_window`, at most one alert per `cooldown` is posted to
//! `webhook_url`.
//!
//! ## Normalization
//! [`AlertConfig::normalized`] is applied by the builder:
//! - `threshold_per_window` is at least 1;
//! - `max_message_chars` is at least 200;
//! - `window_secs`/`bucket_secs` of 0 fall back to 60/5, and a window that the
//!   bucket does not divide evenly falls back to 60/5 as a pair;
//! - `webhook_url` is trimmed.

use std::time::Duration;

use tracing::warn;

const DEFAULT_WINDOW_SECS: u64 = 60;
const DEFAULT_BUCKET_SECS: u64 = 5;
const MIN_MESSAGE_CHARS: usize = 200;

/// Settings for the rejection alert gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertConfig {
    /// Master switch; can be flipped at runtime via
    /// [`EagerPool::set_alert_enabled`](crate::EagerPool::set_alert_enabled).
    pub enabled: bool,

    /// Endpoint receiving the JSON alert (`POST`). Required when `enabled`.
    pub webhook_url: String,

    /// Rejections within the window that trigger an alert.
    pub threshold_per_window: u64,

    /// Minimum time between two alerts.
    pub cooldown: Duration,

    /// Width of the sliding window.
    pub window_secs: u64,

    /// Width of one ring-buffer bucket; must divide `window_secs`.
    pub bucket_secs: u64,

    /// Alert text longer than this is cut and marked as truncated.
    pub max_message_chars: usize,
}

impl AlertConfig {
    /// Returns a copy with every field brought into its valid range.
    pub fn normalized(&self) -> Self {
        let mut window = if self.window_secs == 0 {
            DEFAULT_WINDOW_SECS
        } else {
            self.window_secs
        };
        let mut bucket = if self.bucket_secs == 0 {
            DEFAULT_BUCKET_SECS
        } else {
            self.bucket_secs
        };
        if window % bucket != 0 {
            warn!(
                window_secs = window,
                bucket_secs = bucket,
                "alert window is not a multiple of the bucket; using 60s/5s"
            );
            window = DEFAULT_WINDOW_SECS;
            bucket = DEFAULT_BUCKET_SECS;
        }

        Self {
            enabled: self.enabled,
            webhook_url: self.webhook_url.trim().to_owned(),
            threshold_per_window: self.threshold_per_window.max(1),
            cooldown: self.cooldown,
            window_secs: window,
            bucket_secs: bucket,
            max_message_chars: self.max_message_chars.max(MIN_MESSAGE_CHARS),
        }
    }

    /// Whether a non-blank webhook URL is configured.
    #[inline]
    pub fn has_webhook(&self) -> bool {
        !self.webhook_url.trim().is_empty()
    }

    /// Cooldown in whole milliseconds, saturating.
    #[inline]
    pub(crate) fn cooldown_ms(&self) -> u64 {
        u64::try_from(self.cooldown.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for AlertConfig {
    /// Default configuration:
    ///
    /// - disabled, no webhook
    /// - `threshold_per_window = 200`
    /// - `cooldown = 60s`
    /// - `window_secs = 60`, `bucket_secs = 5` (12 buckets)
    /// - `max_message_chars = 1800`
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: String::new(),
            threshold_per_window: 200,
            cooldown: Duration::from_secs(60),
            window_secs: DEFAULT_WINDOW_SECS,
            bucket_secs: DEFAULT_BUCKET_SECS,
            max_message_chars: 1800,
        }
    }
}
