//! # Alert message.
//!
//! Example text for a pool named `orders`:
//! ```text
//! thread pool rejection alert
//! pool=orders
//! rejected(last60s)=214, threshold=200
//! rejected(total)=5120
//! core=8, max=64, poolSize=64, active=64
//! queueSize=1024
//! inFlight=1088
//! completed=99120
//! ```

use std::fmt::Write as _;

use crate::alert::AlertConfig;
use crate::core::PoolSnapshot;

/// Title carried by every rejection alert.
pub const ALERT_TITLE: &str = "thread pool rejection alert";

const TRUNCATION_MARKER: &str = "\n...truncated...";

/// A rendered alert, ready for delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    /// Pool that raised the alert.
    pub pool: String,
    /// Short headline.
    pub title: String,
    /// Multi-line details, already truncated.
    pub body: String,
}

impl Alert {
    /// Full text as delivered: `"<title>\n<body>"`.
    pub fn text(&self) -> String {
        format!("{}\n{}", self.title, self.body)
    }
}

/// Renders the alert body and truncates it to `cfg.max_message_chars` characters.
pub(crate) fn render(
    pool: &str,
    in_window: u64,
    total: u64,
    cfg: &AlertConfig,
    snapshot: &PoolSnapshot,
) -> Alert {
    let mut body = String::with_capacity(256);
    let _ = writeln!(body, "pool={pool}");
    let _ = writeln!(
        body,
        "rejected(last{}s)={in_window}, threshold={}",
        cfg.window_secs, cfg.threshold_per_window
    );
    let _ = writeln!(body, "rejected(total)={total}");
    let _ = writeln!(
        body,
        "core={}, max={}, poolSize={}, active={}",
        snapshot.core, snapshot.max, snapshot.pool_size, snapshot.active
    );
    let _ = writeln!(body, "queueSize={}", snapshot.queued);
    let _ = writeln!(body, "inFlight={}", snapshot.in_flight);
    let _ = writeln!(body, "completed={}", snapshot.completed);

    Alert {
        pool: pool.to_owned(),
        title: ALERT_TITLE.to_owned(),
        body: truncate(body, cfg.max_message_chars),
    }
}

fn truncate(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text,
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + TRUNCATION_MARKER.len());
            out.push_str(&text[..cut]);
            out.push_str(TRUNCATION_MARKER);
            out
        }
    }
}
