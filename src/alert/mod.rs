//! Rejection-storm alerting.
//!
//! ## Contents
//! - [`RollingWindowCounter`] approximate count of rejections in the trailing window
//! - [`AlertGate`] threshold + cooldown decision with single-winner election
//! - [`Alert`] the rendered message
//! - [`AlertSink`] / [`AlertDispatcher`] fire-and-forget delivery on a background thread
//! - [`AlertTransport`] / [`WebhookTransport`] the HTTP leg
//!
//! ## Quick wiring
//! ```text
//! RejectionInterceptor ──► AlertGate::consider(total)
//!                              └─► AlertSink::deliver(Alert)
//!                                     └─► AlertDispatcher thread ──► WebhookTransport::send
//! ```

mod config;
mod gate;
mod message;
mod sink;
mod webhook;
mod window;

pub use config::AlertConfig;
pub use gate::AlertGate;
pub use message::{ALERT_TITLE, Alert};
pub use sink::{AlertDispatcher, AlertSink, AlertTransport};
pub use webhook::WebhookTransport;
pub use window::RollingWindowCounter;
