//! # Webhook transport.
//!
//! Posts alerts as a robot-style text message:
//! ```json
//! {"msgtype":"text","text":{"content":"<title>\n<body>"}}
//! ```
//! with `Content-Type: application/json; charset=utf-8`. Any non-2xx answer is a
//! delivery failure; the response body is ignored.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

use crate::alert::{Alert, AlertTransport};
use crate::error::AlertError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct TextMessage<'a> {
    msgtype: &'static str,
    text: TextContent<'a>,
}

#[derive(Serialize)]
struct TextContent<'a> {
    content: &'a str,
}

/// HTTP `POST` transport for webhook endpoints.
#[derive(Debug, Clone)]
pub struct WebhookTransport {
    client: reqwest::Client,
    url: String,
}

impl WebhookTransport {
    /// Creates a transport posting to `url`.
    pub fn new(url: impl Into<String>) -> Result<Self, AlertError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AlertError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Target endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// JSON body for `alert`.
    pub fn payload(alert: &Alert) -> Result<Vec<u8>, AlertError> {
        let text = alert.text();
        let msg = TextMessage {
            msgtype: "text",
            text: TextContent { content: &text },
        };
        serde_json::to_vec(&msg).map_err(|e| AlertError::Transport(e.to_string()))
    }
}

#[async_trait]
impl AlertTransport for WebhookTransport {
    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        let body = Self::payload(alert)?;
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| AlertError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Status(status.as_u16()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
