//! External notification sinks

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::error::NotifyError;

/// Delivers a fully formatted message to an external channel
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Longest response body kept on a rejected delivery
const MAX_ERROR_BODY: usize = 512;

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// Slack-compatible incoming webhook: POSTs `{"text": ...}`
pub struct WebhookSink {
    url: String,
    http: Client,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let url = url.into();
        debug!(?timeout, "WebhookSink::new: called");
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { url, http })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        debug!(len = text.len(), "WebhookSink::send: called");
        let response = self.http.post(&self.url).json(&WebhookPayload { text }).send().await?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "WebhookSink::send: delivered");
            return Ok(());
        }

        let body = truncate_body(response.text().await.unwrap_or_default());
        debug!(%status, %body, "WebhookSink::send: rejected");
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Cut `body` to at most `MAX_ERROR_BODY` bytes on a char boundary
fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}
