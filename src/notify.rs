//! Outbound notification collaborator. Delivery failures are reported to
//! the caller, never retried here, and never roll back state the services
//! already committed.

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::error::{CoreError, CoreResult};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> CoreResult<()>;

    /// SMS delivery is a contract stub: implementations may log and succeed.
    async fn send_sms(&self, phone: &str, message: &str) -> CoreResult<()>;
}

#[derive(Serialize)]
struct EmailPayload<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Relays email through an HTTP webhook (a mail-provider bridge owned by
/// ops); SMS is logged only.
pub struct WebhookNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl WebhookNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> CoreResult<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&EmailPayload { to, subject, body })
            .send()
            .await
            .map_err(|e| CoreError::Upstream(format!("email relay unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(CoreError::Upstream(format!(
                "email relay returned {}",
                response.status()
            )));
        }
        info!(to, subject, "email dispatched");
        Ok(())
    }

    async fn send_sms(&self, phone: &str, _message: &str) -> CoreResult<()> {
        info!(phone, "sms dispatch skipped (no provider configured)");
        Ok(())
    }
}
