//! Webhook notifier — HTTP POST of the JSON payload from §6 ("Notifier
//! payloads") to a configured URL.

use async_trait::async_trait;

use rewire_core::error::{RewireError, Result};
use rewire_core::ports::NotifierPort;

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl NotifierPort for WebhookNotifier {
    async fn deliver(
        &self,
        _destination: &str,
        _subject: &str,
        _body: &str,
        structured_payload: serde_json::Value,
    ) -> Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .json(&structured_payload)
            .send()
            .await
            .map_err(|e| RewireError::Notifier(format!("webhook request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(RewireError::Notifier(format!(
                "webhook returned status {}",
                resp.status()
            )));
        }
        Ok(())
    }
}
