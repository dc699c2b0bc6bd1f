//! Dev notifier — selected when no SMTP host and no webhook URL are
//! configured (§6: "`null`/absent host selects dev print mode").

use async_trait::async_trait;
use rewire_core::error::Result;
use rewire_core::ports::NotifierPort;

#[derive(Debug, Default, Clone, Copy)]
pub struct DevNotifier;

#[async_trait]
impl NotifierPort for DevNotifier {
    async fn deliver(
        &self,
        destination: &str,
        subject: &str,
        body: &str,
        structured_payload: serde_json::Value,
    ) -> Result<()> {
        tracing::info!(
            destination,
            subject,
            payload = %structured_payload,
            "{}",
            body
        );
        Ok(())
    }
}
