//! Email notifier — SMTP with STARTTLS via `lettre`'s async/tokio
//! transport. Subject for violation mail is exactly
//! `[rewire] VIOLATION {code}: {name}` (§6); that string is built by the
//! caller (the reconciler) and passed through unchanged.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use rewire_core::error::{RewireError, Result};
use rewire_core::ports::NotifierPort;

pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub from: String,
}

impl EmailNotifier {
    pub fn new(config: SmtpConfig) -> anyhow::Result<Self> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?.port(config.port);
        if let (Some(user), Some(pass)) = (&config.user, &config.pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self {
            transport: builder.build(),
            from: config.from.parse()?,
        })
    }
}

#[async_trait]
impl NotifierPort for EmailNotifier {
    async fn deliver(
        &self,
        destination: &str,
        subject: &str,
        body: &str,
        _structured_payload: serde_json::Value,
    ) -> Result<()> {
        let to: Mailbox = destination
            .parse()
            .map_err(|e| RewireError::Notifier(format!("bad destination address: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| RewireError::Notifier(format!("message build failed: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| RewireError::Notifier(format!("smtp send failed: {e}")))?;
        Ok(())
    }
}
