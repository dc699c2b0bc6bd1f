//! rewire-notify — `NotifierPort` implementations (§4.G): a dev/stderr
//! sink, an HTTP webhook sink, and an SMTP/STARTTLS sink, each wrapped in
//! a hard per-call deadline.

pub mod dev;
pub mod email;
pub mod timeout;
pub mod webhook;

use std::sync::Arc;
use std::time::Duration;

pub use dev::DevNotifier;
pub use email::{EmailNotifier, SmtpConfig};
use rewire_core::ports::NotifierPort;
pub use timeout::TimeoutNotifier;
pub use webhook::WebhookNotifier;

/// The subset of §6 configuration options that select and parameterize
/// a `NotifierPort`. `smtp_host` absent/null selects dev print mode
/// unless `webhook_url` is set, matching the precedence documented in
/// `DESIGN.md`.
#[derive(Debug, Default, Clone)]
pub struct NotifyConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
    pub smtp_from: Option<String>,
    pub webhook_url: Option<String>,
}

/// Builds the configured notifier, wrapped in a `TimeoutNotifier` bounding
/// every `deliver` call to `deadline` (§5).
pub fn build_notifier(config: &NotifyConfig, deadline: Duration) -> anyhow::Result<Arc<dyn NotifierPort>> {
    if let Some(host) = &config.smtp_host {
        let smtp = EmailNotifier::new(SmtpConfig {
            host: host.clone(),
            port: config.smtp_port,
            user: config.smtp_user.clone(),
            pass: config.smtp_pass.clone(),
            from: config
                .smtp_from
                .clone()
                .unwrap_or_else(|| "rewire@localhost".to_string()),
        })?;
        return Ok(Arc::new(TimeoutNotifier::new(smtp, deadline)));
    }
    if let Some(url) = &config.webhook_url {
        let webhook = WebhookNotifier::new(url.clone());
        return Ok(Arc::new(TimeoutNotifier::new(webhook, deadline)));
    }
    Ok(Arc::new(TimeoutNotifier::new(DevNotifier, deadline)))
}
