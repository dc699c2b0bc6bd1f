//! Wraps any `NotifierPort` with a hard per-call deadline (§5: "a deliver
//! call must have a total deadline ≤ check_every_s/2 so a stuck SMTP
//! server cannot starve the loop"). A timeout is just another
//! `NotifierError` — the reconciler already treats those uniformly
//! (logged, `last_notified_at` left unchanged, retried next tick).

use std::time::Duration;

use async_trait::async_trait;

use rewire_core::error::{RewireError, Result};
use rewire_core::ports::NotifierPort;

pub struct TimeoutNotifier<N> {
    inner: N,
    deadline: Duration,
}

impl<N: NotifierPort> TimeoutNotifier<N> {
    pub fn new(inner: N, deadline: Duration) -> Self {
        Self { inner, deadline }
    }
}

#[async_trait]
impl<N: NotifierPort> NotifierPort for TimeoutNotifier<N> {
    async fn deliver(
        &self,
        destination: &str,
        subject: &str,
        body: &str,
        structured_payload: serde_json::Value,
    ) -> Result<()> {
        match tokio::time::timeout(
            self.deadline,
            self.inner.deliver(destination, subject, body, structured_payload),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(RewireError::Notifier(format!(
                "delivery exceeded deadline of {:?}",
                self.deadline
            ))),
        }
    }
}
