//! CheckerLoop (§4.F) — the background task that ticks every
//! `check_every_s`, evaluates every enabled expectation, and reconciles
//! the result. Modeled on a claim-and-process dispatcher loop: one
//! expectation's failure is logged and skipped, never allowed to take
//! down the loop or stall the rest of the tick.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::evaluator::{evaluate_alert_path, evaluate_schedule};
use crate::ports::{NotifierPort, Store};
use crate::reconciler::Reconciler;
use crate::trial::TrialManager;
use crate::types::{Expectation, ExpectationParams};

pub struct CheckerLoop<S: Store + ?Sized, N: NotifierPort + ?Sized, C: Clock + ?Sized> {
    store: Arc<S>,
    notifier: Arc<N>,
    clock: Arc<C>,
    check_every_s: u64,
    renotify_after_s: i64,
    base_url: String,
}

impl<S: Store + ?Sized, N: NotifierPort + ?Sized, C: Clock + ?Sized> CheckerLoop<S, N, C> {
    pub fn new(
        store: Arc<S>,
        notifier: Arc<N>,
        clock: Arc<C>,
        check_every_s: u64,
        renotify_after_s: i64,
        base_url: String,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            check_every_s,
            renotify_after_s,
            base_url,
        }
    }

    /// Runs until `shutdown` is cancelled. Spawn via `tokio::spawn`.
    ///
    /// Cancellation is only raced against the idle sleep between ticks,
    /// never against a tick itself (§4.F, §5): once a tick starts, it
    /// finishes the expectation it's currently reconciling before the next
    /// `shutdown.is_cancelled()` check, so a shutdown can never land
    /// mid-reconciliation.
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!(check_every_s = self.check_every_s, "CheckerLoop started");
        loop {
            self.tick_all(&shutdown).await;
            if shutdown.is_cancelled() {
                tracing::info!("CheckerLoop shutting down");
                return;
            }
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("CheckerLoop shutting down");
                    return;
                }
                _ = tokio::time::sleep(Duration::from_secs(self.check_every_s)) => {}
            }
        }
    }

    async fn tick_all(&self, shutdown: &CancellationToken) {
        let expectations = match self.store.list_enabled().await {
            Ok(list) => list,
            Err(e) => {
                tracing::error!("CheckerLoop: failed to list enabled expectations: {e}");
                return;
            }
        };
        for expectation in expectations {
            // Checked between expectations, not during one: the current
            // expectation always finishes its tick before we act on a
            // cancellation that arrived while it was in flight.
            if shutdown.is_cancelled() {
                return;
            }
            let id = expectation.id.clone();
            if let Err(e) = self.tick_one(&expectation).await {
                tracing::error!("CheckerLoop: tick failed for expectation {id}: {e}");
            }
        }
    }

    async fn tick_one(&self, expectation: &Expectation) -> crate::error::Result<()> {
        let now = self.clock.now();
        let reconciler = Reconciler::new(&*self.store, &*self.notifier, self.renotify_after_s);

        match &expectation.params {
            ExpectationParams::Schedule(params) => {
                let history = self
                    .store
                    .recent_observations(&expectation.id, 16)
                    .await?;
                let verdict = evaluate_schedule(
                    params,
                    expectation.expected_interval_s,
                    expectation.tolerance_s,
                    &history,
                    now,
                );
                reconciler.reconcile_schedule(expectation, verdict, now).await
            }
            ExpectationParams::AlertPath(params) => {
                let last_observation_at = self.store.last_observation_at(&expectation.id, None).await?;
                let latest_trial = self.store.latest_trial(&expectation.id).await?;
                let verdict = evaluate_alert_path(
                    params,
                    expectation.tolerance_s,
                    last_observation_at,
                    latest_trial.as_ref(),
                    now,
                );

                for trial_id in &verdict.trials_to_expire {
                    let trials = TrialManager::new(&*self.store);
                    trials.expire(trial_id).await?;
                }

                let should_issue = verdict.should_issue_trial;
                reconciler.reconcile_alert_path(expectation, verdict, now).await?;

                if should_issue {
                    self.issue_trial(expectation, now).await?;
                }
                Ok(())
            }
        }
    }

    async fn issue_trial(&self, expectation: &Expectation, now: i64) -> crate::error::Result<()> {
        let trials = TrialManager::new(&*self.store);
        let trial = trials.issue(&expectation.id, now).await?;
        let ack_url = format!("{}/ack/{}", self.base_url.trim_end_matches('/'), trial.id);
        // The ping itself is recorded as history, per §4.D, carrying the ack
        // URL the owner was sent — this is what "last observation of any
        // kind" picks up and what resets the alert-path timer on delivery.
        self.store
            .append_observation(
                &expectation.id,
                crate::types::ObservationKind::Ping,
                ack_url.as_bytes().to_vec(),
                now,
            )
            .await?;
        let subject = format!("[rewire] alert-path check: {}", expectation.name);
        let body = format!(
            "This is a synthetic alert-path probe for \"{}\". Acknowledge within the \
             configured ack window by visiting:\n\n{}",
            expectation.name, ack_url
        );
        let payload = serde_json::json!({
            "expectation_id": expectation.id,
            "expectation_name": expectation.name,
            "trial_id": trial.id,
            "ack_url": ack_url,
            "sent_at": trial.sent_at,
        });
        self.notifier
            .deliver(&expectation.owner_contact, &subject, &body, payload)
            .await
    }
}
