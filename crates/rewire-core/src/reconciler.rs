//! Reconciler (§4.E) — diffs an evaluator verdict against the currently
//! open violations for an expectation and applies the minimal set of
//! store writes and notifications to bring them in sync.

use crate::error::Result;
use crate::evaluator::{AlertPathVerdict, ScheduleVerdict};
use crate::ports::{NotifierPort, Store};
use crate::types::{EpochSecs, Expectation, Violation, ViolationCode};

pub struct Reconciler<'a, S: Store + ?Sized, N: NotifierPort + ?Sized> {
    store: &'a S,
    notifier: &'a N,
    renotify_after_s: i64,
}

impl<'a, S: Store + ?Sized, N: NotifierPort + ?Sized> Reconciler<'a, S, N> {
    pub fn new(store: &'a S, notifier: &'a N, renotify_after_s: i64) -> Self {
        Self {
            store,
            notifier,
            renotify_after_s,
        }
    }

    pub async fn reconcile_schedule(
        &self,
        expectation: &Expectation,
        verdict: ScheduleVerdict,
        now: EpochSecs,
    ) -> Result<()> {
        if !verdict.to_close.is_empty() {
            self.store
                .close_violations(&expectation.id, &verdict.to_close)
                .await?;
        }
        for (code, evidence) in verdict.to_open {
            self.open_or_renotify(expectation, code, evidence, now).await?;
        }
        Ok(())
    }

    pub async fn reconcile_alert_path(
        &self,
        expectation: &Expectation,
        verdict: AlertPathVerdict,
        now: EpochSecs,
    ) -> Result<()> {
        if !verdict.to_close.is_empty() {
            self.store
                .close_violations(&expectation.id, &verdict.to_close)
                .await?;
        }
        for (code, evidence) in verdict.to_open {
            self.open_or_renotify(expectation, code, evidence, now).await?;
        }
        Ok(())
    }

    /// Opens a new violation, or — if one is already open for this code —
    /// renotifies once `renotify_after_s` has elapsed since the last
    /// notification, resending the *original* evidence rather than the
    /// freshly evaluated one (§4.E: a renotify restates the standing
    /// breach, it doesn't redescribe it).
    ///
    /// A notifier failure is logged and swallowed here, not propagated —
    /// one code's delivery failing must never abort the remaining codes in
    /// the same verdict's `to_open` set, mirroring the dispatcher's
    /// per-event log-and-continue rather than aborting the whole pass.
    async fn open_or_renotify(
        &self,
        expectation: &Expectation,
        code: ViolationCode,
        evidence: serde_json::Value,
        now: EpochSecs,
    ) -> Result<()> {
        match self.store.open_violation(&expectation.id, code).await? {
            Some(existing) => {
                let should_renotify = match existing.last_notified_at {
                    None => true,
                    Some(at) => now - at >= self.renotify_after_s,
                };
                if should_renotify && self.notify(expectation, &existing).await {
                    self.store.mark_notified(existing.id, now).await?;
                }
            }
            None => {
                let message = format!("{} violation for {}", code, expectation.name);
                let violation = self
                    .store
                    .create_violation(&expectation.id, code, now, message, evidence)
                    .await?;
                if self.notify(expectation, &violation).await {
                    self.store.mark_notified(violation.id, now).await?;
                }
            }
        }
        Ok(())
    }

    /// Returns `true` iff delivery succeeded. Failures are logged here so
    /// the caller can decide not to `mark_notified` — and not re-thrown,
    /// so a single failing destination can't wedge the rest of the
    /// reconciliation for this expectation.
    async fn notify(&self, expectation: &Expectation, violation: &Violation) -> bool {
        if let Err(e) = self.deliver(expectation, violation).await {
            tracing::error!(
                expectation_id = %expectation.id,
                code = %violation.code,
                "notifier failed: {e}"
            );
            return false;
        }
        true
    }

    async fn deliver(&self, expectation: &Expectation, violation: &Violation) -> Result<()> {
        let subject = format!(
            "[rewire] VIOLATION {}: {}",
            violation.code, expectation.name
        );
        let body = format!(
            "{}\n\nexpectation: {} ({})\ndetected_at: {}\nevidence: {}",
            violation.message,
            expectation.name,
            expectation.id,
            violation.detected_at,
            violation.evidence
        );
        let payload = serde_json::json!({
            "expectation_id": expectation.id,
            "expectation_name": expectation.name,
            "violation_id": violation.id,
            "code": violation.code,
            "detected_at": violation.detected_at,
            "evidence": violation.evidence,
        });
        self.notifier
            .deliver(&expectation.owner_contact, &subject, &body, payload)
            .await
    }
}
