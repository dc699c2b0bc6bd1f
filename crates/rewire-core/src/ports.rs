//! Storage and notification port traits — implemented by `rewire-store`
//! and `rewire-notify` respectively. Core logic (evaluator, reconciler,
//! trial manager, checker loop) depends only on these traits.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::*;

#[async_trait]
pub trait Store: Send + Sync {
    async fn create_expectation(&self, input: NewExpectation, now: EpochSecs) -> Result<Expectation>;
    async fn get_expectation(&self, id: &str) -> Result<Expectation>;
    async fn list_enabled(&self) -> Result<Vec<Expectation>>;
    async fn set_enabled(&self, id: &str, enabled: bool, now: EpochSecs) -> Result<()>;

    /// Stamps `observed_at` from the Store's own clock source atomically —
    /// never client-supplied (§3, O2).
    async fn append_observation(
        &self,
        expectation_id: &str,
        kind: ObservationKind,
        meta: Vec<u8>,
        observed_at: EpochSecs,
    ) -> Result<i64>;

    /// Newest-first, capped at `limit`.
    async fn recent_observations(&self, expectation_id: &str, limit: i64) -> Result<Vec<Observation>>;

    /// Most recent `observed_at` for `kind`, or across all kinds if `None`
    /// ("last observation of any kind" — §9 Open Questions).
    async fn last_observation_at(
        &self,
        expectation_id: &str,
        kind: Option<ObservationKind>,
    ) -> Result<Option<EpochSecs>>;

    async fn create_trial(&self, expectation_id: &str, id: &str, sent_at: EpochSecs) -> Result<AlertTrial>;

    /// Returns `true` iff the prior status was `pending` (§4.D).
    async fn ack_trial(&self, id: &str, acked_at: EpochSecs) -> Result<bool>;

    async fn expire_trial(&self, id: &str) -> Result<()>;
    async fn get_trial(&self, id: &str) -> Result<Option<AlertTrial>>;

    /// Most recent trial for the expectation by `sent_at`, in any status —
    /// not just `pending` (see DESIGN.md's Open Question entry on why the
    /// evaluator works off this instead of the literal `pending_trials` set
    /// spec.md describes). Drives `no_ack`: an expired-but-unacked trial
    /// keeps the violation open across ticks even once it is no longer
    /// `pending` (§4.C).
    async fn latest_trial(&self, expectation_id: &str) -> Result<Option<AlertTrial>>;

    /// Currently open violation for `(expectation_id, code)`, if any (V1).
    async fn open_violation(&self, expectation_id: &str, code: ViolationCode) -> Result<Option<Violation>>;

    async fn create_violation(
        &self,
        expectation_id: &str,
        code: ViolationCode,
        detected_at: EpochSecs,
        message: String,
        evidence: serde_json::Value,
    ) -> Result<Violation>;

    /// Closes every currently-open row matching any of `codes`. Idempotent:
    /// closing an already-closed or never-opened code is a no-op.
    async fn close_violations(&self, expectation_id: &str, codes: &[ViolationCode]) -> Result<u64>;

    async fn mark_notified(&self, violation_id: i64, at: EpochSecs) -> Result<()>;
}

#[async_trait]
pub trait NotifierPort: Send + Sync {
    async fn deliver(
        &self,
        destination: &str,
        subject: &str,
        body: &str,
        structured_payload: serde_json::Value,
    ) -> Result<()>;
}
