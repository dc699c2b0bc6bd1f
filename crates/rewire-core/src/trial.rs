//! TrialManager (§4.D) — issues and tracks synthetic alert-path probes.
//! A trial is identified by a capability token, not a sequential id,
//! since its id is handed to the owner inside the outbound notification.

use rand::RngCore;

use crate::error::Result;
use crate::ports::Store;
use crate::types::{AlertTrial, EpochSecs};

/// 128 bits of entropy, hex-encoded — same sizing rationale as expectation
/// ids (§9): large enough that guessing one to forge an ack is infeasible.
fn new_trial_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub struct TrialManager<'a, S: Store + ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> TrialManager<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Creates a new pending trial for `expectation_id`. The caller
    /// (CheckerLoop) is responsible for appending the `ping` observation
    /// that carries the ack URL (it needs the id this call assigns) and
    /// for dispatching the notification — trial creation and delivery
    /// are separate steps so a notifier failure never leaves a trial
    /// un-persisted.
    pub async fn issue(&self, expectation_id: &str, now: EpochSecs) -> Result<AlertTrial> {
        let id = new_trial_id();
        self.store.create_trial(expectation_id, &id, now).await
    }

    /// Acks a trial. Returns `true` iff this call transitioned it from
    /// `pending` — a second ack, or an ack of an already-expired trial, is
    /// a no-op returning `false` (T2/T3).
    pub async fn ack(&self, trial_id: &str, now: EpochSecs) -> Result<bool> {
        self.store.ack_trial(trial_id, now).await
    }

    /// Marks a trial `expired`. Idempotent: expiring an already-`acked` or
    /// already-`expired` trial is a no-op at the Store layer.
    pub async fn expire(&self, trial_id: &str) -> Result<()> {
        self.store.expire_trial(trial_id).await
    }
}
