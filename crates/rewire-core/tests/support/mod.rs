//! In-memory `Store`/`NotifierPort` test doubles, used by the property
//! tests to drive the reconciler and trial manager without a real
//! database — the invariants under test (§8) are store-agnostic.

use std::sync::Mutex;

use async_trait::async_trait;
use rewire_core::error::{Result, RewireError};
use rewire_core::ports::{NotifierPort, Store};
use rewire_core::types::*;

#[derive(Default)]
struct Inner {
    expectations: std::collections::HashMap<String, Expectation>,
    observations: std::collections::HashMap<String, Vec<Observation>>,
    next_seq: i64,
    trials: std::collections::HashMap<String, AlertTrial>,
    next_violation_id: i64,
    violations: std::collections::HashMap<String, Vec<Violation>>,
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_expectation(&self, input: NewExpectation, now: EpochSecs) -> Result<Expectation> {
        let mut inner = self.inner.lock().unwrap();
        let id = format!("e{}", inner.expectations.len() + 1);
        let e = Expectation {
            id: id.clone(),
            name: input.name,
            owner_contact: input.owner_contact,
            expected_interval_s: input.expected_interval_s,
            tolerance_s: input.tolerance_s,
            params: input.params,
            enabled: true,
            created_at: now,
            updated_at: now,
        };
        inner.expectations.insert(id, e.clone());
        Ok(e)
    }

    async fn get_expectation(&self, id: &str) -> Result<Expectation> {
        self.inner
            .lock()
            .unwrap()
            .expectations
            .get(id)
            .cloned()
            .ok_or_else(|| RewireError::NotFound(id.to_string()))
    }

    async fn list_enabled(&self) -> Result<Vec<Expectation>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .expectations
            .values()
            .filter(|e| e.enabled)
            .cloned()
            .collect())
    }

    async fn set_enabled(&self, id: &str, enabled: bool, now: EpochSecs) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let e = inner
            .expectations
            .get_mut(id)
            .ok_or_else(|| RewireError::NotFound(id.to_string()))?;
        e.enabled = enabled;
        e.updated_at = now;
        Ok(())
    }

    async fn append_observation(
        &self,
        expectation_id: &str,
        kind: ObservationKind,
        meta: Vec<u8>,
        observed_at: EpochSecs,
    ) -> Result<i64> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_seq += 1;
        let seq = inner.next_seq;
        inner
            .observations
            .entry(expectation_id.to_string())
            .or_default()
            .push(Observation {
                seq,
                expectation_id: expectation_id.to_string(),
                kind,
                observed_at,
                meta,
            });
        Ok(seq)
    }

    async fn recent_observations(&self, expectation_id: &str, limit: i64) -> Result<Vec<Observation>> {
        let inner = self.inner.lock().unwrap();
        let mut v = inner
            .observations
            .get(expectation_id)
            .cloned()
            .unwrap_or_default();
        v.sort_by(|a, b| b.observed_at.cmp(&a.observed_at).then(b.seq.cmp(&a.seq)));
        v.truncate(limit.max(0) as usize);
        Ok(v)
    }

    async fn last_observation_at(
        &self,
        expectation_id: &str,
        kind: Option<ObservationKind>,
    ) -> Result<Option<EpochSecs>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .observations
            .get(expectation_id)
            .into_iter()
            .flatten()
            .filter(|o| kind.map_or(true, |k| o.kind == k))
            .map(|o| o.observed_at)
            .max())
    }

    async fn create_trial(&self, expectation_id: &str, id: &str, sent_at: EpochSecs) -> Result<AlertTrial> {
        let mut inner = self.inner.lock().unwrap();
        let t = AlertTrial {
            id: id.to_string(),
            expectation_id: expectation_id.to_string(),
            sent_at,
            acked_at: None,
            status: TrialStatus::Pending,
        };
        inner.trials.insert(id.to_string(), t.clone());
        Ok(t)
    }

    async fn ack_trial(&self, id: &str, acked_at: EpochSecs) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        match inner.trials.get_mut(id) {
            Some(t) if t.status == TrialStatus::Pending => {
                t.status = TrialStatus::Acked;
                t.acked_at = Some(acked_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn expire_trial(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(t) = inner.trials.get_mut(id) {
            if t.status == TrialStatus::Pending {
                t.status = TrialStatus::Expired;
            }
        }
        Ok(())
    }

    async fn get_trial(&self, id: &str) -> Result<Option<AlertTrial>> {
        Ok(self.inner.lock().unwrap().trials.get(id).cloned())
    }

    async fn latest_trial(&self, expectation_id: &str) -> Result<Option<AlertTrial>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .trials
            .values()
            .filter(|t| t.expectation_id == expectation_id)
            .max_by_key(|t| t.sent_at)
            .cloned())
    }

    async fn open_violation(&self, expectation_id: &str, code: ViolationCode) -> Result<Option<Violation>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .violations
            .get(expectation_id)
            .into_iter()
            .flatten()
            .find(|v| v.code == code && v.is_open)
            .cloned())
    }

    async fn create_violation(
        &self,
        expectation_id: &str,
        code: ViolationCode,
        detected_at: EpochSecs,
        message: String,
        evidence: serde_json::Value,
    ) -> Result<Violation> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_violation_id += 1;
        let v = Violation {
            id: inner.next_violation_id,
            expectation_id: expectation_id.to_string(),
            code,
            detected_at,
            message,
            evidence,
            is_open: true,
            last_notified_at: None,
        };
        inner
            .violations
            .entry(expectation_id.to_string())
            .or_default()
            .push(v.clone());
        Ok(v)
    }

    async fn close_violations(&self, expectation_id: &str, codes: &[ViolationCode]) -> Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        let mut closed = 0u64;
        if let Some(rows) = inner.violations.get_mut(expectation_id) {
            for v in rows.iter_mut() {
                if v.is_open && codes.contains(&v.code) {
                    v.is_open = false;
                    closed += 1;
                }
            }
        }
        Ok(closed)
    }

    async fn mark_notified(&self, violation_id: i64, at: EpochSecs) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        for rows in inner.violations.values_mut() {
            if let Some(v) = rows.iter_mut().find(|v| v.id == violation_id) {
                v.last_notified_at = Some(at);
                break;
            }
        }
        Ok(())
    }
}

/// Swallows every notification — the property tests care about store
/// state, not delivery, and a fallible notifier would make reconciler
/// errors indistinguishable from assertion failures.
pub struct NoopNotifier;

#[async_trait]
impl NotifierPort for NoopNotifier {
    async fn deliver(
        &self,
        _destination: &str,
        _subject: &str,
        _body: &str,
        _structured_payload: serde_json::Value,
    ) -> Result<()> {
        Ok(())
    }
}
