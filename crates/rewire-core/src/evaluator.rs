//! RuleEvaluator (§4.C) — the heart of the system. Pure, deterministic,
//! no I/O: a function of `(expectation, observation_history, now)` (plus,
//! for alert paths, the most recent trial regardless of status and the
//! last-observation time — see DESIGN.md's Open Question entry on why
//! this works off the latest trial rather than spec.md's literal
//! `pending_trials` set).
//!
//! Isolating this from I/O is what makes property testing exhaustive and
//! reproducible (§8) — any feature that needs external data during
//! evaluation must be added by enriching the input tuple, never by
//! letting the evaluator call out (§9).

use serde_json::json;

use crate::types::{
    AlertPathParams, AlertTrial, Expectation, Observation, ObservationKind, ScheduleParams,
    TrialStatus, ViolationCode,
};

/// Verdict for a `schedule` expectation: disjoint open/close code sets,
/// each code appearing in at most one of the two (never both — §4.C
/// tie-break rule).
#[derive(Debug, Default, Clone)]
pub struct ScheduleVerdict {
    pub to_open: Vec<(ViolationCode, serde_json::Value)>,
    pub to_close: Vec<ViolationCode>,
}

/// Verdict for an `alert_path` expectation.
#[derive(Debug, Default, Clone)]
pub struct AlertPathVerdict {
    pub to_open: Vec<(ViolationCode, serde_json::Value)>,
    pub to_close: Vec<ViolationCode>,
    pub should_issue_trial: bool,
    pub trials_to_expire: Vec<String>,
}

/// `history` must be newest-first (as returned by `Store::recent_observations`).
fn most_recent_of(history: &[Observation], kind: ObservationKind) -> Option<&Observation> {
    history.iter().find(|o| o.kind == kind)
}

fn nth_most_recent_of(history: &[Observation], kind: ObservationKind, n: usize) -> Option<&Observation> {
    history.iter().filter(|o| o.kind == kind).nth(n)
}

/// Evaluate the schedule rules: missed, longrun, overlap, spacing, applied
/// independently and in that order (§4.C).
pub fn evaluate_schedule(
    params: &ScheduleParams,
    expected_interval_s: i64,
    tolerance_s: i64,
    history: &[Observation],
    now: i64,
) -> ScheduleVerdict {
    let mut verdict = ScheduleVerdict::default();

    let s = most_recent_of(history, ObservationKind::Start);
    let s2 = nth_most_recent_of(history, ObservationKind::Start, 1);

    // E: most recent `end` with observed_at >= S.observed_at.
    // E_prev: most recent `end` with observed_at < S.observed_at.
    let e = s.and_then(|s| {
        most_recent_of(history, ObservationKind::End).filter(|e| e.observed_at >= s.observed_at)
    });
    let e_prev = match s {
        Some(s) => history
            .iter()
            .find(|o| o.kind == ObservationKind::End && o.observed_at < s.observed_at),
        None => most_recent_of(history, ObservationKind::End),
    };

    // missed
    if let Some(s) = s {
        let age = now - s.observed_at;
        let threshold = expected_interval_s + tolerance_s;
        if age > threshold {
            verdict.to_open.push((
                ViolationCode::Missed,
                json!({
                    "last_start_at": s.observed_at,
                    "age_s": age,
                    "expected_s": expected_interval_s,
                    "tolerance_s": tolerance_s,
                }),
            ));
        } else {
            verdict.to_close.push(ViolationCode::Missed);
        }
    }
    // else: no S at all — no opinion, per §4.C.

    let running = s.is_some() && e.is_none();

    // longrun — only when max_runtime_s > 0.
    if params.max_runtime_s > 0 {
        if running {
            let s = s.unwrap();
            let running_for_s = now - s.observed_at;
            if running_for_s > params.max_runtime_s {
                verdict.to_open.push((
                    ViolationCode::Longrun,
                    json!({
                        "start_at": s.observed_at,
                        "running_for_s": running_for_s,
                        "max_runtime_s": params.max_runtime_s,
                    }),
                ));
            } else {
                verdict.to_close.push(ViolationCode::Longrun);
            }
        } else {
            verdict.to_close.push(ViolationCode::Longrun);
        }
    }

    // overlap — only when allow_overlap == false.
    if !params.allow_overlap {
        if running {
            let s = s.unwrap();
            let overlapped = match (s2, e_prev) {
                (Some(s2), Some(e_prev)) => {
                    s2.observed_at >= e_prev.observed_at && s2.observed_at < s.observed_at
                }
                (Some(s2), None) => s2.observed_at < s.observed_at,
                (None, _) => false,
            };
            if overlapped {
                let s2 = s2.unwrap();
                verdict.to_open.push((
                    ViolationCode::Overlap,
                    json!({
                        "newest_start_at": s.observed_at,
                        "other_start_at": s2.observed_at,
                    }),
                ));
            } else {
                verdict.to_close.push(ViolationCode::Overlap);
            }
        } else {
            verdict.to_close.push(ViolationCode::Overlap);
        }
    }

    // spacing — only when min_spacing_s > 0 and a run has completed (E exists).
    if params.min_spacing_s > 0 {
        if let (Some(s), Some(e_prev)) = (s.filter(|_| e.is_some()), e_prev) {
            let gap_s = s.observed_at - e_prev.observed_at;
            if gap_s < params.min_spacing_s {
                verdict.to_open.push((
                    ViolationCode::Spacing,
                    json!({
                        "gap_s": gap_s,
                        "min_spacing_s": params.min_spacing_s,
                        "prev_end_at": e_prev.observed_at,
                        "start_at": s.observed_at,
                    }),
                ));
            } else {
                verdict.to_close.push(ViolationCode::Spacing);
            }
        } else if e.is_some() {
            // Completed run but no prior end to compare against — nothing to space.
            verdict.to_close.push(ViolationCode::Spacing);
        }
        // else: no completed run this tick — no opinion.
    }

    verdict
}

/// Evaluate the alert-path rules (§4.C). `last_observation_at` is the most
/// recent observation of *any* kind, per the "ping resets the timer"
/// resolution of the Open Question in §9. `latest_trial` is the most
/// recent trial issued for this expectation regardless of status — an
/// expired-and-unacked trial must keep `no_ack` open on every subsequent
/// tick even after it stops being `pending`, until a later trial is acked.
pub fn evaluate_alert_path(
    params: &AlertPathParams,
    tolerance_s: i64,
    last_observation_at: Option<i64>,
    latest_trial: Option<&AlertTrial>,
    now: i64,
) -> AlertPathVerdict {
    let should_issue_trial = match last_observation_at {
        None => true,
        Some(at) => now - at >= params.test_interval_s,
    };

    let mut verdict = AlertPathVerdict {
        should_issue_trial,
        ..Default::default()
    };

    let expiry_threshold = params.ack_window_s + tolerance_s;

    match latest_trial {
        None => verdict.to_close.push(ViolationCode::NoAck),
        Some(t) => match t.status {
            TrialStatus::Acked => verdict.to_close.push(ViolationCode::NoAck),
            TrialStatus::Expired => {
                verdict.to_open.push((
                    ViolationCode::NoAck,
                    json!({
                        "trial_id": t.id,
                        "sent_at": t.sent_at,
                        "age_s": now - t.sent_at,
                    }),
                ));
            }
            TrialStatus::Pending => {
                let age_s = now - t.sent_at;
                if age_s > expiry_threshold {
                    verdict.trials_to_expire.push(t.id.clone());
                    verdict.to_open.push((
                        ViolationCode::NoAck,
                        json!({
                            "trial_id": t.id,
                            "sent_at": t.sent_at,
                            "age_s": age_s,
                        }),
                    ));
                } else {
                    verdict.to_close.push(ViolationCode::NoAck);
                }
            }
        },
    }

    verdict
}

/// Convenience: evaluate whichever evaluator applies to `expectation`'s type.
/// Alert-path evaluation additionally needs `latest_trial` and
/// `last_observation_at`, which the schedule path ignores.
pub fn evaluate(
    expectation: &Expectation,
    history: &[Observation],
    latest_trial: Option<&AlertTrial>,
    last_observation_at: Option<i64>,
    now: i64,
) -> EvaluatorOutcome {
    match &expectation.params {
        crate::types::ExpectationParams::Schedule(p) => EvaluatorOutcome::Schedule(evaluate_schedule(
            p,
            expectation.expected_interval_s,
            expectation.tolerance_s,
            history,
            now,
        )),
        crate::types::ExpectationParams::AlertPath(p) => {
            EvaluatorOutcome::AlertPath(evaluate_alert_path(
                p,
                expectation.tolerance_s,
                last_observation_at,
                latest_trial,
                now,
            ))
        }
    }
}

#[derive(Debug, Clone)]
pub enum EvaluatorOutcome {
    Schedule(ScheduleVerdict),
    AlertPath(AlertPathVerdict),
}
