//! Core domain types — pure value types, no I/O, no storage dependency.

use serde::{Deserialize, Serialize};

/// Epoch seconds. Server-stamped wherever the invariants in §3 require it.
pub type EpochSecs = i64;

/// Expectation kind — determines which params variant applies and which
/// evaluator (schedule vs. alert-path) runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectationType {
    Schedule,
    AlertPath,
}

impl ExpectationType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "schedule" => Some(Self::Schedule),
            "alert_path" => Some(Self::AlertPath),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::AlertPath => "alert_path",
        }
    }
}

/// Observation kind. `ack` is accepted over the wire but never drives the
/// evaluator directly — it is recorded as history and its effect (acking a
/// trial) happens through `TrialManager::ack`, not through this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    Start,
    End,
    Ping,
    Ack,
}

impl ObservationKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "start" => Some(Self::Start),
            "end" => Some(Self::End),
            "ping" => Some(Self::Ping),
            "ack" => Some(Self::Ack),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Ping => "ping",
            Self::Ack => "ack",
        }
    }
}

/// Violation code — one of the five enumerated categories (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCode {
    Missed,
    Longrun,
    Overlap,
    Spacing,
    NoAck,
}

impl ViolationCode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "missed" => Some(Self::Missed),
            "longrun" => Some(Self::Longrun),
            "overlap" => Some(Self::Overlap),
            "spacing" => Some(Self::Spacing),
            "no_ack" => Some(Self::NoAck),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missed => "missed",
            Self::Longrun => "longrun",
            Self::Overlap => "overlap",
            Self::Spacing => "spacing",
            Self::NoAck => "no_ack",
        }
    }

    /// The codes a `schedule` expectation's evaluator may ever emit, in
    /// the tie-break order §4.C evaluates them.
    pub fn schedule_codes() -> [Self; 4] {
        [Self::Missed, Self::Longrun, Self::Overlap, Self::Spacing]
    }
}

impl std::fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialStatus {
    Pending,
    Acked,
    Expired,
}

impl TrialStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "acked" => Some(Self::Acked),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Acked => "acked",
            Self::Expired => "expired",
        }
    }
}

/// Schedule-type params. `0` disables the corresponding rule, per §3.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScheduleParams {
    #[serde(default)]
    pub max_runtime_s: i64,
    #[serde(default)]
    pub min_spacing_s: i64,
    #[serde(default)]
    pub allow_overlap: bool,
}

/// Alert-path params.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlertPathParams {
    pub ack_window_s: i64,
    pub test_interval_s: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpectationParams {
    Schedule(ScheduleParams),
    AlertPath(AlertPathParams),
}

impl ExpectationParams {
    pub fn expectation_type(&self) -> ExpectationType {
        match self {
            Self::Schedule(_) => ExpectationType::Schedule,
            Self::AlertPath(_) => ExpectationType::AlertPath,
        }
    }

    pub fn as_schedule(&self) -> Option<&ScheduleParams> {
        match self {
            Self::Schedule(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_alert_path(&self) -> Option<&AlertPathParams> {
        match self {
            Self::AlertPath(p) => Some(p),
            _ => None,
        }
    }
}

/// Immutable identity, mutable enable flag and parameters (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expectation {
    pub id: String,
    pub name: String,
    pub owner_contact: String,
    pub expected_interval_s: i64,
    pub tolerance_s: i64,
    pub params: ExpectationParams,
    pub enabled: bool,
    pub created_at: EpochSecs,
    pub updated_at: EpochSecs,
}

impl Expectation {
    pub fn expectation_type(&self) -> ExpectationType {
        self.params.expectation_type()
    }
}

/// Fields an admin supplies when creating an expectation. `id` is assigned
/// by the Store (capability token, ≥128 bits of entropy — §9).
#[derive(Debug, Clone, Deserialize)]
pub struct NewExpectation {
    pub name: String,
    pub owner_contact: String,
    pub expected_interval_s: i64,
    pub tolerance_s: i64,
    pub params: ExpectationParams,
}

/// Append-only observation row (§3, O1/O2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub seq: i64,
    pub expectation_id: String,
    pub kind: ObservationKind,
    pub observed_at: EpochSecs,
    #[serde(with = "meta_as_base64")]
    pub meta: Vec<u8>,
}

/// Synthetic alert-path probe (§3, T1/T2/T3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertTrial {
    pub id: String,
    pub expectation_id: String,
    pub sent_at: EpochSecs,
    pub acked_at: Option<EpochSecs>,
    pub status: TrialStatus,
}

/// A record asserting, with cited evidence, that an expectation's
/// constraint is currently breached (§3, V1/V2/V3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub id: i64,
    pub expectation_id: String,
    pub code: ViolationCode,
    pub detected_at: EpochSecs,
    pub message: String,
    pub evidence: serde_json::Value,
    pub is_open: bool,
    pub last_notified_at: Option<EpochSecs>,
}

/// Observations are transmitted as 4 KiB-capped opaque bytes (§3); expose
/// them to JSON consumers as base64 rather than lossily coercing to UTF-8.
mod meta_as_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(bytes).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
