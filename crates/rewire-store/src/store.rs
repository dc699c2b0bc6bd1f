//! SQLite-backed implementation of all four `Store` entities (§4.B).

use anyhow::anyhow;
use async_trait::async_trait;
use rand::RngCore;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use rewire_core::error::{RewireError, Result};
use rewire_core::ports::Store;
use rewire_core::types::*;

use crate::schema;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if absent) the SQLite file at `db_path`, enables
    /// WAL mode for non-blocking readers (§4.B "write-ahead journal"),
    /// and applies the schema.
    pub async fn connect(db_path: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.apply_schema().await?;
        Ok(store)
    }

    async fn apply_schema(&self) -> anyhow::Result<()> {
        for stmt in schema::STATEMENTS {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// 128 bits of entropy, hex-encoded — the capability-token sizing
    /// `spec.md` §9 requires for expectation and trial ids.
    fn new_capability_id() -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    fn row_to_expectation(row: ExpectationRow) -> Result<Expectation> {
        let params: ExpectationParams = serde_json::from_str(&row.params_json)
            .map_err(|e| RewireError::ParamParse(e.to_string()))?;
        Ok(Expectation {
            id: row.id,
            name: row.name,
            owner_contact: row.owner_contact,
            expected_interval_s: row.expected_interval_s,
            tolerance_s: row.tolerance_s,
            params,
            enabled: row.enabled != 0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    fn row_to_observation(row: ObservationRow) -> Result<Observation> {
        let kind = ObservationKind::parse(&row.kind)
            .ok_or_else(|| RewireError::Evaluator(format!("bad observation kind: {}", row.kind)))?;
        Ok(Observation {
            seq: row.seq,
            expectation_id: row.expectation_id,
            kind,
            observed_at: row.observed_at,
            meta: row.meta,
        })
    }

    fn row_to_trial(row: TrialRow) -> Result<AlertTrial> {
        let status = TrialStatus::parse(&row.status)
            .ok_or_else(|| RewireError::Evaluator(format!("bad trial status: {}", row.status)))?;
        Ok(AlertTrial {
            id: row.id,
            expectation_id: row.expectation_id,
            sent_at: row.sent_at,
            acked_at: row.acked_at,
            status,
        })
    }

    fn row_to_violation(row: ViolationRow) -> Result<Violation> {
        let code = ViolationCode::parse(&row.code)
            .ok_or_else(|| RewireError::Evaluator(format!("bad violation code: {}", row.code)))?;
        let evidence: serde_json::Value = serde_json::from_str(&row.evidence)
            .map_err(|e| RewireError::Evaluator(format!("bad evidence json: {e}")))?;
        Ok(Violation {
            id: row.id,
            expectation_id: row.expectation_id,
            code,
            detected_at: row.detected_at,
            message: row.message,
            evidence,
            is_open: row.is_open != 0,
            last_notified_at: row.last_notified_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ExpectationRow {
    id: String,
    name: String,
    owner_contact: String,
    expected_interval_s: i64,
    tolerance_s: i64,
    params_json: String,
    enabled: i64,
    created_at: i64,
    updated_at: i64,
}

#[derive(sqlx::FromRow)]
struct ObservationRow {
    seq: i64,
    expectation_id: String,
    kind: String,
    observed_at: i64,
    meta: Vec<u8>,
}

#[derive(sqlx::FromRow)]
struct TrialRow {
    id: String,
    expectation_id: String,
    sent_at: i64,
    acked_at: Option<i64>,
    status: String,
}

#[derive(sqlx::FromRow)]
struct ViolationRow {
    id: i64,
    expectation_id: String,
    code: String,
    detected_at: i64,
    message: String,
    evidence: String,
    is_open: i64,
    last_notified_at: Option<i64>,
}

const EXPECTATION_COLUMNS: &str = "id, name, owner_contact, expected_interval_s, tolerance_s, \
    params_json, enabled, created_at, updated_at";
const OBSERVATION_COLUMNS: &str = "seq, expectation_id, kind, observed_at, meta";
const TRIAL_COLUMNS: &str = "id, expectation_id, sent_at, acked_at, status";
const VIOLATION_COLUMNS: &str = "id, expectation_id, code, detected_at, message, evidence, \
    is_open, last_notified_at";

#[async_trait]
impl Store for SqliteStore {
    async fn create_expectation(&self, input: NewExpectation, now: EpochSecs) -> Result<Expectation> {
        let id = Self::new_capability_id();
        let params_json = serde_json::to_string(&input.params)
            .map_err(|e| RewireError::Validation(format!("params serialization: {e}")))?;
        sqlx::query(&format!(
            "INSERT INTO expectations ({EXPECTATION_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&id)
        .bind(&input.name)
        .bind(&input.owner_contact)
        .bind(input.expected_interval_s)
        .bind(input.tolerance_s)
        .bind(&params_json)
        .bind(1i64)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        self.get_expectation(&id).await
    }

    async fn get_expectation(&self, id: &str) -> Result<Expectation> {
        let row = sqlx::query_as::<_, ExpectationRow>(&format!(
            "SELECT {EXPECTATION_COLUMNS} FROM expectations WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?
        .ok_or_else(|| RewireError::NotFound(format!("expectation {id}")))?;

        Self::row_to_expectation(row)
    }

    async fn list_enabled(&self) -> Result<Vec<Expectation>> {
        let rows = sqlx::query_as::<_, ExpectationRow>(&format!(
            "SELECT {EXPECTATION_COLUMNS} FROM expectations WHERE enabled = 1"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        rows.into_iter().map(Self::row_to_expectation).collect()
    }

    async fn set_enabled(&self, id: &str, enabled: bool, now: EpochSecs) -> Result<()> {
        let result = sqlx::query(
            "UPDATE expectations SET enabled = ?, updated_at = ? WHERE id = ?",
        )
        .bind(enabled as i64)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        if result.rows_affected() == 0 {
            return Err(RewireError::NotFound(format!("expectation {id}")));
        }
        Ok(())
    }

    async fn append_observation(
        &self,
        expectation_id: &str,
        kind: ObservationKind,
        meta: Vec<u8>,
        observed_at: EpochSecs,
    ) -> Result<i64> {
        if meta.len() > 4096 {
            return Err(RewireError::Validation("meta exceeds 4 KiB".into()));
        }
        let result = sqlx::query(
            "INSERT INTO observations (expectation_id, kind, observed_at, meta) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(expectation_id)
        .bind(kind.as_str())
        .bind(observed_at)
        .bind(&meta)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(result.last_insert_rowid())
    }

    async fn recent_observations(&self, expectation_id: &str, limit: i64) -> Result<Vec<Observation>> {
        let rows = sqlx::query_as::<_, ObservationRow>(&format!(
            "SELECT {OBSERVATION_COLUMNS} FROM observations \
             WHERE expectation_id = ? ORDER BY observed_at DESC, seq DESC LIMIT ?"
        ))
        .bind(expectation_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        rows.into_iter().map(Self::row_to_observation).collect()
    }

    async fn last_observation_at(
        &self,
        expectation_id: &str,
        kind: Option<ObservationKind>,
    ) -> Result<Option<EpochSecs>> {
        let at = match kind {
            Some(k) => sqlx::query_scalar::<_, i64>(
                "SELECT observed_at FROM observations WHERE expectation_id = ? AND kind = ? \
                 ORDER BY observed_at DESC, seq DESC LIMIT 1",
            )
            .bind(expectation_id)
            .bind(k.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?,
            None => sqlx::query_scalar::<_, i64>(
                "SELECT observed_at FROM observations WHERE expectation_id = ? \
                 ORDER BY observed_at DESC, seq DESC LIMIT 1",
            )
            .bind(expectation_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?,
        };
        Ok(at)
    }

    async fn create_trial(&self, expectation_id: &str, id: &str, sent_at: EpochSecs) -> Result<AlertTrial> {
        sqlx::query(&format!(
            "INSERT INTO alert_trials ({TRIAL_COLUMNS}) VALUES (?, ?, ?, NULL, 'pending')"
        ))
        .bind(id)
        .bind(expectation_id)
        .bind(sent_at)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(AlertTrial {
            id: id.to_string(),
            expectation_id: expectation_id.to_string(),
            sent_at,
            acked_at: None,
            status: TrialStatus::Pending,
        })
    }

    async fn ack_trial(&self, id: &str, acked_at: EpochSecs) -> Result<bool> {
        // Compare-and-swap: the WHERE guard is what makes this atomic
        // under SQLite's single-writer model (§4.D, T3) — at most one
        // concurrent ack observes rows_affected() == 1.
        let result = sqlx::query(
            "UPDATE alert_trials SET status = 'acked', acked_at = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(acked_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn expire_trial(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE alert_trials SET status = 'expired' WHERE id = ? AND status = 'pending'")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn get_trial(&self, id: &str) -> Result<Option<AlertTrial>> {
        let row = sqlx::query_as::<_, TrialRow>(&format!(
            "SELECT {TRIAL_COLUMNS} FROM alert_trials WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        row.map(Self::row_to_trial).transpose()
    }

    async fn latest_trial(&self, expectation_id: &str) -> Result<Option<AlertTrial>> {
        let row = sqlx::query_as::<_, TrialRow>(&format!(
            "SELECT {TRIAL_COLUMNS} FROM alert_trials \
             WHERE expectation_id = ? ORDER BY sent_at DESC LIMIT 1"
        ))
        .bind(expectation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        row.map(Self::row_to_trial).transpose()
    }

    async fn open_violation(&self, expectation_id: &str, code: ViolationCode) -> Result<Option<Violation>> {
        let row = sqlx::query_as::<_, ViolationRow>(&format!(
            "SELECT {VIOLATION_COLUMNS} FROM violations \
             WHERE expectation_id = ? AND code = ? AND is_open = 1 LIMIT 1"
        ))
        .bind(expectation_id)
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        row.map(Self::row_to_violation).transpose()
    }

    async fn create_violation(
        &self,
        expectation_id: &str,
        code: ViolationCode,
        detected_at: EpochSecs,
        message: String,
        evidence: serde_json::Value,
    ) -> Result<Violation> {
        let evidence_json = evidence.to_string();
        let id = sqlx::query(
            "INSERT INTO violations \
             (expectation_id, code, detected_at, message, evidence, is_open, last_notified_at) \
             VALUES (?, ?, ?, ?, ?, 1, NULL)",
        )
        .bind(expectation_id)
        .bind(code.as_str())
        .bind(detected_at)
        .bind(&message)
        .bind(&evidence_json)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?
        .last_insert_rowid();

        Ok(Violation {
            id,
            expectation_id: expectation_id.to_string(),
            code,
            detected_at,
            message,
            evidence,
            is_open: true,
            last_notified_at: None,
        })
    }

    async fn close_violations(&self, expectation_id: &str, codes: &[ViolationCode]) -> Result<u64> {
        if codes.is_empty() {
            return Ok(0);
        }
        let placeholders = codes.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "UPDATE violations SET is_open = 0 \
             WHERE expectation_id = ? AND is_open = 1 AND code IN ({placeholders})"
        );
        let mut query = sqlx::query(&sql).bind(expectation_id);
        for code in codes {
            query = query.bind(code.as_str());
        }
        let result = query.execute(&self.pool).await.map_err(|e| anyhow!(e))?;
        Ok(result.rows_affected())
    }

    async fn mark_notified(&self, violation_id: i64, at: EpochSecs) -> Result<()> {
        sqlx::query("UPDATE violations SET last_notified_at = ? WHERE id = ?")
            .bind(at)
            .bind(violation_id)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(())
    }
}
