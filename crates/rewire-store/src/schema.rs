//! DDL for the four logical tables (§3) plus the three indices §6 calls
//! out as required for correctness. Applied as a sequence of individual
//! statements — SQLite's driver (unlike Postgres) does not accept
//! multi-statement strings through the `sqlx::query` bind API.

pub const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS expectations (
        id                  TEXT PRIMARY KEY,
        name                TEXT NOT NULL,
        owner_contact       TEXT NOT NULL,
        expected_interval_s INTEGER NOT NULL,
        tolerance_s         INTEGER NOT NULL,
        params_json         TEXT NOT NULL,
        enabled             INTEGER NOT NULL,
        created_at          INTEGER NOT NULL,
        updated_at          INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS observations (
        seq             INTEGER PRIMARY KEY AUTOINCREMENT,
        expectation_id  TEXT NOT NULL REFERENCES expectations(id),
        kind            TEXT NOT NULL,
        observed_at     INTEGER NOT NULL,
        meta            BLOB NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_observations_expectation_observed
        ON observations (expectation_id, observed_at DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS alert_trials (
        id              TEXT PRIMARY KEY,
        expectation_id  TEXT NOT NULL REFERENCES expectations(id),
        sent_at         INTEGER NOT NULL,
        acked_at        INTEGER,
        status          TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_trials_expectation_status
        ON alert_trials (expectation_id, status)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS violations (
        id                  INTEGER PRIMARY KEY AUTOINCREMENT,
        expectation_id      TEXT NOT NULL REFERENCES expectations(id),
        code                TEXT NOT NULL,
        detected_at         INTEGER NOT NULL,
        message             TEXT NOT NULL,
        evidence            TEXT NOT NULL,
        is_open             INTEGER NOT NULL,
        last_notified_at    INTEGER
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_violations_expectation_code_open
        ON violations (expectation_id, code, is_open)
    "#,
];
