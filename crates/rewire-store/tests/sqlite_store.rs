//! Integration tests against a real SQLite database, exercising the SQL
//! this crate actually runs — the CAS `ack_trial`, idempotent
//! `close_violations`, and row-to-domain parsing — rather than relying on
//! the in-memory test double `rewire-core` uses for its property tests.

use rewire_core::ports::Store;
use rewire_core::types::{
    ExpectationParams, NewExpectation, ObservationKind, ScheduleParams, ViolationCode,
};
use rewire_store::SqliteStore;

async fn open_test_store() -> SqliteStore {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("rewire-store-test-{nanos}.sqlite3"));
    SqliteStore::connect(path.to_str().unwrap()).await.unwrap()
}

async fn new_expectation(store: &SqliteStore) -> rewire_core::types::Expectation {
    store
        .create_expectation(
            NewExpectation {
                name: "nightly batch".into(),
                owner_contact: "owner@example.com".into(),
                expected_interval_s: 3600,
                tolerance_s: 60,
                params: ExpectationParams::Schedule(ScheduleParams {
                    max_runtime_s: 0,
                    min_spacing_s: 0,
                    allow_overlap: false,
                }),
            },
            0,
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn create_and_get_expectation_roundtrips() {
    let store = open_test_store().await;
    let created = new_expectation(&store).await;
    let fetched = store.get_expectation(&created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.name, "nightly batch");
    assert!(fetched.enabled);
    assert!(matches!(fetched.params, ExpectationParams::Schedule(_)));
}

#[tokio::test]
async fn recent_observations_are_newest_first() {
    let store = open_test_store().await;
    let e = new_expectation(&store).await;

    store
        .append_observation(&e.id, ObservationKind::Start, b"first".to_vec(), 100)
        .await
        .unwrap();
    store
        .append_observation(&e.id, ObservationKind::End, b"second".to_vec(), 200)
        .await
        .unwrap();

    let history = store.recent_observations(&e.id, 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].observed_at, 200);
    assert_eq!(history[1].observed_at, 100);
    assert_eq!(history[0].meta, b"second");
}

#[tokio::test]
async fn ack_trial_is_compare_and_swap() {
    let store = open_test_store().await;
    let e = new_expectation(&store).await;
    let trial = store.create_trial(&e.id, "trial-1", 0).await.unwrap();

    let first = store.ack_trial(&trial.id, 10).await.unwrap();
    assert!(first, "first ack on a pending trial must succeed");

    let second = store.ack_trial(&trial.id, 20).await.unwrap();
    assert!(!second, "ack of an already-acked trial must be a no-op");

    let stored = store.get_trial(&trial.id).await.unwrap().unwrap();
    assert_eq!(stored.status, rewire_core::types::TrialStatus::Acked);
    assert_eq!(stored.acked_at, Some(10));
}

#[tokio::test]
async fn close_violations_is_idempotent() {
    let store = open_test_store().await;
    let e = new_expectation(&store).await;

    store
        .create_violation(
            &e.id,
            ViolationCode::Missed,
            100,
            "missed run".into(),
            serde_json::json!({}),
        )
        .await
        .unwrap();

    let first_close = store
        .close_violations(&e.id, &[ViolationCode::Missed])
        .await
        .unwrap();
    assert_eq!(first_close, 1);

    // Closing an already-closed (or never-opened) code is a no-op.
    let second_close = store
        .close_violations(&e.id, &[ViolationCode::Missed])
        .await
        .unwrap();
    assert_eq!(second_close, 0);

    assert!(store
        .open_violation(&e.id, ViolationCode::Missed)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn open_violation_only_returns_the_open_row_for_its_code() {
    let store = open_test_store().await;
    let e = new_expectation(&store).await;

    let v = store
        .create_violation(
            &e.id,
            ViolationCode::Overlap,
            50,
            "overlap detected".into(),
            serde_json::json!({"newest_start_at": 10, "other_start_at": 0}),
        )
        .await
        .unwrap();

    let open = store
        .open_violation(&e.id, ViolationCode::Overlap)
        .await
        .unwrap()
        .expect("just-created violation should be open");
    assert_eq!(open.id, v.id);
    assert!(open.last_notified_at.is_none());

    assert!(store
        .open_violation(&e.id, ViolationCode::Missed)
        .await
        .unwrap()
        .is_none());

    store.mark_notified(v.id, 60).await.unwrap();
    let open = store
        .open_violation(&e.id, ViolationCode::Overlap)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(open.last_notified_at, Some(60));
}
