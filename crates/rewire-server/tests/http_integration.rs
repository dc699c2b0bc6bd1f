//! HTTP-level integration tests for the Rewire server.
//!
//! Unlike the teacher's Postgres-backed equivalent
//! (`sem_os_server/tests/authoring_http_integration.rs`, which requires
//! `DATABASE_URL` and is `#[ignore]`d by default), these run unconditionally
//! against a throwaway SQLite file — no external service needed.

use std::sync::Arc;

use axum::body::Body;
use http_body_util::BodyExt;
use hyper::{Request, StatusCode};
use rewire_core::clock::TestClock;
use rewire_server::middleware::auth::AdminToken;
use rewire_server::router::build_router;
use rewire_server::state::AppState;
use rewire_store::SqliteStore;
use tower::ServiceExt;

const ADMIN_TOKEN: &str = "test-admin-token";

async fn test_db_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir()
        .join(format!("rewire-http-test-{nanos}.sqlite3"))
        .to_string_lossy()
        .into_owned()
}

async fn build_test_app() -> axum::Router {
    let db_path = test_db_path().await;
    let store = Arc::new(SqliteStore::connect(&db_path).await.unwrap());
    let clock = Arc::new(TestClock::new(1_000));
    let state = AppState {
        store: store as Arc<dyn rewire_core::ports::Store>,
        clock: clock as Arc<dyn rewire_core::clock::Clock>,
    };
    build_router(state, AdminToken(ADMIN_TOKEN.to_string()))
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| serde_json::json!({ "raw": String::from_utf8_lossy(&bytes) }))
}

fn form_body(fields: &[(&str, &str)]) -> Body {
    let encoded = fields
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencode(v)))
        .collect::<Vec<_>>()
        .join("&");
    Body::from(encoded)
}

fn urlencode(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

#[tokio::test]
async fn status_requires_no_auth() {
    let app = build_test_app().await;
    let resp = app
        .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_routes_reject_missing_and_wrong_token() {
    let app = build_test_app().await;
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/new")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(form_body(&[("name", "job")]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/new")
                .header("content-type", "application/x-www-form-urlencoded")
                .header("authorization", "Bearer wrong-token")
                .body(form_body(&[("name", "job")]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_new_rejects_non_positive_alert_path_params() {
    let app = build_test_app().await;
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/new")
                .header("content-type", "application/x-www-form-urlencoded")
                .header("authorization", format!("Bearer {ADMIN_TOKEN}"))
                .body(form_body(&[
                    ("name", "pager test"),
                    ("owner_contact", "oncall@example.com"),
                    ("expected_interval_s", "3600"),
                    ("tolerance_s", "60"),
                    (
                        "params_json",
                        r#"{"kind":"alert_path","ack_window_s":60,"test_interval_s":0}"#,
                    ),
                ]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_observe_and_ack_roundtrip() {
    let app = build_test_app().await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/new")
                .header("content-type", "application/x-www-form-urlencoded")
                .header("authorization", format!("Bearer {ADMIN_TOKEN}"))
                .body(form_body(&[
                    ("name", "nightly batch"),
                    ("owner_contact", "owner@example.com"),
                    ("expected_interval_s", "3600"),
                    ("tolerance_s", "60"),
                    (
                        "params_json",
                        r#"{"kind":"schedule","max_runtime_s":0,"min_spacing_s":0,"allow_overlap":false}"#,
                    ),
                ]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created = body_json(resp).await;
    let id = created["id"].as_str().unwrap().to_string();

    // Unauthenticated observe surface — the id is the capability token.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/observe/{id}"))
                .header("content-type", "application/x-www-form-urlencoded")
                .body(form_body(&[("kind", "start")]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/observe/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let shown = body_json(resp).await;
    assert_eq!(shown["observations"].as_array().unwrap().len(), 1);

    // An unknown trial id acks as 404.
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/ack/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
