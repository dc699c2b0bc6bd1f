//! `/observe/{id}` (§6) — the only unauthenticated surface; the
//! expectation id is itself the capability token (§9 "Security
//! perimeter"), so it is never logged here.

use axum::extract::{Extension, Form, Path};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use rewire_core::types::ObservationKind;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ObserveForm {
    pub kind: String,
    /// Opaque UTF-8 payload, capped at 4 KiB by the Store (§3).
    #[serde(default)]
    pub meta: String,
}

/// `POST /observe/{id}` — 200 on append, 400 on bad kind, 404 on unknown
/// expectation.
pub async fn append(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Form(form): Form<ObserveForm>,
) -> Result<Json<serde_json::Value>, AppError> {
    let kind = ObservationKind::parse(&form.kind)
        .ok_or_else(|| AppError(rewire_core::error::RewireError::Validation(
            "kind must be start|end|ping|ack".into(),
        )))?;

    // Confirms the expectation exists before appending — surfaces 404
    // rather than silently recording history for nothing.
    state.store.get_expectation(&id).await?;

    let now = state.clock.now();
    let seq = state
        .store
        .append_observation(&id, kind, form.meta.into_bytes(), now)
        .await?;

    Ok(Json(json!({"seq": seq, "observed_at": now})))
}

/// `GET /observe/{id}` — expectation fields plus up to 10 newest
/// observations (§6).
pub async fn show(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let expectation = state.store.get_expectation(&id).await?;
    let observations = state.store.recent_observations(&id, 10).await?;
    Ok(Json(json!({
        "expectation": expectation,
        "observations": observations,
    })))
}
