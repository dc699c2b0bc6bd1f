//! `/admin/*` (§6) — the only bearer-gated surface (§9). Bodies are
//! form-encoded; `params_json` is opaque UTF-8 carrying the internally
//! tagged `ExpectationParams` (`{"kind":"schedule", ...}` or
//! `{"kind":"alert_path", ...}`) — the wire `type` field `spec.md` §3
//! lists is folded into that tag rather than sent as a sibling field
//! (DESIGN.md records this as the one place the form shape diverges
//! from a literal field-for-field reading of §3).

use axum::extract::{Extension, Form};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use rewire_core::error::RewireError;
use rewire_core::types::{ExpectationParams, NewExpectation};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NewExpectationForm {
    pub name: String,
    pub owner_contact: String,
    pub expected_interval_s: i64,
    pub tolerance_s: i64,
    pub params_json: String,
}

pub async fn new_expectation(
    Extension(state): Extension<AppState>,
    Form(form): Form<NewExpectationForm>,
) -> Result<Json<serde_json::Value>, AppError> {
    if form.expected_interval_s < 60 {
        return Err(AppError(RewireError::Validation(
            "expected_interval_s must be >= 60".into(),
        )));
    }
    if form.tolerance_s < 0 {
        return Err(AppError(RewireError::Validation(
            "tolerance_s must be >= 0".into(),
        )));
    }
    let params: ExpectationParams = serde_json::from_str(&form.params_json)
        .map_err(|e| AppError(RewireError::ParamParse(e.to_string())))?;
    if let ExpectationParams::AlertPath(p) = &params {
        if p.ack_window_s <= 0 {
            return Err(AppError(RewireError::Validation(
                "ack_window_s must be positive".into(),
            )));
        }
        if p.test_interval_s <= 0 {
            return Err(AppError(RewireError::Validation(
                "test_interval_s must be positive".into(),
            )));
        }
    }

    let now = state.clock.now();
    let expectation = state
        .store
        .create_expectation(
            NewExpectation {
                name: form.name,
                owner_contact: form.owner_contact,
                expected_interval_s: form.expected_interval_s,
                tolerance_s: form.tolerance_s,
                params,
            },
            now,
        )
        .await?;

    Ok(Json(serde_json::to_value(expectation).unwrap_or_default()))
}

#[derive(Debug, Deserialize)]
pub struct IdForm {
    pub id: String,
}

pub async fn enable(
    Extension(state): Extension<AppState>,
    Form(form): Form<IdForm>,
) -> Result<Json<serde_json::Value>, AppError> {
    let now = state.clock.now();
    state.store.set_enabled(&form.id, true, now).await?;
    Ok(Json(json!({"id": form.id, "enabled": true})))
}

pub async fn disable(
    Extension(state): Extension<AppState>,
    Form(form): Form<IdForm>,
) -> Result<Json<serde_json::Value>, AppError> {
    let now = state.clock.now();
    state.store.set_enabled(&form.id, false, now).await?;
    Ok(Json(json!({"id": form.id, "enabled": false})))
}
