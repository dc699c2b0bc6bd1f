//! `GET /ack/{trial_id}` (§6) — 200 on first success, 404 on
//! unknown/non-pending. The ack is atomic at the Store layer (T3); a
//! race between two requests for the same trial yields exactly one 200.

use axum::extract::{Extension, Path};
use axum::http::StatusCode;

use rewire_core::error::RewireError;
use rewire_core::trial::TrialManager;

use crate::error::AppError;
use crate::state::AppState;

pub async fn ack(
    Extension(state): Extension<AppState>,
    Path(trial_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let now = state.clock.now();
    let trials = TrialManager::new(&*state.store);
    let acked = trials.ack(&trial_id, now).await?;
    if acked {
        Ok(StatusCode::OK)
    } else {
        Err(AppError(RewireError::NotFound(format!("trial {trial_id}"))))
    }
}
