//! Maps `RewireError` (§7) to HTTP status and a JSON error body — the
//! same two-layer split the teacher uses: a pure domain error enum plus
//! a server-side newtype that knows about HTTP.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use rewire_core::error::RewireError;

pub struct AppError(pub RewireError);

impl From<RewireError> for AppError {
    fn from(e: RewireError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = json!({
            "error": self.0.to_string(),
            "code": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}
