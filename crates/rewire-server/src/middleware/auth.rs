//! Bearer-token auth for `/admin/*` (§6, §9 "Security perimeter") — the
//! only gated surface. The token is compared in constant time via
//! `subtle::ConstantTimeEq`, not a short-circuiting `==`, so a timing
//! side-channel can't leak it byte by byte.

use axum::extract::{Extension, Request};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use subtle::ConstantTimeEq;

#[derive(Clone)]
pub struct AdminToken(pub String);

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "unauthorized"})),
    )
        .into_response()
}

pub async fn admin_auth(
    Extension(expected): Extension<AdminToken>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;

    let matches = presented.len() == expected.0.len()
        && bool::from(presented.as_bytes().ct_eq(expected.0.as_bytes()));

    if !matches {
        return Err(unauthorized());
    }

    Ok(next.run(req).await)
}
