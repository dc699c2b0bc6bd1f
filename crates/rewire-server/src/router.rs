//! Router construction for the Rewire HTTP surface (§6).

use axum::middleware as axum_mw;
use axum::routing::{get, post};
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::auth::{admin_auth, AdminToken};
use crate::state::AppState;

pub fn build_router(state: AppState, admin_token: AdminToken) -> Router {
    let admin = Router::new()
        .route("/admin/new", post(handlers::admin::new_expectation))
        .route("/admin/enable", post(handlers::admin::enable))
        .route("/admin/disable", post(handlers::admin::disable))
        .layer(axum_mw::from_fn(admin_auth))
        .layer(Extension(admin_token));

    let public = Router::new()
        .route("/status", get(handlers::health::status))
        .route(
            "/observe/:id",
            post(handlers::observe::append).get(handlers::observe::show),
        )
        .route("/ack/:trial_id", get(handlers::ack::ack));

    public
        .merge(admin)
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}
