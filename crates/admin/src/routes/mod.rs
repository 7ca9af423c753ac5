//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database reachable)
//! *    /api/...                - JSON API (see `api`), behind the token guard
//! ```

pub mod api;

use axum::{Router, extract::State, http::StatusCode, middleware, routing::get};

use crate::middleware::require_api_token;
use crate::state::AppState;

/// Build every route. The token guard only wraps the JSON API.
pub fn routes(state: &AppState) -> Router<AppState> {
    let api = api::router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_api_token,
    ));

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(api)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
