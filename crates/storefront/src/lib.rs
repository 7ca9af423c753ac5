//! Stern storefront library.
//!
//! Public catalog, session cart, checkout, customer accounts and reviews
//! behind a JSON API. The `stern-storefront` binary serves it on port 3000.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_sessions::{SessionManagerLayer, SessionStore};

pub use state::AppState;

/// Build the application router with session handling and state attached.
///
/// Tracing and Sentry layers are added by the binary.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    routes::routes()
        .layer(session_layer)
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .with_state(state)
}
