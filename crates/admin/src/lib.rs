//! Stern back-office library.
//!
//! Order Transaction Manager, Returns Processor, ETL pipeline and catalog
//! management behind a JSON API. The `stern-admin` binary serves it on port
//! 3001; the CLI reuses the repositories, migrations and ETL stages.
//!
//! # Security
//!
//! The API mutates orders, stock and customer records. Bind it to a private
//! address and/or set `ADMIN_API_TOKEN`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod etl;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

use axum::Router;

pub use state::AppState;

/// Build the application router with state attached.
///
/// Tracing and Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    routes::routes(&state).with_state(state)
}
