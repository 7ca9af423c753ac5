//! ETL trigger handlers.

use axum::{Json, Router, extract::State, routing::post};

use crate::error::AppError;
use crate::etl::{self, EtlCounts};
use crate::state::AppState;

/// Build the ETL router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/etl/staging", post(run_staging))
        .route("/api/etl/warehouse", post(run_warehouse))
}

/// Run stage 1 (operational to staging).
///
/// # Errors
///
/// Returns 500 if a step fails; the stage is rolled back.
pub async fn run_staging(State(state): State<AppState>) -> Result<Json<EtlCounts>, AppError> {
    let counts = etl::staging::run(state.pool()).await?;
    Ok(Json(counts))
}

/// Run stage 2 (staging to warehouse).
///
/// # Errors
///
/// Returns 500 if a step fails; the stage is rolled back.
pub async fn run_warehouse(State(state): State<AppState>) -> Result<Json<EtlCounts>, AppError> {
    let counts = etl::warehouse::run(state.pool()).await?;
    Ok(Json(counts))
}
