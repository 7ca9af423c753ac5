//! Dashboard statistics handler.

use axum::{Json, Router, extract::State, routing::get};

use crate::db::StatsRepository;
use crate::error::AppError;
use crate::models::stats::DashboardStats;
use crate::state::AppState;

/// Build the stats router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/stats", get(dashboard))
}

/// Headline counters.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    let stats = StatsRepository::new(state.pool()).dashboard().await?;
    Ok(Json(stats))
}
