//! Product review handlers.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
    routing::get,
};
use serde::Serialize;

use stern_core::{ProductId, ReviewId};

use crate::db::ReviewRepository;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::review::{ReviewInput, ReviewSummary};
use crate::state::AppState;

/// Build the reviews router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/products/{id}/reviews", get(list).post(create))
}

/// Response of a published review.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReview {
    pub review_id: ReviewId,
}

/// Reviews of a product, newest first, with their average rating.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list(
    State(state): State<AppState>,
    path: Result<Path<ProductId>, PathRejection>,
) -> Result<Json<ReviewSummary>, AppError> {
    let Path(id) = path?;
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(id)
        .await?;
    Ok(Json(ReviewSummary::new(reviews)))
}

/// Publish a review as the logged-in customer.
///
/// # Errors
///
/// Returns 401 when logged out, 400 for a rating outside 1..=5, or 404 if
/// the product is missing or inactive.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    path: Result<Path<ProductId>, PathRejection>,
    payload: Result<Json<ReviewInput>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedReview>), AppError> {
    let Path(id) = path?;
    let Json(input) = payload?;
    let review = input.validate().map_err(AppError::BadRequest)?;

    let review_id = ReviewRepository::new(state.pool())
        .create(id, customer.id, &review)
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedReview { review_id })))
}
