//! Category management handlers.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
    routing::{delete, get},
};

use stern_core::CategoryId;

use crate::db::CategoryRepository;
use crate::error::AppError;
use crate::models::category::{Category, CreateCategoryInput};
use crate::state::AppState;

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(list).post(create))
        .route("/api/categories/{id}", delete(remove))
}

/// List categories with how many products use each.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(categories))
}

/// Create a category.
///
/// # Errors
///
/// Returns 400 for a blank name or 409 `DUPLICATE` if the name exists.
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateCategoryInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let Json(input) = payload?;
    let name = input.validated_name().map_err(AppError::BadRequest)?;
    let category = CategoryRepository::new(state.pool()).create(&name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Delete a category no product uses.
///
/// # Errors
///
/// Returns 404 if the category does not exist or 409 `CATEGORY_IN_USE`.
pub async fn remove(
    State(state): State<AppState>,
    path: Result<Path<CategoryId>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path?;
    CategoryRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
