//! Product management handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::{JsonRejection, PathRejection, QueryRejection}},
    http::StatusCode,
    routing::get,
};

use stern_core::ProductId;

use super::DeleteQuery;
use crate::db::ProductRepository;
use crate::error::AppError;
use crate::models::product::{CreateProductInput, Product, UpdateProductInput};
use crate::state::AppState;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list).post(create))
        .route("/api/products/{id}", get(show).patch(update).delete(delete))
}

/// List every product, including inactive ones.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products))
}

/// Product detail.
///
/// # Errors
///
/// Returns 404 if the product does not exist.
pub async fn show(
    State(state): State<AppState>,
    path: Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Product>, AppError> {
    let Path(id) = path?;
    let product = ProductRepository::new(state.pool()).get(id).await?;
    Ok(Json(product))
}

/// Create a product.
///
/// # Errors
///
/// Returns 400 if the body is malformed or a field is invalid.
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateProductInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let Json(input) = payload?;
    let product = input.validate().map_err(AppError::BadRequest)?;
    let created = ProductRepository::new(state.pool()).create(&product).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Partially update a product.
///
/// # Errors
///
/// Returns 400 for invalid fields or 404 if the product does not exist.
pub async fn update(
    State(state): State<AppState>,
    path: Result<Path<ProductId>, PathRejection>,
    payload: Result<Json<UpdateProductInput>, JsonRejection>,
) -> Result<Json<Product>, AppError> {
    let Path(id) = path?;
    let Json(input) = payload?;
    let changes = input.validate().map_err(AppError::BadRequest)?;
    let product = ProductRepository::new(state.pool())
        .update(id, changes)
        .await?;
    Ok(Json(product))
}

/// Delete (`mode=hard`) or deactivate (`mode=soft`) a product.
///
/// # Errors
///
/// Returns 400 without a valid mode, 404 if the product does not exist, or
/// 409 `FK_CONSTRAINT` when a hard delete is blocked by order lines.
pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<ProductId>, PathRejection>,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path?;
    let Query(query) = query?;
    ProductRepository::new(state.pool())
        .delete(id, query.mode()?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
