//! Order Transaction Manager handlers.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
    routing::get,
};
use stern_core::OrderId;

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::models::order::{
    CreateOrderInput, CreatedOrder, DeleteOrderInput, Order, UpdateOrderInput, UpdatedOrder,
};
use crate::state::AppState;

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/orders",
            get(list).post(create).patch(update).delete(delete),
        )
        .route("/api/orders/{id}", get(show))
}

/// List orders, newest first, with their lines.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Order>>, AppError> {
    let orders = OrderRepository::new(state.pool()).list().await?;
    Ok(Json(orders))
}

/// Order detail.
///
/// # Errors
///
/// Returns 404 if the order does not exist.
pub async fn show(
    State(state): State<AppState>,
    path: Result<Path<OrderId>, PathRejection>,
) -> Result<Json<Order>, AppError> {
    let Path(id) = path?;
    let order = OrderRepository::new(state.pool()).get(id).await?;
    Ok(Json(order))
}

/// Create an order and take its items out of stock.
///
/// # Errors
///
/// Returns 400 for invalid items, 404 for an unknown customer, or 409
/// `INSUFFICIENT_STOCK`.
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrderInput>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedOrder>), AppError> {
    let Json(input) = payload?;
    let created = OrderRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Change an order's status and/or replace its items.
///
/// # Errors
///
/// Returns 400 for invalid input, 404 for an unknown order, or 409 when the
/// order state or stock forbids the edit.
pub async fn update(
    State(state): State<AppState>,
    payload: Result<Json<UpdateOrderInput>, JsonRejection>,
) -> Result<Json<UpdatedOrder>, AppError> {
    let Json(input) = payload?;
    let updated = OrderRepository::new(state.pool()).update(&input).await?;
    Ok(Json(updated))
}

/// Delete an order, returning its units to stock.
///
/// # Errors
///
/// Returns 404 for an unknown order or 409 `ORDER_STATE` when returns exist.
pub async fn delete(
    State(state): State<AppState>,
    payload: Result<Json<DeleteOrderInput>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(input) = payload?;
    OrderRepository::new(state.pool())
        .delete(input.order_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
