//! Checkout handlers: place an order and record its payment.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
    routing::post,
};
use tower_sessions::Session;

use stern_core::OrderId;

use crate::db::CheckoutRepository;
use crate::error::{AppError, add_breadcrumb};
use crate::models::checkout::{CheckoutInput, MarkPaidInput, PaidOrder, PlacedOrder};
use crate::models::session_keys;
use crate::state::AppState;

/// Build the checkout router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/checkout/orders", post(place_order))
        .route("/api/checkout/orders/{id}/paid", post(mark_paid))
}

/// Place a `pendiente` order. The session cart is emptied on success.
///
/// # Errors
///
/// Returns 400 for a missing buyer or empty cart, or 409
/// `INSUFFICIENT_STOCK` when a product cannot cover its quantity.
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<CheckoutInput>, JsonRejection>,
) -> Result<(StatusCode, Json<PlacedOrder>), AppError> {
    let Json(input) = payload?;
    let checkout = input.validate().map_err(AppError::BadRequest)?;

    let placed = CheckoutRepository::new(state.pool())
        .place_order(&checkout)
        .await?;

    // Stock moved; cached shelves may now be stale.
    state.catalog().invalidate_all().await;
    session.remove::<String>(session_keys::CART).await?;

    let order_id = placed.order_id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", &order_id)]));

    Ok((StatusCode::CREATED, Json(placed)))
}

/// Record a payment capture and mark the order paid.
///
/// # Errors
///
/// Returns 400 without a transaction id, 404 for an unknown order, or 409
/// `ORDER_STATE` when the order cannot move to `pagado`.
pub async fn mark_paid(
    State(state): State<AppState>,
    path: Result<Path<OrderId>, PathRejection>,
    payload: Result<Json<MarkPaidInput>, JsonRejection>,
) -> Result<Json<PaidOrder>, AppError> {
    let Path(id) = path?;
    let Json(input) = payload?;
    let capture = input.validate().map_err(AppError::BadRequest)?;

    let paid = CheckoutRepository::new(state.pool())
        .mark_paid(id, &capture)
        .await?;

    let order_id = id.to_string();
    add_breadcrumb("checkout", "Order paid", Some(&[("order_id", &order_id)]));

    Ok(Json(paid))
}
