//! Returns Processor handlers.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
    routing::get,
};

use crate::db::ReturnRepository;
use crate::error::AppError;
use crate::models::order_return::{CreateReturnInput, OrderReturn, ReturnFilter, ReturnReceipt};
use crate::state::AppState;

/// Build the returns router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/returns", get(list).post(create))
}

/// Return history, optionally for one order.
///
/// # Errors
///
/// Returns 400 for a malformed `orderId`.
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<ReturnFilter>, QueryRejection>,
) -> Result<Json<Vec<OrderReturn>>, AppError> {
    let Query(filter) = query?;
    let returns = ReturnRepository::new(state.pool()).list(filter).await?;
    Ok(Json(returns))
}

/// Process a return.
///
/// # Errors
///
/// Returns 400 for a bad quantity or a product not on the order, 404 for an
/// unknown order, or 409 (`RETURN_LIMIT`, `ORDER_STATE`).
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateReturnInput>, JsonRejection>,
) -> Result<Json<ReturnReceipt>, AppError> {
    let Json(input) = payload?;
    let receipt = ReturnRepository::new(state.pool()).create(&input).await?;
    Ok(Json(receipt))
}
