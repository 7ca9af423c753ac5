//! Customer management handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::{JsonRejection, PathRejection, QueryRejection}},
    http::StatusCode,
    routing::{get, patch},
};

use stern_core::CustomerId;

use super::DeleteQuery;
use crate::db::CustomerRepository;
use crate::error::AppError;
use crate::models::customer::{CreateCustomerInput, Customer, UpdateCustomerInput};
use crate::state::AppState;

/// Build the customers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list).post(create))
        .route("/api/customers/{id}", patch(update).delete(delete))
}

/// List customers.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Customer>>, AppError> {
    let customers = CustomerRepository::new(state.pool()).list().await?;
    Ok(Json(customers))
}

/// Create a customer.
///
/// # Errors
///
/// Returns 400 for invalid fields or 409 `DUPLICATE` for a taken email.
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateCustomerInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    let Json(input) = payload?;
    let customer = input.validate().map_err(AppError::BadRequest)?;
    let created = CustomerRepository::new(state.pool()).create(&customer).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Partially update a customer.
///
/// # Errors
///
/// Returns 400 for invalid fields, 404 if the customer does not exist, or
/// 409 `DUPLICATE` for a taken email.
pub async fn update(
    State(state): State<AppState>,
    path: Result<Path<CustomerId>, PathRejection>,
    payload: Result<Json<UpdateCustomerInput>, JsonRejection>,
) -> Result<Json<Customer>, AppError> {
    let Path(id) = path?;
    let Json(input) = payload?;
    let changes = input.validate().map_err(AppError::BadRequest)?;
    let customer = CustomerRepository::new(state.pool())
        .update(id, changes)
        .await?;
    Ok(Json(customer))
}

/// Delete (`mode=hard`) or deactivate (`mode=soft`) a customer.
///
/// # Errors
///
/// Returns 400 without a valid mode, 404 if the customer does not exist, or
/// 409 `FK_CONSTRAINT` when a hard delete is blocked by orders.
pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<CustomerId>, PathRejection>,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path?;
    let Query(query) = query?;
    CustomerRepository::new(state.pool())
        .delete(id, query.mode()?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
