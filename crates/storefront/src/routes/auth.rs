//! Login, logout and session introspection.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tower_sessions::Session;

use crate::db::CustomerRepository;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_customer, set_current_customer};
use crate::models::CurrentCustomer;
use crate::models::customer::{CustomerProfile, LoginInput};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Login with email and password.
///
/// # Errors
///
/// Returns 401 `"Invalid credentials"` on any mismatch and 403 for an
/// inactive customer.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<CustomerProfile>, AppError> {
    let Json(input) = payload?;
    let profile = AuthService::new(state.pool()).login(&input).await?;
    session.cycle_id().await?;
    set_current_customer(&session, &CurrentCustomer::from(&profile)).await?;
    set_sentry_user(&profile.customer_id, Some(profile.email.as_str()));
    tracing::info!(customer_id = %profile.customer_id, "Customer logged in");

    Ok(Json(profile))
}

/// Logout. Succeeds whether or not anyone was logged in.
///
/// # Errors
///
/// Returns 500 if the session store fails.
pub async fn logout(session: Session) -> Result<StatusCode, AppError> {
    clear_current_customer(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in customer's profile.
///
/// # Errors
///
/// Returns 401 when logged out.
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<CustomerProfile>, AppError> {
    let profile = CustomerRepository::new(state.pool())
        .get(current.id)
        .await?;
    Ok(Json(profile))
}
