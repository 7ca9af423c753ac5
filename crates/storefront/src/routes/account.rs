//! Account handlers: registration and profile.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tower_sessions::Session;

use crate::error::{AppError, set_sentry_user};
use crate::middleware::{RequireAuth, set_current_customer};
use crate::models::CurrentCustomer;
use crate::models::customer::{CustomerProfile, ProfileInput, RegisterInput};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Create an account and log it in.
///
/// # Errors
///
/// Returns 400 for invalid fields or 409 `DUPLICATE` if the email is taken.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(StatusCode, Json<CustomerProfile>), AppError> {
    let Json(input) = payload?;
    let profile = AuthService::new(state.pool()).register(input).await?;
    session.cycle_id().await?;
    set_current_customer(&session, &CurrentCustomer::from(&profile)).await?;
    set_sentry_user(&profile.customer_id, Some(profile.email.as_str()));

    Ok((StatusCode::CREATED, Json(profile)))
}

/// Save the logged-in customer's profile.
///
/// # Errors
///
/// Returns 401 when logged out or 400 for invalid fields.
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    payload: Result<Json<ProfileInput>, JsonRejection>,
) -> Result<Json<CustomerProfile>, AppError> {
    let Json(input) = payload?;
    let profile = AuthService::new(state.pool())
        .update_profile(&current.email, input)
        .await?;

    // Keep the session's display name in step.
    if profile.name != current.name {
        set_current_customer(&session, &CurrentCustomer::from(&profile)).await?;
    }

    Ok(Json(profile))
}
