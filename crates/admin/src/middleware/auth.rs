//! Bearer-token guard for the admin API.
//!
//! When `ADMIN_API_TOKEN` is configured every `/api` request must carry
//! `Authorization: Bearer <token>`. Without a token the guard lets requests
//! through and the API relies on its private bind address.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::{AppState, token_digest};

/// Extract the token from an `Authorization: Bearer` header value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Reject requests whose bearer token does not match the configured one.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` for a missing or wrong token.
pub async fn require_api_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.api_token_digest() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

    if token_digest(provided) != *expected {
        tracing::warn!(path = %request.uri().path(), "Rejected admin API request with wrong token");
        return Err(AppError::Unauthorized("invalid token".to_string()));
    }

    Ok(next.run(request).await)
}
