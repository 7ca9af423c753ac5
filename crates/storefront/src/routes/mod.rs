//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness check
//! GET    /health/ready                    - Readiness check (database reachable)
//!
//! # Catalog
//! GET    /api/products?category=&limit=   - Active products, newest first
//! GET    /api/products/featured           - Featured shelf
//! GET    /api/products/{id}               - Product detail
//! GET    /api/categories                  - Categories
//! GET    /api/search/products?q=          - Quick search
//!
//! # Reviews
//! GET    /api/products/{id}/reviews       - Reviews with average rating
//! POST   /api/products/{id}/reviews       - Publish a review (requires auth)
//!
//! # Cart (session-backed)
//! GET    /api/cart                        - Cart contents and totals
//! DELETE /api/cart                        - Empty the cart
//! POST   /api/cart/items                  - Add a product
//! PATCH  /api/cart/items/{product_id}     - Set a line quantity
//! DELETE /api/cart/items/{product_id}     - Remove a line
//!
//! # Checkout
//! POST   /api/checkout/orders             - Place an order
//! POST   /api/checkout/orders/{id}/paid   - Record the payment capture
//!
//! # Accounts (register and login are rate limited)
//! POST   /api/account/register            - Create an account
//! PUT    /api/account/profile             - Save the profile (requires auth)
//! POST   /api/auth/login                  - Login
//! POST   /api/auth/logout                 - Logout
//! GET    /api/auth/me                     - Current customer
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod reviews;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Routes that accept credentials. Rate limited per client IP.
fn credential_routes() -> Router<AppState> {
    let router = Router::new()
        .route("/api/account/register", post(account::register))
        .route("/api/auth/login", post(auth::login));

    match auth_rate_limiter() {
        Some(limiter) => router.route_layer(limiter),
        None => {
            tracing::warn!("Rate limiter configuration rejected; credential routes unthrottled");
            router
        }
    }
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(catalog::router())
        .merge(reviews::router())
        .merge(cart::router())
        .merge(checkout::router())
        .merge(credential_routes())
        .route("/api/account/profile", put(account::update_profile))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
