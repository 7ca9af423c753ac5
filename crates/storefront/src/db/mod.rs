//! Database operations for the storefront.
//!
//! The storefront reads and writes the operational `shop` schema owned by the
//! admin crate's migrations:
//!
//! - `catalog` - Active products and categories
//! - `customers` - Customer accounts and password hashes
//! - `checkout` - Order placement and payment capture
//! - `reviews` - Product reviews
//!
//! Sessions live in `storefront_session.session` (tower-sessions).
//!
//! # Migrations
//!
//! Migrations are run via:
//! ```bash
//! cargo run -p stern-cli -- migrate
//! ```

pub mod catalog;
pub mod checkout;
pub mod customers;
pub mod reviews;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use stern_core::order::PricingError;

pub use catalog::CatalogRepository;
pub use checkout::CheckoutRepository;
pub use customers::CustomerRepository;
pub use reviews::ReviewRepository;

/// Machine-readable codes attached to conflicts.
pub mod conflict_code {
    pub const DUPLICATE: &str = "DUPLICATE";
    pub const INSUFFICIENT_STOCK: &str = "INSUFFICIENT_STOCK";
    pub const ORDER_STATE: &str = "ORDER_STATE";
}

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("{0} not found")]
    NotFound(String),

    /// The request conflicts with current state.
    #[error("{message}")]
    Conflict {
        code: &'static str,
        message: String,
    },

    /// The request itself is invalid.
    #[error("{0}")]
    Validation(String),
}

impl RepositoryError {
    pub(crate) fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }
}

impl From<PricingError> for RepositoryError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::InsufficientStock { .. } => {
                Self::conflict(conflict_code::INSUFFICIENT_STOCK, err.to_string())
            }
            PricingError::Empty
            | PricingError::InvalidQuantity { .. }
            | PricingError::UnknownProduct(_)
            | PricingError::InactiveProduct(_) => Self::Validation(err.to_string()),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
