//! Database operations for the operational `PostgreSQL` schema.
//!
//! # Schemas
//!
//! - `shop` - Operational tables (customers, products, categories, orders,
//!   order lines, returns, reviews)
//! - `staging` - Star schema rebuilt by ETL stage 1
//! - `warehouse` - Star schema accumulated by ETL stage 2
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p stern-cli -- migrate
//! ```
//!
//! Every multi-step write runs in one transaction and locks the rows it
//! validates against (`SELECT ... FOR UPDATE`), so two requests touching the
//! same products serialize instead of both passing a stock check.

pub mod categories;
pub mod customers;
pub mod orders;
pub mod returns;
pub mod stats;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use stern_core::order::PricingError;
use stern_core::returns::ReturnError;

pub use categories::CategoryRepository;
pub use customers::CustomerRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use returns::ReturnRepository;
pub use stats::StatsRepository;

/// Machine-readable codes attached to conflicts.
pub mod conflict_code {
    pub const CATEGORY_IN_USE: &str = "CATEGORY_IN_USE";
    pub const DUPLICATE: &str = "DUPLICATE";
    pub const FK_CONSTRAINT: &str = "FK_CONSTRAINT";
    pub const INSUFFICIENT_STOCK: &str = "INSUFFICIENT_STOCK";
    pub const ORDER_STATE: &str = "ORDER_STATE";
    pub const RETURN_LIMIT: &str = "RETURN_LIMIT";
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

    /// The request conflicts with current state (stock, references, status).
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

impl From<ReturnError> for RepositoryError {
    fn from(err: ReturnError) -> Self {
        match err {
            ReturnError::InvalidQuantity | ReturnError::ProductNotInOrder(_) => {
                Self::Validation(err.to_string())
            }
            ReturnError::ExceedsAvailable { .. } => {
                Self::conflict(conflict_code::RETURN_LIMIT, err.to_string())
            }
            ReturnError::NotReturnable(_) => {
                Self::conflict(conflict_code::ORDER_STATE, err.to_string())
            }
        }
    }
}

/// Map a failed hard delete: a foreign-key violation means the row is still
/// referenced and becomes a conflict the caller may answer with a soft delete.
pub(crate) fn map_delete_error(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::conflict(
            conflict_code::FK_CONSTRAINT,
            format!("{what} is referenced by other records; deactivate it instead"),
        );
    }
    RepositoryError::Database(err)
}

/// Map a unique-constraint violation on insert/update to a conflict.
pub(crate) fn map_unique_error(err: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::conflict(conflict_code::DUPLICATE, message);
    }
    RepositoryError::Database(err)
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

/// Embedded migrations for all three schemas.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[cfg(test)]
mod tests {
    use stern_core::{OrderStatus, ProductId};

    use super::*;

    #[test]
    fn test_pricing_errors_classify() {
        let err: RepositoryError = PricingError::UnknownProduct(ProductId::new(4)).into();
        assert!(matches!(err, RepositoryError::Validation(_)));

        let err: RepositoryError = PricingError::InsufficientStock {
            product_id: ProductId::new(4),
            name: "Gorra".into(),
            available: 1,
            requested: 2,
        }
        .into();
        assert!(matches!(
            err,
            RepositoryError::Conflict {
                code: conflict_code::INSUFFICIENT_STOCK,
                ..
            }
        ));
    }

    #[test]
    fn test_return_errors_classify() {
        let err: RepositoryError = ReturnError::NotReturnable(OrderStatus::Pending).into();
        assert!(matches!(
            err,
            RepositoryError::Conflict {
                code: conflict_code::ORDER_STATE,
                ..
            }
        ));

        let err: RepositoryError = ReturnError::InvalidQuantity.into();
        assert_eq!(err.to_string(), "return quantity must be greater than zero");
    }

    #[test]
    fn test_not_found_message() {
        let err = RepositoryError::NotFound("order 7".into());
        assert_eq!(err.to_string(), "order 7 not found");
    }
}
