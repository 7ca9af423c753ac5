//! JSON API route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET    /api/stats                     - Dashboard counters
//!
//! GET    /api/products                  - List products
//! POST   /api/products                  - Create product
//! GET    /api/products/{id}             - Product detail
//! PATCH  /api/products/{id}             - Partial update
//! DELETE /api/products/{id}?mode=       - Hard or soft delete
//!
//! GET    /api/categories                - List categories with usage counts
//! POST   /api/categories                - Create category
//! DELETE /api/categories/{id}           - Delete unused category
//!
//! GET    /api/customers                 - List customers
//! POST   /api/customers                 - Create customer
//! PATCH  /api/customers/{id}            - Partial update
//! DELETE /api/customers/{id}?mode=      - Hard or soft delete
//!
//! GET    /api/orders                    - List orders with lines
//! POST   /api/orders                    - Create order
//! PATCH  /api/orders                    - Edit status and/or items
//! DELETE /api/orders                    - Delete order, restoring stock
//! GET    /api/orders/{id}               - Order detail
//!
//! GET    /api/returns?orderId=          - Return history
//! POST   /api/returns                   - Process a return
//!
//! POST   /api/etl/staging               - Run ETL stage 1
//! POST   /api/etl/warehouse             - Run ETL stage 2
//! ```

pub mod categories;
pub mod customers;
pub mod etl;
pub mod orders;
pub mod products;
pub mod returns;
pub mod stats;

use axum::Router;
use serde::Deserialize;

use stern_core::DeleteMode;

use crate::error::AppError;
use crate::state::AppState;

/// Build the complete API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(stats::router())
        .merge(products::router())
        .merge(categories::router())
        .merge(customers::router())
        .merge(orders::router())
        .merge(returns::router())
        .merge(etl::router())
}

/// Query string of delete endpoints. The mode is mandatory.
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub mode: Option<DeleteMode>,
}

impl DeleteQuery {
    /// The requested mode.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` when no mode was given.
    pub fn mode(&self) -> Result<DeleteMode, AppError> {
        self.mode
            .ok_or_else(|| AppError::BadRequest("mode must be \"hard\" or \"soft\"".to_string()))
    }
}
