//! Checkout: place an order from the cart and record its payment.
//!
//! Placing an order is one transaction: the buyer is found or created by
//! email, the referenced products are locked `FOR UPDATE` in id order and
//! priced with the lenient policy (missing or inactive products are dropped),
//! then the order, its lines and the stock decrement are written together
//! with the statements in `stern_core::db`.

use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use stern_core::db::{adjust_stock, insert_order, lock_products, taken_stock};
use stern_core::order::{PricingPolicy, price_order, referenced_products};
use stern_core::{CurrencyCode, CustomerId, OrderId, OrderStatus};

use super::{RepositoryError, conflict_code};
use crate::models::checkout::{NewCheckout, PAYMENT_METHOD, PaidOrder, PaymentCapture, PlacedOrder};

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    status: String,
    payment_txn_id: Option<String>,
    payment_status: Option<String>,
}

// =============================================================================
// Transaction Steps
// =============================================================================

/// Return the id of the customer with this email, creating one from the
/// checkout details when none exists. Existing customers keep their record.
async fn find_or_create_customer(
    conn: &mut PgConnection,
    checkout: &NewCheckout,
) -> Result<CustomerId, RepositoryError> {
    // ON CONFLICT DO NOTHING returns no row for an existing email.
    let inserted: Option<i64> = sqlx::query_scalar(
        r"
        INSERT INTO shop.customer (name, email, phone, city, region, country)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (email) DO NOTHING
        RETURNING customer_id
        ",
    )
    .bind(&checkout.name)
    .bind(&checkout.email)
    .bind(&checkout.contact.phone)
    .bind(&checkout.contact.city)
    .bind(&checkout.contact.region)
    .bind(&checkout.contact.country)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = inserted {
        tracing::info!(customer_id = id, "Customer created at checkout");
        return Ok(CustomerId::new(id));
    }

    let existing: i64 =
        sqlx::query_scalar("SELECT customer_id FROM shop.customer WHERE email = $1")
            .bind(&checkout.email)
            .fetch_one(&mut *conn)
            .await?;
    Ok(CustomerId::new(existing))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for checkout writes.
pub struct CheckoutRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutRepository<'a> {
    /// Create a new checkout repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place a `pendiente` order in MXN and take its units out of stock.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::Validation` when no requested product is orderable
    /// - `RepositoryError::Conflict` (`INSUFFICIENT_STOCK`) if a product lacks stock
    #[instrument(skip(self, checkout), fields(email = %checkout.email, items = checkout.items.len()))]
    pub async fn place_order(&self, checkout: &NewCheckout) -> Result<PlacedOrder, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let customer_id = find_or_create_customer(&mut tx, checkout).await?;
        let catalog = lock_products(&mut tx, &referenced_products(&checkout.items)).await?;
        let priced = price_order(&checkout.items, &catalog, PricingPolicy::Lenient)?;

        let order_id = insert_order(&mut tx, customer_id, OrderStatus::Pending, &priced).await?;
        adjust_stock(&mut tx, &taken_stock(&priced)).await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order_id,
            customer_id = %customer_id,
            total = %priced.total,
            lines = priced.lines.len(),
            "Checkout order placed"
        );

        Ok(PlacedOrder {
            order_id,
            total: priced.total,
            currency: CurrencyCode::default(),
            customer_id,
        })
    }

    /// Move a `pendiente` order to `pagado` and record the payment.
    ///
    /// Repeating the call for an order already paid with the same
    /// transaction id returns it unchanged.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the order does not exist
    /// - `RepositoryError::Conflict` (`ORDER_STATE`) for any other status or
    ///   an order paid under a different transaction
    #[instrument(skip(self, capture), fields(order_id = %order_id, txn = %capture.transaction_id))]
    pub async fn mark_paid(
        &self,
        order_id: OrderId,
        capture: &PaymentCapture,
    ) -> Result<PaidOrder, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, PaymentRow>(
            r"
            SELECT status, payment_txn_id, payment_status
            FROM shop.sales_order
            WHERE order_id = $1
            FOR UPDATE
            ",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("order {order_id}")))?;

        let status: OrderStatus = current
            .status
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("order {order_id}: {e}")))?;

        match status {
            OrderStatus::Pending => {}
            OrderStatus::Paid
                if current.payment_txn_id.as_deref() == Some(capture.transaction_id.as_str()) =>
            {
                return Ok(PaidOrder {
                    order_id,
                    status,
                    payment_txn_id: current.payment_txn_id,
                    payment_status: current.payment_status,
                });
            }
            other => {
                return Err(RepositoryError::conflict(
                    conflict_code::ORDER_STATE,
                    format!("order {order_id} is {other} and cannot be marked paid"),
                ));
            }
        }

        sqlx::query(
            r"
            UPDATE shop.sales_order
            SET status = $2, payment_method = $3, payment_txn_id = $4,
                payment_status = $5, payment_raw = $6, updated_at = NOW()
            WHERE order_id = $1
            ",
        )
        .bind(order_id)
        .bind(OrderStatus::Paid.as_str())
        .bind(PAYMENT_METHOD)
        .bind(&capture.transaction_id)
        .bind(&capture.provider_status)
        .bind(&capture.raw)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(order_id = %order_id, "Order marked paid");

        Ok(PaidOrder {
            order_id,
            status: OrderStatus::Paid,
            payment_txn_id: Some(capture.transaction_id.clone()),
            payment_status: Some(capture.provider_status.clone()),
        })
    }
}
