//! Returns Processor: record returns against order lines and refund them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use stern_core::db::{adjust_stock, lock_products};
use stern_core::returns::{ReturnContext, ReturnableLine, assess_return};
use stern_core::{CustomerId, OrderId, OrderStatus, ProductId, ReturnId, ReturnStatus};

use super::RepositoryError;
use crate::models::order_return::{CreateReturnInput, OrderReturn, ReturnFilter, ReturnReceipt};

#[derive(Debug, sqlx::FromRow)]
struct ReturnRow {
    return_id: i64,
    order_id: i64,
    product_id: i64,
    customer_id: i64,
    quantity: i32,
    refund_amount: Decimal,
    reason: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReturnRow> for OrderReturn {
    type Error = RepositoryError;

    fn try_from(row: ReturnRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<ReturnStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("return {}: {e}", row.return_id))
        })?;

        Ok(Self {
            return_id: ReturnId::new(row.return_id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            customer_id: CustomerId::new(row.customer_id),
            quantity: row.quantity,
            refund_amount: row.refund_amount,
            reason: row.reason,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LockedOrder {
    customer_id: i64,
    status: String,
    total: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct LineFacts {
    quantity: i32,
    unit_price: Decimal,
}

const RETURN_COLUMNS: &str = "return_id, order_id, product_id, customer_id, quantity, \
     refund_amount, reason, status, created_at";

/// Repository for return database operations.
pub struct ReturnRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReturnRepository<'a> {
    /// Create a new return repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Returns, newest first, optionally limited to one order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: ReturnFilter) -> Result<Vec<OrderReturn>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReturnRow>(&format!(
            r"
            SELECT {RETURN_COLUMNS}
            FROM shop.order_return
            WHERE ($1::bigint IS NULL OR order_id = $1)
            ORDER BY created_at DESC, return_id DESC
            "
        ))
        .bind(filter.order_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderReturn::try_from).collect()
    }

    /// Process a return.
    ///
    /// With the order row locked: sum the prior returns for the same
    /// `(order, product)` pair, assess the request, then insert the return,
    /// put the units back in stock, lower the order total and move the order
    /// to its refunded status. Nothing is written when assessment fails.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the order does not exist
    /// - `RepositoryError::Validation` for a non-positive quantity or a product
    ///   that is not on the order
    /// - `RepositoryError::Conflict` when the quantity exceeds what is still
    ///   returnable (`RETURN_LIMIT`) or the order is not paid (`ORDER_STATE`)
    #[instrument(skip(self, input), fields(order_id = %input.order_id, product_id = %input.product_id))]
    pub async fn create(&self, input: &CreateReturnInput) -> Result<ReturnReceipt, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, LockedOrder>(
            "SELECT customer_id, status, total FROM shop.sales_order WHERE order_id = $1 FOR UPDATE",
        )
        .bind(input.order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("order {}", input.order_id)))?;

        let order_status = order.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", input.order_id))
        })?;

        let line = sqlx::query_as::<_, LineFacts>(
            r"
            SELECT quantity, unit_price
            FROM shop.order_line
            WHERE order_id = $1 AND product_id = $2
            ",
        )
        .bind(input.order_id)
        .bind(input.product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let already_returned: i64 = sqlx::query_scalar(
            r"
            SELECT COALESCE(SUM(quantity), 0)::bigint
            FROM shop.order_return
            WHERE order_id = $1 AND product_id = $2
            ",
        )
        .bind(input.order_id)
        .bind(input.product_id)
        .fetch_one(&mut *tx)
        .await?;

        let ctx = ReturnContext {
            order_status,
            order_total: order.total,
            product_id: input.product_id,
            line: line.map(|l| ReturnableLine {
                quantity: l.quantity,
                unit_price: l.unit_price,
            }),
            already_returned: i32::try_from(already_returned).unwrap_or(i32::MAX),
        };
        let plan = assess_return(&ctx, input.quantity)?;

        let reason = input
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());

        let return_id: ReturnId = sqlx::query_scalar(
            r"
            INSERT INTO shop.order_return
                (order_id, product_id, customer_id, quantity, refund_amount, reason, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING return_id
            ",
        )
        .bind(input.order_id)
        .bind(input.product_id)
        .bind(order.customer_id)
        .bind(plan.quantity)
        .bind(plan.refund_amount)
        .bind(reason)
        .bind(ReturnStatus::Completed.as_str())
        .fetch_one(&mut *tx)
        .await?;

        lock_products(&mut tx, &[input.product_id]).await?;
        adjust_stock(&mut tx, &[(input.product_id, plan.quantity)]).await?;

        sqlx::query(
            r"
            UPDATE shop.sales_order
            SET total = $2, status = $3, updated_at = NOW()
            WHERE order_id = $1
            ",
        )
        .bind(input.order_id)
        .bind(plan.new_total)
        .bind(plan.new_status.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            %return_id,
            quantity = plan.quantity,
            refund = %plan.refund_amount,
            new_status = %plan.new_status,
            "Return processed"
        );

        Ok(ReturnReceipt {
            return_id,
            order_id: input.order_id,
            new_total: plan.new_total,
            new_status: plan.new_status,
            refund_amount: plan.refund_amount,
        })
    }
}
