//! Order Transaction Manager: create, edit and delete orders together with
//! the stock they consume.
//!
//! Each operation is one transaction. The order row and every product row an
//! operation validates against are locked `FOR UPDATE` (products in ascending
//! id order) before any check runs, so concurrent edits of the same order or
//! product serialize and a stock check cannot be invalidated before the
//! decrement lands. Validation happens in [`stern_core::order::price_order`]
//! before the first write; any error rolls the transaction back.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use stern_core::db::{adjust_stock, insert_lines, insert_order, lock_products, taken_stock};
use stern_core::order::{
    PricedOrder, PricingPolicy, price_order, referenced_products, restore_stock,
};
use stern_core::{CurrencyCode, CustomerId, OrderId, OrderLineId, OrderStatus, ProductId};

use super::{RepositoryError, conflict_code};
use crate::models::order::{
    CreateOrderInput, CreatedOrder, Order, OrderLine, UNKNOWN_CUSTOMER, UpdateOrderInput,
    UpdatedOrder,
};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    order_id: i64,
    customer_id: i64,
    customer_name: Option<String>,
    order_date: DateTime<Utc>,
    status: String,
    subtotal: Decimal,
    discount: Decimal,
    shipping: Decimal,
    total: Decimal,
    currency: String,
    payment_method: Option<String>,
    payment_txn_id: Option<String>,
    payment_status: Option<String>,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Result<Order, RepositoryError> {
        let status = self.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", self.order_id))
        })?;
        let currency = self.currency.parse::<CurrencyCode>().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", self.order_id))
        })?;

        Ok(Order {
            order_id: OrderId::new(self.order_id),
            customer_id: CustomerId::new(self.customer_id),
            customer_name: self
                .customer_name
                .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_owned()),
            order_date: self.order_date,
            status,
            subtotal: self.subtotal,
            discount: self.discount,
            shipping: self.shipping,
            total: self.total,
            currency,
            payment_method: self.payment_method,
            payment_txn_id: self.payment_txn_id,
            payment_status: self.payment_status,
            item_count: lines.len(),
            lines,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    order_line_id: i64,
    order_id: i64,
    product_id: Option<i64>,
    product_name: String,
    quantity: i32,
    unit_price: Decimal,
    discount: Decimal,
    line_subtotal: Decimal,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        Self {
            order_line_id: OrderLineId::new(row.order_line_id),
            product_id: row.product_id.map(ProductId::new),
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            discount: row.discount,
            line_subtotal: row.line_subtotal,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LockedOrderRow {
    status: String,
}

const ORDER_SELECT: &str = r"
    SELECT o.order_id, o.customer_id, c.name AS customer_name, o.order_date, o.status,
           o.subtotal, o.discount, o.shipping, o.total, o.currency,
           o.payment_method, o.payment_txn_id, o.payment_status
    FROM shop.sales_order o
    LEFT JOIN shop.customer c ON c.customer_id = o.customer_id
";

const LINE_SELECT: &str = r"
    SELECT order_line_id, order_id, product_id, product_name, quantity,
           unit_price, discount, line_subtotal
    FROM shop.order_line
";

// =============================================================================
// Transaction Steps
// =============================================================================
//
// These take a connection borrowed from an open transaction. Product locking,
// line inserts and stock moves live in `stern_core::db`.

/// Lock an order row and return its status.
async fn lock_order(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<OrderStatus, RepositoryError> {
    let row = sqlx::query_as::<_, LockedOrderRow>(
        "SELECT status FROM shop.sales_order WHERE order_id = $1 FOR UPDATE",
    )
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| RepositoryError::NotFound(format!("order {order_id}")))?;

    row.status
        .parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("order {order_id}: {e}")))
}

/// Quantities currently on the order, per product.
async fn current_quantities(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Vec<(ProductId, i32)>, RepositoryError> {
    let rows: Vec<(Option<i64>, i32)> =
        sqlx::query_as("SELECT product_id, quantity FROM shop.order_line WHERE order_id = $1")
            .bind(order_id)
            .fetch_all(&mut *conn)
            .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(product_id, quantity)| product_id.map(|id| (ProductId::new(id), quantity)))
        .collect())
}

async fn has_returns(conn: &mut PgConnection, order_id: OrderId) -> Result<bool, RepositoryError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM shop.order_return WHERE order_id = $1)",
    )
    .bind(order_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(exists)
}

/// Net stock change when an order's lines are replaced: old quantities come
/// back, new quantities go out.
fn net_stock_deltas(old: &[(ProductId, i32)], new: &PricedOrder) -> Vec<(ProductId, i32)> {
    let mut net: BTreeMap<ProductId, i32> = BTreeMap::new();
    for &(id, quantity) in old {
        *net.entry(id).or_default() += quantity;
    }
    for (id, quantity) in new.stock_deltas() {
        *net.entry(id).or_default() -= quantity;
    }
    net.into_iter().collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List orders with their lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails, or
    /// `RepositoryError::DataCorruption` for an unreadable status.
    pub async fn list(&self) -> Result<Vec<Order>, RepositoryError> {
        let headers = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} ORDER BY o.created_at DESC, o.order_id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i64> = headers.iter().map(|h| h.order_id).collect();
        let line_rows = sqlx::query_as::<_, OrderLineRow>(&format!(
            "{LINE_SELECT} WHERE order_id = ANY($1) ORDER BY order_line_id"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut lines_by_order: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for row in line_rows {
            lines_by_order
                .entry(row.order_id)
                .or_default()
                .push(row.into());
        }

        headers
            .into_iter()
            .map(|header| {
                let lines = lines_by_order.remove(&header.order_id).unwrap_or_default();
                header.into_order(lines)
            })
            .collect()
    }

    /// Get one order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn get(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let header = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE o.order_id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("order {id}")))?;

        let lines = sqlx::query_as::<_, OrderLineRow>(&format!(
            "{LINE_SELECT} WHERE order_id = $1 ORDER BY order_line_id"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        header.into_order(lines.into_iter().map(OrderLine::from).collect())
    }

    /// Create an order, its lines, and take the ordered units out of stock.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::Validation` for an empty item list, a non-positive
    ///   quantity, an unknown or inactive product, or a refunded status
    /// - `RepositoryError::NotFound` if the customer does not exist
    /// - `RepositoryError::Conflict` (`INSUFFICIENT_STOCK`) if a product lacks stock
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    pub async fn create(&self, input: &CreateOrderInput) -> Result<CreatedOrder, RepositoryError> {
        let status = input.status.unwrap_or(OrderStatus::Paid);
        if !status.is_manually_assignable() {
            return Err(RepositoryError::Validation(format!(
                "orders cannot be created as {status}"
            )));
        }
        if input.items.is_empty() {
            return Err(RepositoryError::Validation(
                "customerId and items are required".to_owned(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let customer_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM shop.customer WHERE customer_id = $1)",
        )
        .bind(input.customer_id)
        .fetch_one(&mut *tx)
        .await?;
        if !customer_exists {
            return Err(RepositoryError::NotFound(format!(
                "customer {}",
                input.customer_id
            )));
        }

        let catalog = lock_products(&mut tx, &referenced_products(&input.items)).await?;
        let priced = price_order(&input.items, &catalog, PricingPolicy::Strict)?;

        let order_id = insert_order(&mut tx, input.customer_id, status, &priced).await?;
        adjust_stock(&mut tx, &taken_stock(&priced)).await?;

        tx.commit().await?;

        tracing::info!(
            %order_id,
            total = %priced.total,
            lines = priced.lines.len(),
            "Order created"
        );
        Ok(CreatedOrder { order_id })
    }

    /// Change an order's status and/or replace its items.
    ///
    /// Replacing items gives the old quantities back to stock, validates the
    /// new items against the restored levels, and takes the new quantities
    /// out, all under the same locks. A status-only edit touches nothing else.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the order does not exist
    /// - `RepositoryError::Validation` for nothing to change, a refunded target
    ///   status, or invalid items
    /// - `RepositoryError::Conflict` if the order is already refunded, has
    ///   returns recorded (when replacing items), or stock is insufficient
    #[instrument(skip(self, input), fields(order_id = %input.order_id))]
    pub async fn update(&self, input: &UpdateOrderInput) -> Result<UpdatedOrder, RepositoryError> {
        if input.status.is_none() && input.items.is_none() {
            return Err(RepositoryError::Validation(
                "nothing to update: provide status and/or items".to_owned(),
            ));
        }
        if let Some(status) = input.status
            && !status.is_manually_assignable()
        {
            return Err(RepositoryError::Validation(format!(
                "status {status} is only reachable by processing returns"
            )));
        }

        let mut tx = self.pool.begin().await?;

        let current = lock_order(&mut tx, input.order_id).await?;
        if current.is_refunded() {
            return Err(RepositoryError::conflict(
                conflict_code::ORDER_STATE,
                format!("order is {current}; refunded orders change only through returns"),
            ));
        }
        let status = input.status.unwrap_or(current);

        let updated = match &input.items {
            Some(items) => {
                if has_returns(&mut tx, input.order_id).await? {
                    return Err(RepositoryError::conflict(
                        conflict_code::ORDER_STATE,
                        "items cannot be replaced on an order with recorded returns",
                    ));
                }

                let old = current_quantities(&mut tx, input.order_id).await?;
                let ids: BTreeSet<ProductId> = old
                    .iter()
                    .map(|(id, _)| *id)
                    .chain(referenced_products(items))
                    .collect();
                let ids: Vec<ProductId> = ids.into_iter().collect();

                let catalog = lock_products(&mut tx, &ids).await?;
                let restored = restore_stock(catalog, old.iter().copied());
                let priced = price_order(items, &restored, PricingPolicy::Strict)?;

                adjust_stock(&mut tx, &net_stock_deltas(&old, &priced)).await?;

                sqlx::query("DELETE FROM shop.order_line WHERE order_id = $1")
                    .bind(input.order_id)
                    .execute(&mut *tx)
                    .await?;
                insert_lines(&mut tx, input.order_id, &priced).await?;

                sqlx::query(
                    r"
                    UPDATE shop.sales_order
                    SET status = $2, subtotal = $3, discount = $4, shipping = $5, total = $6,
                        updated_at = NOW()
                    WHERE order_id = $1
                    ",
                )
                .bind(input.order_id)
                .bind(status.as_str())
                .bind(priced.subtotal)
                .bind(priced.discount)
                .bind(priced.shipping)
                .bind(priced.total)
                .execute(&mut *tx)
                .await?;

                UpdatedOrder {
                    order_id: input.order_id,
                    status,
                    subtotal: priced.subtotal,
                    total: priced.total,
                    item_count: priced.lines.len(),
                }
            }
            None => {
                let (subtotal, total, item_count): (Decimal, Decimal, i64) = sqlx::query_as(
                    r"
                    UPDATE shop.sales_order o
                    SET status = $2, updated_at = NOW()
                    WHERE o.order_id = $1
                    RETURNING o.subtotal, o.total,
                              (SELECT COUNT(*) FROM shop.order_line l WHERE l.order_id = o.order_id)
                    ",
                )
                .bind(input.order_id)
                .bind(status.as_str())
                .fetch_one(&mut *tx)
                .await?;

                UpdatedOrder {
                    order_id: input.order_id,
                    status,
                    subtotal,
                    total,
                    item_count: usize::try_from(item_count).unwrap_or_default(),
                }
            }
        };

        tx.commit().await?;

        tracing::info!(
            status = %updated.status,
            total = %updated.total,
            items_replaced = input.items.is_some(),
            "Order updated"
        );
        Ok(updated)
    }

    /// Delete an order, returning its units to stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist, or an
    /// `ORDER_STATE` conflict if returns were recorded against it.
    #[instrument(skip(self))]
    pub async fn delete(&self, order_id: OrderId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        lock_order(&mut tx, order_id).await?;
        if has_returns(&mut tx, order_id).await? {
            return Err(RepositoryError::conflict(
                conflict_code::ORDER_STATE,
                "orders with recorded returns cannot be deleted",
            ));
        }

        let old = current_quantities(&mut tx, order_id).await?;
        let mut ids: Vec<ProductId> = old.iter().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        lock_products(&mut tx, &ids).await?;
        adjust_stock(&mut tx, &old).await?;

        sqlx::query("DELETE FROM shop.order_line WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM shop.sales_order WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(lines = old.len(), "Order deleted and stock restored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use stern_core::order::PricedLine;

    use super::*;

    fn priced(lines: &[(i64, i32)]) -> PricedOrder {
        PricedOrder {
            lines: lines
                .iter()
                .map(|&(id, quantity)| PricedLine {
                    product_id: ProductId::new(id),
                    product_name: format!("P{id}"),
                    quantity,
                    unit_price: dec!(10),
                    discount: Decimal::ZERO,
                    line_subtotal: dec!(10) * Decimal::from(quantity),
                })
                .collect(),
            subtotal: Decimal::ZERO,
            discount: Decimal::ZERO,
            shipping: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }

    #[test]
    fn test_net_stock_deltas_restore_then_take() {
        let old = vec![(ProductId::new(1), 3), (ProductId::new(2), 1)];
        let new = priced(&[(1, 5), (3, 2)]);

        let deltas = net_stock_deltas(&old, &new);
        assert_eq!(
            deltas,
            vec![
                (ProductId::new(1), -2),
                (ProductId::new(2), 1),
                (ProductId::new(3), -2),
            ]
        );
    }

    #[test]
    fn test_net_stock_deltas_unchanged_items_cancel_out() {
        let old = vec![(ProductId::new(1), 2)];
        let deltas = net_stock_deltas(&old, &priced(&[(1, 2)]));
        assert_eq!(deltas, vec![(ProductId::new(1), 0)]);
    }
}
