//! Order statements shared by every writer of `shop.sales_order`.
//!
//! The admin order manager, the returns processor and storefront checkout all
//! lock products, write orders and move stock with these statements, so they
//! agree on lock order and column lists. Each function takes a connection
//! borrowed from a transaction the caller owns; nothing here commits.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::order::{PricedOrder, ProductSnapshot};
use crate::{CurrencyCode, CustomerId, OrderId, OrderStatus, ProductId};

#[derive(Debug, sqlx::FromRow)]
struct ProductLockRow {
    product_id: i64,
    name: String,
    price: Decimal,
    stock: i32,
    active: bool,
}

impl From<ProductLockRow> for ProductSnapshot {
    fn from(row: ProductLockRow) -> Self {
        Self {
            product_id: ProductId::new(row.product_id),
            name: row.name,
            price: row.price,
            stock: row.stock,
            active: row.active,
        }
    }
}

/// Lock the given products `FOR UPDATE` in ascending id order and return
/// their snapshots. Missing ids are simply absent from the map.
///
/// # Errors
///
/// Returns the database error if the query fails.
pub async fn lock_products(
    conn: &mut PgConnection,
    ids: &[ProductId],
) -> Result<BTreeMap<ProductId, ProductSnapshot>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(BTreeMap::new());
    }

    let rows = sqlx::query_as::<_, ProductLockRow>(
        r"
        SELECT product_id, name, price, stock, active
        FROM shop.product
        WHERE product_id = ANY($1)
        ORDER BY product_id
        FOR UPDATE
        ",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| (ProductId::new(row.product_id), ProductSnapshot::from(row)))
        .collect())
}

/// Write an order header in the default currency plus its lines.
///
/// # Errors
///
/// Returns the database error if either insert fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    customer_id: CustomerId,
    status: OrderStatus,
    priced: &PricedOrder,
) -> Result<OrderId, sqlx::Error> {
    let order_id: OrderId = sqlx::query_scalar(
        r"
        INSERT INTO shop.sales_order
            (customer_id, status, subtotal, discount, shipping, total, currency)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING order_id
        ",
    )
    .bind(customer_id)
    .bind(status.as_str())
    .bind(priced.subtotal)
    .bind(priced.discount)
    .bind(priced.shipping)
    .bind(priced.total)
    .bind(CurrencyCode::default().as_str())
    .fetch_one(&mut *conn)
    .await?;

    insert_lines(conn, order_id, priced).await?;
    Ok(order_id)
}

/// Insert the priced lines of an order.
///
/// # Errors
///
/// Returns the database error if the insert fails.
pub async fn insert_lines(
    conn: &mut PgConnection,
    order_id: OrderId,
    priced: &PricedOrder,
) -> Result<(), sqlx::Error> {
    let product_ids: Vec<ProductId> = priced.lines.iter().map(|l| l.product_id).collect();
    let names: Vec<String> = priced.lines.iter().map(|l| l.product_name.clone()).collect();
    let quantities: Vec<i32> = priced.lines.iter().map(|l| l.quantity).collect();
    let unit_prices: Vec<Decimal> = priced.lines.iter().map(|l| l.unit_price).collect();
    let discounts: Vec<Decimal> = priced.lines.iter().map(|l| l.discount).collect();
    let subtotals: Vec<Decimal> = priced.lines.iter().map(|l| l.line_subtotal).collect();

    sqlx::query(
        r"
        INSERT INTO shop.order_line
            (order_id, product_id, product_name, quantity, unit_price, discount, line_subtotal)
        SELECT $1, * FROM UNNEST(
            $2::bigint[], $3::text[], $4::int[], $5::numeric[], $6::numeric[], $7::numeric[]
        )
        ",
    )
    .bind(order_id)
    .bind(&product_ids)
    .bind(&names)
    .bind(&quantities)
    .bind(&unit_prices)
    .bind(&discounts)
    .bind(&subtotals)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Add `delta` units to each product's stock (negative to take stock out).
///
/// The `stock >= 0` check constraint backs up the validation done before.
///
/// # Errors
///
/// Returns the database error if the update fails.
pub async fn adjust_stock(
    conn: &mut PgConnection,
    deltas: &[(ProductId, i32)],
) -> Result<(), sqlx::Error> {
    let (ids, amounts): (Vec<ProductId>, Vec<i32>) = deltas
        .iter()
        .filter(|(_, delta)| *delta != 0)
        .copied()
        .unzip();
    if ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r"
        UPDATE shop.product p
        SET stock = p.stock + d.delta, updated_at = NOW()
        FROM UNNEST($1::bigint[], $2::int[]) AS d(product_id, delta)
        WHERE p.product_id = d.product_id
        ",
    )
    .bind(&ids)
    .bind(&amounts)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Stock deltas that take an order's units out of stock.
#[must_use]
pub fn taken_stock(priced: &PricedOrder) -> Vec<(ProductId, i32)> {
    priced.stock_deltas().map(|(id, q)| (id, -q)).collect()
}
