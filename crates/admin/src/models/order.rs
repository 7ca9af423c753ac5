//! Orders and order lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stern_core::order::OrderItem;
use stern_core::{CurrencyCode, CustomerId, OrderId, OrderLineId, OrderStatus, ProductId};

/// Placeholder shown when an order's customer cannot be resolved.
pub const UNKNOWN_CUSTOMER: &str = "—";

/// One line of an order, with the product facts captured at purchase time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub order_line_id: OrderLineId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub line_subtotal: Decimal,
}

/// An order header with its lines, as listed on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub currency: CurrencyCode,
    pub payment_method: Option<String>,
    pub payment_txn_id: Option<String>,
    pub payment_status: Option<String>,
    pub item_count: usize,
    pub lines: Vec<OrderLine>,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderInput {
    pub customer_id: CustomerId,
    /// Defaults to `pagado`: orders entered by staff are taken as paid.
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Body of `PATCH /api/orders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderInput {
    pub order_id: OrderId,
    pub status: Option<OrderStatus>,
    pub items: Option<Vec<OrderItem>>,
}

/// Body of `DELETE /api/orders`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOrderInput {
    pub order_id: OrderId,
}

/// Response of a successful create.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order_id: OrderId,
}

/// Response of a successful edit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedOrder {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub item_count: usize,
}
