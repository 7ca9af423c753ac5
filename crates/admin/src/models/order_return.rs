//! Returns recorded against order lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stern_core::{CustomerId, OrderId, OrderStatus, ProductId, ReturnId, ReturnStatus};

/// A stored return.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReturn {
    pub return_id: ReturnId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub customer_id: CustomerId,
    pub quantity: i32,
    pub refund_amount: Decimal,
    pub reason: Option<String>,
    pub status: ReturnStatus,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/returns`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReturnInput {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub reason: Option<String>,
}

/// Response of a processed return.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnReceipt {
    pub return_id: ReturnId,
    pub order_id: OrderId,
    pub new_total: Decimal,
    pub new_status: OrderStatus,
    pub refund_amount: Decimal,
}

/// Query of `GET /api/returns`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnFilter {
    pub order_id: Option<OrderId>,
}
