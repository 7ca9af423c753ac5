//! Return assessment.
//!
//! [`assess_return`] decides whether a return can be accepted and what it
//! does to the order. It is evaluated inside the returns transaction with the
//! order row locked, so the prior-return sum it sees cannot move underneath it.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{OrderStatus, ProductId};

/// Everything known about one `(order, product)` pair before the return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnContext {
    pub order_status: OrderStatus,
    pub order_total: Decimal,
    pub product_id: ProductId,
    /// Quantity and unit price of the order line, `None` when the product is
    /// not part of the order.
    pub line: Option<ReturnableLine>,
    /// Sum of quantities already returned for this pair.
    pub already_returned: i32,
}

/// The purchased side of a return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnableLine {
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// The effects an accepted return has on the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundPlan {
    pub quantity: i32,
    pub refund_amount: Decimal,
    pub new_total: Decimal,
    pub new_status: OrderStatus,
}

/// Why a return was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReturnError {
    #[error("return quantity must be greater than zero")]
    InvalidQuantity,

    #[error("product {0} is not part of this order")]
    ProductNotInOrder(ProductId),

    #[error("cannot return more than {available} units of this product")]
    ExceedsAvailable { available: i32, requested: i32 },

    #[error("orders in status {0} do not accept returns")]
    NotReturnable(OrderStatus),
}

/// Units of the line that can still be returned.
#[must_use]
pub fn available_to_return(ctx: &ReturnContext) -> i32 {
    ctx.line
        .map_or(0, |line| (line.quantity - ctx.already_returned).max(0))
}

/// Validate a return of `requested` units and compute its effects.
///
/// Checks run in this order: quantity, line membership, availability, order
/// status. An exhausted line therefore reports the availability failure even
/// after the order has reached `reembolsado_total`.
///
/// # Errors
///
/// Returns the first [`ReturnError`] that applies.
pub fn assess_return(ctx: &ReturnContext, requested: i32) -> Result<RefundPlan, ReturnError> {
    if requested <= 0 {
        return Err(ReturnError::InvalidQuantity);
    }

    let line = ctx
        .line
        .ok_or(ReturnError::ProductNotInOrder(ctx.product_id))?;

    let available = available_to_return(ctx);
    if requested > available {
        return Err(ReturnError::ExceedsAvailable {
            available,
            requested,
        });
    }

    if !ctx.order_status.accepts_returns() {
        return Err(ReturnError::NotReturnable(ctx.order_status));
    }

    let refund_amount = line.unit_price * Decimal::from(requested);
    let new_total = ctx.order_total - refund_amount;
    let new_status = if new_total <= Decimal::ZERO {
        OrderStatus::Refunded
    } else {
        OrderStatus::PartiallyRefunded
    };

    Ok(RefundPlan {
        quantity: requested,
        refund_amount,
        new_total,
        new_status,
    })
}
