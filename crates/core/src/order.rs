//! Order pricing and stock validation.
//!
//! [`price_order`] turns requested items into priced order lines against a
//! snapshot of the referenced products. It performs every check an order
//! needs before anything is written: quantities, existence, availability and
//! stock. The admin order manager and storefront checkout both call it inside
//! their transaction after locking the product rows, then persist the result.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// A requested `(product, quantity)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Product facts needed to price an order, as read under lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub active: bool,
}

/// How to treat items that cannot be ordered as requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingPolicy {
    /// Any bad item fails the whole order (admin order entry).
    Strict,
    /// Missing or inactive products are dropped and quantities below 1 are
    /// raised to 1 (storefront checkout). Stock is still enforced.
    Lenient,
}

/// Why an order could not be priced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("order must contain at least one item")]
    Empty,

    #[error("invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: i32 },

    #[error("product {0} not found")]
    UnknownProduct(ProductId),

    #[error("product {0} is not available")]
    InactiveProduct(ProductId),

    #[error("insufficient stock for {name}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        available: i32,
        requested: i32,
    },
}

/// One priced order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub line_subtotal: Decimal,
}

/// The result of pricing: lines plus header amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl PricedOrder {
    /// Units to take out of stock, per product.
    pub fn stock_deltas(&self) -> impl Iterator<Item = (ProductId, i32)> + '_ {
        self.lines.iter().map(|l| (l.product_id, l.quantity))
    }
}

/// Merge repeated products into one item each, preserving first-seen order.
///
/// An order holds at most one line per product; returns look lines up by
/// product.
#[must_use]
pub fn merge_items(items: &[OrderItem]) -> Vec<OrderItem> {
    let mut merged: Vec<OrderItem> = Vec::with_capacity(items.len());
    for item in items {
        match merged.iter_mut().find(|m| m.product_id == item.product_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
            None => merged.push(*item),
        }
    }
    merged
}

/// Product ids referenced by `items`, sorted and deduplicated.
///
/// Callers lock product rows in this order.
#[must_use]
pub fn referenced_products(items: &[OrderItem]) -> Vec<ProductId> {
    let mut ids: Vec<ProductId> = items.iter().map(|i| i.product_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Price `items` against `catalog`.
///
/// Line subtotal is `unit_price × quantity`; the header subtotal is the sum of
/// line subtotals, and `total = subtotal − discount + shipping` with discount
/// and shipping currently zero.
///
/// # Errors
///
/// Returns a [`PricingError`] for the first item that fails validation, or
/// [`PricingError::Empty`] when no orderable item remains.
pub fn price_order(
    items: &[OrderItem],
    catalog: &BTreeMap<ProductId, ProductSnapshot>,
    policy: PricingPolicy,
) -> Result<PricedOrder, PricingError> {
    let mut lines = Vec::with_capacity(items.len());

    for item in merge_items(items) {
        let quantity = match policy {
            PricingPolicy::Strict if item.quantity <= 0 => {
                return Err(PricingError::InvalidQuantity {
                    product_id: item.product_id,
                    quantity: item.quantity,
                });
            }
            PricingPolicy::Strict => item.quantity,
            PricingPolicy::Lenient => item.quantity.max(1),
        };

        let product = match (catalog.get(&item.product_id), policy) {
            (Some(p), _) if p.active => p,
            (_, PricingPolicy::Lenient) => continue,
            (None, PricingPolicy::Strict) => {
                return Err(PricingError::UnknownProduct(item.product_id));
            }
            (Some(_), PricingPolicy::Strict) => {
                return Err(PricingError::InactiveProduct(item.product_id));
            }
        };

        if product.stock < quantity {
            return Err(PricingError::InsufficientStock {
                product_id: product.product_id,
                name: product.name.clone(),
                available: product.stock,
                requested: quantity,
            });
        }

        lines.push(PricedLine {
            product_id: product.product_id,
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price,
            discount: Decimal::ZERO,
            line_subtotal: product.price * Decimal::from(quantity),
        });
    }

    if lines.is_empty() {
        return Err(PricingError::Empty);
    }

    let subtotal: Decimal = lines.iter().map(|l| l.line_subtotal).sum();
    let discount = Decimal::ZERO;
    let shipping = Decimal::ZERO;

    Ok(PricedOrder {
        lines,
        subtotal,
        discount,
        shipping,
        total: subtotal - discount + shipping,
    })
}

/// Product stock after giving back `restore` units per product.
///
/// Used when an order's items are replaced: old quantities go back to stock
/// first, and the new items are validated against the restored levels.
#[must_use]
pub fn restore_stock(
    mut catalog: BTreeMap<ProductId, ProductSnapshot>,
    restore: impl IntoIterator<Item = (ProductId, i32)>,
) -> BTreeMap<ProductId, ProductSnapshot> {
    for (product_id, quantity) in restore {
        if let Some(product) = catalog.get_mut(&product_id) {
            product.stock = product.stock.saturating_add(quantity);
        }
    }
    catalog
}
