//! Client-held shopping cart.
//!
//! The cart is an ordered list of [`CartLine`]s keyed by product. It never
//! talks to the catalog or the database: callers hand it the product facts
//! they already have and the store only merges, clamps and persists.
//!
//! Persistence is injected through [`CartStorage`]. The storefront keeps the
//! serialized cart in the visitor's session; tests use [`MemoryCartStorage`];
//! contexts with nowhere to persist use [`NullCartStorage`], which turns every
//! write into a no-op while still returning the computed list.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Key the serialized cart is stored under.
pub const CART_STORAGE_KEY: &str = "stern_cart_v1";

/// Quantity ceiling used when a line carries no usable stock figure.
pub const FALLBACK_STOCK_CEILING: i32 = 99;

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub category: Option<String>,
    pub price: Decimal,
    /// Stock known when the line was last touched.
    pub stock: Option<i32>,
    pub image_url: Option<String>,
    pub quantity: i32,
}

impl CartLine {
    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    fn ceiling(&self) -> i32 {
        usable_stock(self.stock).unwrap_or(FALLBACK_STOCK_CEILING)
    }
}

/// Product facts supplied when adding to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartProduct {
    pub product_id: ProductId,
    pub name: String,
    pub category: Option<String>,
    pub price: Decimal,
    pub stock: Option<i32>,
    pub image_url: Option<String>,
}

/// Where the serialized cart lives.
pub trait CartStorage {
    /// Load the raw payload stored under `key`, if any.
    fn load(&self, key: &str) -> Option<String>;

    /// Replace the payload stored under `key`.
    fn save(&mut self, key: &str, payload: String);
}

/// Storage for contexts with no persistent store. Reads are always empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCartStorage;

impl CartStorage for NullCartStorage {
    fn load(&self, _key: &str) -> Option<String> {
        None
    }

    fn save(&mut self, _key: &str, _payload: String) {}
}

/// In-memory storage holding a single payload.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStorage {
    payload: Option<String>,
}

impl MemoryCartStorage {
    /// Empty storage.
    #[must_use]
    pub const fn new() -> Self {
        Self { payload: None }
    }

    /// Storage pre-loaded with a payload (e.g. read from a session).
    #[must_use]
    pub const fn with_payload(payload: String) -> Self {
        Self {
            payload: Some(payload),
        }
    }

    /// The current payload.
    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// Consume the storage and return its payload.
    #[must_use]
    pub fn into_payload(self) -> Option<String> {
        self.payload
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self, _key: &str) -> Option<String> {
        self.payload.clone()
    }

    fn save(&mut self, _key: &str, payload: String) {
        self.payload = Some(payload);
    }
}

/// The cart store: pure list transforms plus write-through persistence.
#[derive(Debug, Clone, Default)]
pub struct CartStore<S> {
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Wrap a storage backend.
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Current lines. A missing or unreadable payload reads as an empty cart.
    pub fn read(&self) -> Vec<CartLine> {
        self.storage
            .load(CART_STORAGE_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Add `quantity` of a product, merging into an existing line.
    pub fn add(&mut self, product: &CartProduct, quantity: i32) -> Vec<CartLine> {
        let lines = add_line(self.read(), product, quantity);
        self.write(lines)
    }

    /// Set the quantity of an existing line. Unknown products are ignored.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: i32) -> Vec<CartLine> {
        let lines = update_line_quantity(self.read(), product_id, quantity);
        self.write(lines)
    }

    /// Remove a product's line.
    pub fn remove(&mut self, product_id: ProductId) -> Vec<CartLine> {
        let lines = remove_line(self.read(), product_id);
        self.write(lines)
    }

    /// Empty the cart.
    pub fn clear(&mut self) -> Vec<CartLine> {
        self.write(Vec::new())
    }

    /// Subtotal of the stored cart.
    pub fn subtotal(&self) -> Decimal {
        cart_subtotal(&self.read())
    }

    /// Units in the stored cart.
    pub fn item_count(&self) -> i64 {
        cart_item_count(&self.read())
    }

    /// Give back the storage backend.
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn write(&mut self, lines: Vec<CartLine>) -> Vec<CartLine> {
        if let Ok(payload) = serde_json::to_string(&lines) {
            self.storage.save(CART_STORAGE_KEY, payload);
        }
        lines
    }
}

/// Merge a product into the list.
///
/// The requested quantity counts as at least 1. The merged quantity is capped
/// at the product's stock, else the line's previous stock, else
/// [`FALLBACK_STOCK_CEILING`].
#[must_use]
pub fn add_line(mut lines: Vec<CartLine>, product: &CartProduct, quantity: i32) -> Vec<CartLine> {
    let quantity = quantity.max(1);

    if let Some(line) = lines
        .iter_mut()
        .find(|line| line.product_id == product.product_id)
    {
        let ceiling = usable_stock(product.stock)
            .or_else(|| usable_stock(line.stock))
            .unwrap_or(FALLBACK_STOCK_CEILING);
        line.quantity = line.quantity.saturating_add(quantity).min(ceiling);
        line.name.clone_from(&product.name);
        line.category.clone_from(&product.category);
        line.price = product.price;
        line.image_url.clone_from(&product.image_url);
        if product.stock.is_some() {
            line.stock = product.stock;
        }
        return lines;
    }

    let ceiling = usable_stock(product.stock).unwrap_or(FALLBACK_STOCK_CEILING);
    lines.push(CartLine {
        product_id: product.product_id,
        name: product.name.clone(),
        category: product.category.clone(),
        price: product.price,
        stock: product.stock,
        image_url: product.image_url.clone(),
        quantity: quantity.min(ceiling),
    });
    lines
}

/// Clamp a line's quantity to `1..=ceiling`.
#[must_use]
pub fn update_line_quantity(
    mut lines: Vec<CartLine>,
    product_id: ProductId,
    quantity: i32,
) -> Vec<CartLine> {
    if let Some(line) = lines.iter_mut().find(|line| line.product_id == product_id) {
        line.quantity = quantity.max(1).min(line.ceiling());
    }
    lines
}

/// Drop a product's line.
#[must_use]
pub fn remove_line(mut lines: Vec<CartLine>, product_id: ProductId) -> Vec<CartLine> {
    lines.retain(|line| line.product_id != product_id);
    lines
}

/// Sum of `price × quantity` over all lines.
#[must_use]
pub fn cart_subtotal(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}

/// Total units in the cart.
#[must_use]
pub fn cart_item_count(lines: &[CartLine]) -> i64 {
    lines.iter().map(|line| i64::from(line.quantity)).sum()
}

// Zero or negative stock carries no ceiling information.
fn usable_stock(stock: Option<i32>) -> Option<i32> {
    stock.filter(|&s| s > 0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn product(id: i64, stock: Option<i32>) -> CartProduct {
        CartProduct {
            product_id: ProductId::new(id),
            name: format!("Producto {id}"),
            category: Some("Tenis".to_owned()),
            price: dec!(100),
            stock,
            image_url: None,
        }
    }

    fn store() -> CartStore<MemoryCartStorage> {
        CartStore::new(MemoryCartStorage::new())
    }

    #[test]
    fn test_read_empty_and_corrupt() {
        assert!(store().read().is_empty());

        let corrupt = CartStore::new(MemoryCartStorage::with_payload("{not json".to_owned()));
        assert!(corrupt.read().is_empty());
    }

    #[test]
    fn test_add_new_line_clamps_to_at_least_one() {
        let mut cart = store();
        let lines = cart.add(&product(1, Some(10)), 0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 1);
    }

    #[test]
    fn test_add_merges_and_caps_at_stock() {
        let mut cart = store();
        cart.add(&product(1, Some(5)), 3);
        let lines = cart.add(&product(1, Some(5)), 4);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
    }

    #[test]
    fn test_add_falls_back_to_previous_stock_then_99() {
        let mut cart = store();
        cart.add(&product(1, Some(4)), 2);
        let lines = cart.add(&product(1, None), 10);
        assert_eq!(lines[0].quantity, 4);

        let mut cart = store();
        cart.add(&product(2, None), 98);
        let lines = cart.add(&product(2, None), 5);
        assert_eq!(lines[0].quantity, FALLBACK_STOCK_CEILING);
    }

    #[test]
    fn test_add_preserves_order() {
        let mut cart = store();
        cart.add(&product(3, None), 1);
        cart.add(&product(1, None), 1);
        let lines = cart.add(&product(3, None), 1);
        let ids: Vec<i64> = lines.iter().map(|l| l.product_id.as_i64()).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_update_quantity_clamps_both_ends() {
        let mut cart = store();
        cart.add(&product(1, Some(6)), 2);
        assert_eq!(cart.update_quantity(ProductId::new(1), -3)[0].quantity, 1);
        assert_eq!(cart.update_quantity(ProductId::new(1), 50)[0].quantity, 6);
        assert_eq!(cart.update_quantity(ProductId::new(1), 4)[0].quantity, 4);
    }

    #[test]
    fn test_update_unknown_product_is_ignored() {
        let mut cart = store();
        cart.add(&product(1, None), 2);
        let lines = cart.update_quantity(ProductId::new(9), 5);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = store();
        cart.add(&product(1, None), 1);
        cart.add(&product(2, None), 1);
        assert_eq!(cart.remove(ProductId::new(1)).len(), 1);
        assert!(cart.clear().is_empty());
        assert!(cart.read().is_empty());
    }

    #[test]
    fn test_every_mutation_persists() {
        let mut cart = store();
        cart.add(&product(1, None), 2);
        let payload = cart.into_storage().into_payload().unwrap();

        let reloaded = CartStore::new(MemoryCartStorage::with_payload(payload));
        assert_eq!(reloaded.read()[0].quantity, 2);
    }

    #[test]
    fn test_null_storage_is_noop() {
        let mut cart = CartStore::new(NullCartStorage);
        let lines = cart.add(&product(1, None), 2);
        assert_eq!(lines.len(), 1);
        assert!(cart.read().is_empty());
    }

    #[test]
    fn test_totals() {
        let mut cart = store();
        cart.add(&product(1, None), 2);
        let lines = cart.add(&product(2, None), 3);
        assert_eq!(cart_subtotal(&lines), dec!(500));
        assert_eq!(cart_item_count(&lines), 5);
    }
}
