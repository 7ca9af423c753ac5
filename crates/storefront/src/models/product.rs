//! Catalog products as the storefront shows them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use stern_core::cart::CartProduct;
use stern_core::catalog::{DiscountedPrice, resolve_image};
use stern_core::{CategoryId, ProductId};

/// An active product as read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogProduct {
    pub product_id: ProductId,
    pub name: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub discount_percent: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CatalogProduct {
    /// Product facts the cart needs. The cart stores the list price, which is
    /// what checkout charges.
    #[must_use]
    pub fn to_cart_product(&self) -> CartProduct {
        CartProduct {
            product_id: self.product_id,
            name: self.name.clone(),
            category: self.category.clone(),
            price: self.price,
            stock: Some(self.stock),
            image_url: self.image_url.clone(),
        }
    }
}

/// A product shaped for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub product_id: ProductId,
    pub name: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub stock: i32,
    pub in_stock: bool,
    pub image: String,
    pub pricing: DiscountedPrice,
    pub created_at: DateTime<Utc>,
}

impl ProductView {
    /// Shape a product, resolving its image under `image_base_path`.
    #[must_use]
    pub fn new(product: &CatalogProduct, image_base_path: &str) -> Self {
        Self {
            product_id: product.product_id,
            name: product.name.clone(),
            category: product.category.clone(),
            brand: product.brand.clone(),
            description: product.description.clone(),
            stock: product.stock,
            in_stock: product.stock > 0,
            image: resolve_image(product.image_url.as_deref(), &product.name, image_base_path),
            pricing: DiscountedPrice::new(product.price, product.discount_percent),
            created_at: product.created_at,
        }
    }
}

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_id: CategoryId,
    pub name: String,
}

/// Compact search hit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub product_id: ProductId,
    pub name: String,
    pub category: Option<String>,
    pub price: Decimal,
    pub image: String,
}

impl SearchHit {
    #[must_use]
    pub fn new(product: &CatalogProduct, image_base_path: &str) -> Self {
        Self {
            product_id: product.product_id,
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price,
            image: resolve_image(product.image_url.as_deref(), &product.name, image_base_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn playera() -> CatalogProduct {
        CatalogProduct {
            product_id: ProductId::new(3),
            name: "Playera Básica".into(),
            category: Some("Ropa".into()),
            brand: None,
            description: None,
            price: dec!(200.00),
            discount_percent: dec!(15),
            stock: 4,
            image_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_view_applies_discount_and_image() {
        let view = ProductView::new(&playera(), "/products");
        assert_eq!(view.pricing.final_price, dec!(170.00));
        assert_eq!(view.pricing.badge.as_deref(), Some("-15%"));
        assert_eq!(view.image, "/products/playera-basica.jpg");
        assert!(view.in_stock);
    }

    #[test]
    fn test_cart_product_carries_list_price_and_stock() {
        let cart = playera().to_cart_product();
        assert_eq!(cart.price, dec!(200.00));
        assert_eq!(cart.stock, Some(4));
    }
}
