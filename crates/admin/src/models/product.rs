//! Catalog products as managed from the back-office.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stern_core::ProductId;

use super::{clean_optional, require_text};

/// A product row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub discount_percent: Decimal,
    pub stock: i32,
    pub active: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/products`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductInput {
    #[serde(default)]
    pub name: String,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub discount_percent: Option<Decimal>,
    pub image_url: Option<String>,
    pub active: Option<bool>,
}

/// A validated product ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub discount_percent: Decimal,
    pub image_url: Option<String>,
    pub active: bool,
}

impl CreateProductInput {
    /// Normalize and validate the body.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(self) -> Result<NewProduct, String> {
        let name = require_text(&self.name, "name")?;
        let price = self.price.ok_or_else(|| "price is required".to_owned())?;
        let stock = self.stock.unwrap_or(0);
        let discount_percent = self.discount_percent.unwrap_or(Decimal::ZERO);
        check_amounts(Some(price), Some(stock), Some(discount_percent))?;

        Ok(NewProduct {
            name,
            price,
            stock,
            category: clean_optional(self.category),
            brand: clean_optional(self.brand),
            description: clean_optional(self.description),
            discount_percent,
            image_url: clean_optional(self.image_url),
            active: self.active.unwrap_or(true),
        })
    }
}

/// Body of `PATCH /api/products/{id}`. Absent fields are left unchanged; a
/// blank optional string clears the column.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub discount_percent: Option<Decimal>,
    pub image_url: Option<String>,
    pub active: Option<bool>,
}

impl UpdateProductInput {
    /// Validate the fields that were supplied.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(mut self) -> Result<Self, String> {
        if let Some(name) = self.name.as_deref() {
            self.name = Some(require_text(name, "name")?);
        }
        check_amounts(self.price, self.stock, self.discount_percent)?;
        Ok(self)
    }
}

fn check_amounts(
    price: Option<Decimal>,
    stock: Option<i32>,
    discount_percent: Option<Decimal>,
) -> Result<(), String> {
    if price.is_some_and(|p| p < Decimal::ZERO) {
        return Err("price must not be negative".to_owned());
    }
    if stock.is_some_and(|s| s < 0) {
        return Err("stock must not be negative".to_owned());
    }
    if discount_percent.is_some_and(|d| d < Decimal::ZERO || d >= Decimal::ONE_HUNDRED) {
        return Err("discountPercent must be between 0 and 100".to_owned());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn input(json: &str) -> CreateProductInput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_create_defaults() {
        let product = input(r#"{"name":" Gorra ","price":"249.90","category":"  "}"#)
            .validate()
            .unwrap();
        assert_eq!(product.name, "Gorra");
        assert_eq!(product.price, dec!(249.90));
        assert_eq!(product.stock, 0);
        assert_eq!(product.category, None);
        assert!(product.active);
    }

    #[test]
    fn test_create_requires_name_and_price() {
        assert_eq!(
            input(r#"{"price":10}"#).validate().unwrap_err(),
            "name is required"
        );
        assert_eq!(
            input(r#"{"name":"Gorra"}"#).validate().unwrap_err(),
            "price is required"
        );
    }

    #[test]
    fn test_create_rejects_negative_values() {
        assert!(input(r#"{"name":"x","price":-1}"#).validate().is_err());
        assert!(input(r#"{"name":"x","price":1,"stock":-2}"#).validate().is_err());
        assert!(
            input(r#"{"name":"x","price":1,"discountPercent":100}"#)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_update_validates_supplied_fields_only() {
        let update: UpdateProductInput = serde_json::from_str(r#"{"active":false}"#).unwrap();
        assert!(update.validate().is_ok());

        let update: UpdateProductInput = serde_json::from_str(r#"{"name":"  "}"#).unwrap();
        assert!(update.validate().is_err());
    }
}
