//! Checkout request and response bodies.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stern_core::order::OrderItem;
use stern_core::{CurrencyCode, CustomerId, Email, OrderId, OrderStatus, ProductId};

use super::customer::ContactDetails;
use super::{clean_optional, require_text};

/// Payment method recorded by mark-paid.
pub const PAYMENT_METHOD: &str = "paypal";

/// Provider status recorded when the client sends none.
pub const DEFAULT_PAYMENT_STATUS: &str = "COMPLETED";

/// Buyer details sent with the order.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutCustomer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

/// One cart line sent to checkout. A missing quantity counts as 1.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

/// Body of `POST /api/checkout/orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutInput {
    pub customer: Option<CheckoutCustomer>,
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
}

/// A validated checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCheckout {
    pub name: String,
    pub email: Email,
    pub contact: ContactDetails,
    pub items: Vec<OrderItem>,
}

impl CheckoutInput {
    /// Normalize and validate the body.
    ///
    /// # Errors
    ///
    /// Returns a message when buyer name or email is missing or the cart is empty.
    pub fn validate(self) -> Result<NewCheckout, String> {
        let customer = self
            .customer
            .ok_or_else(|| "customer name and email are required".to_owned())?;
        let name = require_text(&customer.name, "customer name")?;
        let email = Email::parse(&customer.email).map_err(|e| e.to_string())?;
        if self.items.is_empty() {
            return Err("cart is empty".to_owned());
        }

        Ok(NewCheckout {
            name,
            email,
            contact: ContactDetails {
                phone: clean_optional(customer.phone),
                city: clean_optional(customer.city),
                region: clean_optional(customer.region),
                country: clean_optional(customer.country),
                ..ContactDetails::default()
            },
            items: self
                .items
                .into_iter()
                .map(|item| OrderItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
        })
    }
}

/// Response of `POST /api/checkout/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub total: Decimal,
    pub currency: CurrencyCode,
    pub customer_id: CustomerId,
}

/// Body of `POST /api/checkout/orders/{id}/paid`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaidInput {
    #[serde(default)]
    pub transaction_id: String,
    pub status: Option<String>,
    pub raw: Option<serde_json::Value>,
}

/// A validated payment capture.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentCapture {
    pub transaction_id: String,
    pub provider_status: String,
    pub raw: Option<serde_json::Value>,
}

impl MarkPaidInput {
    /// Normalize and validate the body.
    ///
    /// # Errors
    ///
    /// Returns a message when the transaction id is blank.
    pub fn validate(self) -> Result<PaymentCapture, String> {
        let transaction_id = require_text(&self.transaction_id, "transactionId")?;
        let provider_status = clean_optional(self.status)
            .unwrap_or_else(|| DEFAULT_PAYMENT_STATUS.to_owned());

        Ok(PaymentCapture {
            transaction_id,
            provider_status,
            raw: self.raw,
        })
    }
}

/// Response of mark-paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidOrder {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub payment_txn_id: Option<String>,
    pub payment_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_body_parses_string_and_numeric_ids() {
        let input: CheckoutInput = serde_json::from_value(serde_json::json!({
            "customer": {"name": " Luis ", "email": "luis@example.com", "city": ""},
            "items": [{"productId": "7", "quantity": 2}, {"productId": 9}]
        }))
        .unwrap_or_else(|e| panic!("{e}"));

        let checkout = input.validate().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(checkout.name, "Luis");
        assert_eq!(checkout.contact.city, None);
        assert_eq!(checkout.items.len(), 2);
        assert_eq!(checkout.items[1].product_id, ProductId::new(9));
        assert_eq!(checkout.items[1].quantity, 1);
    }

    #[test]
    fn test_checkout_requires_customer_and_items() {
        let missing_customer = CheckoutInput {
            customer: None,
            items: vec![],
        };
        assert!(missing_customer.validate().is_err());

        let empty_cart = CheckoutInput {
            customer: Some(CheckoutCustomer {
                name: "Luis".into(),
                email: "luis@example.com".into(),
                phone: None,
                city: None,
                region: None,
                country: None,
            }),
            items: vec![],
        };
        assert_eq!(empty_cart.validate(), Err("cart is empty".to_owned()));
    }

    #[test]
    fn test_mark_paid_defaults_provider_status() {
        let capture = MarkPaidInput {
            transaction_id: " 9XK ".into(),
            status: None,
            raw: None,
        }
        .validate()
        .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(capture.transaction_id, "9XK");
        assert_eq!(capture.provider_status, DEFAULT_PAYMENT_STATUS);
    }
}
