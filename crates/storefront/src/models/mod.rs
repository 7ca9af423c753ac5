//! Domain models for the storefront.
//!
//! Request bodies deserialize from camelCase JSON, responses serialize to it.

pub mod checkout;
pub mod customer;
pub mod product;
pub mod review;
pub mod session;

pub use session::{CurrentCustomer, keys as session_keys};

/// Trim an optional string, mapping blank values to `None`.
pub(crate) fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Trim a required string, failing with `"{field} is required"` when blank.
pub(crate) fn require_text(value: &str, field: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{field} is required"));
    }
    Ok(trimmed.to_owned())
}
