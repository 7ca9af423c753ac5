//! Domain models for the back-office API.
//!
//! Request bodies (`*Input`) normalize themselves before they reach a
//! repository: strings are trimmed, empty optional strings become `None`,
//! and required fields are checked.

pub mod category;
pub mod customer;
pub mod order;
pub mod order_return;
pub mod product;
pub mod stats;

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_optional() {
        assert_eq!(clean_optional(Some("  Monterrey ".into())), Some("Monterrey".into()));
        assert_eq!(clean_optional(Some("   ".into())), None);
        assert_eq!(clean_optional(None), None);
    }

    #[test]
    fn test_require_text() {
        assert_eq!(require_text(" Tenis ", "name").as_deref(), Ok("Tenis"));
        assert_eq!(require_text("", "name"), Err("name is required".to_owned()));
    }
}
