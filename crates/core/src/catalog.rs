//! Display shaping for catalog products.
//!
//! Pure helpers used by the storefront when turning product rows into the
//! JSON the catalog pages render: discounted prices and badges, formatted
//! amounts, and image URLs derived from whatever the row carries.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::types::format_money;

/// Default directory product images are served from.
pub const DEFAULT_IMAGE_BASE_PATH: &str = "/products";

const IMAGE_EXTENSION: &str = "jpg";

/// A price after applying a percentage discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountedPrice {
    pub original: Decimal,
    pub original_label: String,
    pub final_price: Decimal,
    pub final_label: String,
    /// `-15%` style badge, present only when a discount applies.
    pub badge: Option<String>,
}

impl DiscountedPrice {
    /// Apply `discount_percent` to `price`.
    ///
    /// Only discounts strictly between 0 and 100 apply; anything else leaves
    /// the price untouched.
    #[must_use]
    pub fn new(price: Decimal, discount_percent: Decimal) -> Self {
        let applies = discount_percent > Decimal::ZERO && discount_percent < Decimal::ONE_HUNDRED;
        let (final_price, badge) = if applies {
            let factor = Decimal::ONE - discount_percent / Decimal::ONE_HUNDRED;
            let discounted = (price * factor)
                .max(Decimal::ZERO)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            (discounted, Some(format!("-{}%", discount_percent.normalize())))
        } else {
            (price, None)
        };

        Self {
            original: price,
            original_label: format_money(price),
            final_price,
            final_label: format_money(final_price),
            badge,
        }
    }

    /// Whether a discount was applied.
    #[must_use]
    pub const fn has_discount(&self) -> bool {
        self.badge.is_some()
    }
}

/// Resolve the URL a product image is served from.
///
/// An absolute `http(s)` URL or a rooted path is used as-is; a bare file name
/// is placed under `base_path`; a product with no image falls back to
/// `{base_path}/{slug(name)}.jpg`, or the placeholder when the name has no
/// usable characters.
#[must_use]
pub fn resolve_image(image_url: Option<&str>, name: &str, base_path: &str) -> String {
    let base = base_path.trim_end_matches('/');

    if let Some(url) = image_url.map(str::trim).filter(|u| !u.is_empty()) {
        if url.starts_with("http://") || url.starts_with("https://") || url.starts_with('/') {
            return url.to_owned();
        }
        return format!("{base}/{url}");
    }

    let slug = slugify(name);
    if slug.is_empty() {
        format!("{base}/placeholder.{IMAGE_EXTENSION}")
    } else {
        format!("{base}/{slug}.{IMAGE_EXTENSION}")
    }
}

/// URL-safe slug: lowercase ASCII, accents folded, words joined by `-`.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() || ch == '-' {
            pending_dash = !slug.is_empty();
            continue;
        }
        let Some(folded) = fold_ascii(ch) else {
            continue;
        };
        if pending_dash {
            slug.push('-');
            pending_dash = false;
        }
        slug.push(folded);
    }

    slug
}

fn fold_ascii(ch: char) -> Option<char> {
    let folded = match ch {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        c if c.is_ascii_alphanumeric() || c == '_' => c,
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_discount_applies_inside_range() {
        let price = DiscountedPrice::new(dec!(1000), dec!(15));
        assert_eq!(price.final_price, dec!(850.00));
        assert_eq!(price.final_label, "$850.00");
        assert_eq!(price.original_label, "$1,000.00");
        assert_eq!(price.badge.as_deref(), Some("-15%"));
        assert!(price.has_discount());
    }

    #[test]
    fn test_discount_ignored_outside_range() {
        for pct in [dec!(0), dec!(100), dec!(-5), dec!(150)] {
            let price = DiscountedPrice::new(dec!(80), pct);
            assert_eq!(price.final_price, dec!(80));
            assert!(price.badge.is_none());
        }
    }

    #[test]
    fn test_discount_badge_drops_trailing_zeros() {
        let price = DiscountedPrice::new(dec!(200), dec!(12.50));
        assert_eq!(price.badge.as_deref(), Some("-12.5%"));
        assert_eq!(price.final_price, dec!(175.00));
    }

    #[test]
    fn test_resolve_image_keeps_absolute_and_rooted() {
        assert_eq!(
            resolve_image(Some("https://cdn.example.com/a.png"), "x", "/products"),
            "https://cdn.example.com/a.png"
        );
        assert_eq!(
            resolve_image(Some(" /img/tenis.jpg "), "x", "/products"),
            "/img/tenis.jpg"
        );
    }

    #[test]
    fn test_resolve_image_prefixes_bare_file_name() {
        assert_eq!(
            resolve_image(Some("gorra.webp"), "Gorra", "/products/"),
            "/products/gorra.webp"
        );
    }

    #[test]
    fn test_resolve_image_falls_back_to_slug_then_placeholder() {
        assert_eq!(
            resolve_image(None, "Sudadera Básica", "/products"),
            "/products/sudadera-basica.jpg"
        );
        assert_eq!(
            resolve_image(Some("  "), "¿?", "/products"),
            "/products/placeholder.jpg"
        );
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  Tenis Nike  Air "), "tenis-nike-air");
        assert_eq!(slugify("Café & Té"), "cafe-te");
        assert_eq!(slugify("Niño--Pequeño"), "nino-pequeno");
        assert_eq!(slugify("snake_case OK"), "snake_case-ok");
        assert_eq!(slugify("---"), "");
    }
}
