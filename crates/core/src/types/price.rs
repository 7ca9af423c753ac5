//! Money representation using decimal arithmetic.
//!
//! Amounts are stored as `NUMERIC(12,2)` and handled as [`Decimal`] end to
//! end; no floating point is involved in pricing, refunds or totals.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes accepted by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    MXN,
    USD,
}

impl CurrencyCode {
    /// The three-letter code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MXN => "MXN",
            Self::USD => "USD",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MXN" => Ok(Self::MXN),
            "USD" => Ok(Self::USD),
            _ => Err(format!("unsupported currency: {s}")),
        }
    }
}

/// An amount with its currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (pesos, not centavos).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in pesos.
    #[must_use]
    pub const fn mxn(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::MXN)
    }

    /// Format for display, e.g. `$1,234.50`.
    #[must_use]
    pub fn display(&self) -> String {
        format_money(self.amount)
    }
}

/// Format an amount the way the storefront shows prices (es-MX grouping).
///
/// ```
/// use rust_decimal::Decimal;
/// use stern_core::format_money;
///
/// assert_eq!(format_money(Decimal::new(123_450, 2)), "$1,234.50");
/// assert_eq!(format_money(Decimal::new(-5, 0)), "-$5.00");
/// ```
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let plain = format!("{:.2}", rounded.abs());
    let (whole, cents) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}${grouped}.{cents}")
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_format_money_grouping() {
        assert_eq!(format_money(dec!(0)), "$0.00");
        assert_eq!(format_money(dec!(999.9)), "$999.90");
        assert_eq!(format_money(dec!(1000)), "$1,000.00");
        assert_eq!(format_money(dec!(1234567.891)), "$1,234,567.89");
    }

    #[test]
    fn test_format_money_rounds_half_away_from_zero() {
        assert_eq!(format_money(dec!(2.345)), "$2.35");
        assert_eq!(format_money(dec!(-2.345)), "-$2.35");
    }

    #[test]
    fn test_price_display() {
        assert_eq!(Price::mxn(dec!(199)).display(), "$199.00");
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("mxn".parse::<CurrencyCode>(), Ok(CurrencyCode::MXN));
        assert!("EUR".parse::<CurrencyCode>().is_err());
        assert_eq!(CurrencyCode::default().to_string(), "MXN");
    }
}
