//! Status enums for orders and returns.
//!
//! Statuses are stored as `TEXT` with a `CHECK` constraint and travel over the
//! API in their Spanish wire form (`pagado`, `reembolsado_parcial`, ...).

use serde::{Deserialize, Serialize};

/// Error returned when a stored or submitted status string is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} status: {value:?}")]
pub struct StatusParseError {
    kind: &'static str,
    value: String,
}

/// Order lifecycle status.
///
/// Checkout creates orders as [`Pending`](Self::Pending); payment capture
/// moves them to [`Paid`](Self::Paid). The two refunded states are reached
/// only by processing returns, never by editing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "pagado")]
    Paid,
    #[serde(rename = "cancelado")]
    Cancelled,
    #[serde(rename = "reembolsado_parcial")]
    PartiallyRefunded,
    #[serde(rename = "reembolsado_total")]
    Refunded,
}

impl OrderStatus {
    /// Wire and storage form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pendiente",
            Self::Paid => "pagado",
            Self::Cancelled => "cancelado",
            Self::PartiallyRefunded => "reembolsado_parcial",
            Self::Refunded => "reembolsado_total",
        }
    }

    /// Whether a refund has been recorded against the order.
    #[must_use]
    pub const fn is_refunded(self) -> bool {
        matches!(self, Self::PartiallyRefunded | Self::Refunded)
    }

    /// Whether returns may still be processed against the order.
    #[must_use]
    pub const fn accepts_returns(self) -> bool {
        matches!(self, Self::Paid | Self::PartiallyRefunded)
    }

    /// Whether an admin may set this status directly when editing an order.
    #[must_use]
    pub const fn is_manually_assignable(self) -> bool {
        !self.is_refunded()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendiente" => Ok(Self::Pending),
            "pagado" => Ok(Self::Paid),
            "cancelado" => Ok(Self::Cancelled),
            "reembolsado_parcial" => Ok(Self::PartiallyRefunded),
            "reembolsado_total" => Ok(Self::Refunded),
            _ => Err(StatusParseError {
                kind: "order",
                value: s.to_owned(),
            }),
        }
    }
}

/// Status recorded on a return.
///
/// Returns are processed synchronously, so every stored return is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReturnStatus {
    #[default]
    #[serde(rename = "completada")]
    Completed,
}

impl ReturnStatus {
    /// Wire and storage form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completada",
        }
    }
}

impl std::fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReturnStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completada" => Ok(Self::Completed),
            _ => Err(StatusParseError {
                kind: "return",
                value: s.to_owned(),
            }),
        }
    }
}
