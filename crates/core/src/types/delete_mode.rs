//! Explicit delete mode for customers and products.

use serde::{Deserialize, Serialize};

/// Error returned for an unknown delete mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("mode must be \"hard\" or \"soft\", got {0:?}")]
pub struct DeleteModeError(pub String);

/// How a delete request should be carried out.
///
/// A hard delete removes the row and fails with a conflict when other rows
/// still reference it. A soft delete only deactivates the row. The caller
/// always chooses; a failed hard delete is never downgraded automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    Hard,
    Soft,
}

impl std::fmt::Display for DeleteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hard => write!(f, "hard"),
            Self::Soft => write!(f, "soft"),
        }
    }
}

impl std::str::FromStr for DeleteMode {
    type Err = DeleteModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hard" => Ok(Self::Hard),
            "soft" => Ok(Self::Soft),
            _ => Err(DeleteModeError(s.to_owned())),
        }
    }
}
