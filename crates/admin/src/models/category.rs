//! Product categories.
//!
//! Products carry their category as free text rather than a foreign key, so a
//! category row is only a curated name. Deleting one is guarded by counting
//! the products whose `category` equals that name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stern_core::CategoryId;

use super::require_text;

/// A category with the number of products that use its name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_id: CategoryId,
    pub name: String,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/categories`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryInput {
    #[serde(default)]
    pub name: String,
}

impl CreateCategoryInput {
    /// The trimmed, non-empty name.
    ///
    /// # Errors
    ///
    /// Returns a message when the name is blank.
    pub fn validated_name(&self) -> Result<String, String> {
        require_text(&self.name, "name")
    }
}
