//! Session-related types.
//!
//! Types stored in the session for authentication and cart state.

use serde::{Deserialize, Serialize};

use stern_core::{CustomerId, Email};

use super::customer::CustomerProfile;

/// Session-stored customer identity.
///
/// Minimal data stored in the session to identify the logged-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentCustomer {
    /// Customer's database ID.
    pub id: CustomerId,
    /// Customer's email address.
    pub email: Email,
    /// Display name.
    pub name: String,
}

impl From<&CustomerProfile> for CurrentCustomer {
    fn from(profile: &CustomerProfile) -> Self {
        Self {
            id: profile.customer_id,
            email: profile.email.clone(),
            name: profile.name.clone(),
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key the serialized cart is stored under.
    pub const CART: &str = stern_core::cart::CART_STORAGE_KEY;
}
