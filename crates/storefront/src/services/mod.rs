//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Customer registration, login and profile updates (Argon2id)
//! - `catalog` - Catalog reads with a short-lived cache for shared listings

pub mod auth;
pub mod catalog;
