//! Stern Core - Shared domain types and business rules.
//!
//! This crate is used by every Stern component:
//! - `storefront` - Public catalog, cart, checkout and customer accounts
//! - `admin` - Back-office API (orders, returns, ETL, catalog management)
//! - `cli` - Command-line tools for migrations, ETL runs and seeding
//!
//! # Architecture
//!
//! The core crate contains types and pure functions - no HTTP, and no
//! database access outside the `postgres`-gated `db` module. Everything
//! that decides *what* happens to an order, a return or a cart lives here so
//! it can be tested without a database; the binaries only load rows, call
//! these functions, and write the result back inside a transaction.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, money and statuses
//! - [`cart`] - The client-held cart store with injectable persistence
//! - [`catalog`] - Display shaping for products (discounts, images, slugs)
//! - [`order`] - Order pricing and stock validation
//! - [`returns`] - Return assessment and refund computation
//! - [`calendar`] - Date-dimension attributes for the analytics schemas
//! - `db` - Order, line and stock statements shared by admin and storefront
//!   (`postgres` feature)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod calendar;
pub mod cart;
pub mod catalog;
#[cfg(feature = "postgres")]
pub mod db;
pub mod order;
pub mod returns;
pub mod types;

pub use types::*;
