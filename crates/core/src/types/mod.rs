//! Core types for Stern.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod delete_mode;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use delete_mode::{DeleteMode, DeleteModeError};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price, format_money};
pub use status::*;
