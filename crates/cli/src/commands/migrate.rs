//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! stern migrate
//! ```
//!
//! Migrations live in `crates/admin/migrations/` and create the `shop`,
//! `staging`, `warehouse` and `storefront_session` schemas.

use super::{CommandError, connect};

/// Apply every pending migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    stern_admin::db::MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
