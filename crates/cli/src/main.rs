//! Stern CLI - migrations, ETL and demo data.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! stern migrate
//!
//! # Run the analytics ETL
//! stern etl staging
//! stern etl warehouse
//! stern etl all
//!
//! # Insert demo catalog data (idempotent)
//! stern seed
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use stern_admin::etl::Stage;

mod commands;

#[derive(Parser)]
#[command(name = "stern")]
#[command(author, version, about = "Stern operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Run the analytics ETL
    Etl {
        #[command(subcommand)]
        target: EtlTarget,
    },
    /// Insert demo categories, products and a customer
    Seed,
}

#[derive(Subcommand)]
enum EtlTarget {
    /// Operational schema into staging
    Staging,
    /// Staging into the warehouse
    Warehouse,
    /// Staging, then warehouse
    All,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Etl { target } => match target {
            EtlTarget::Staging => commands::etl::stage(Stage::Staging).await,
            EtlTarget::Warehouse => commands::etl::stage(Stage::Warehouse).await,
            EtlTarget::All => commands::etl::all().await,
        },
        Commands::Seed => commands::seed::run().await,
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_etl_all() {
        let cli = Cli::try_parse_from(["stern", "etl", "all"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Etl {
                target: EtlTarget::All
            }
        ));
    }
}
