//! ETL commands.
//!
//! # Usage
//!
//! ```bash
//! stern etl staging     # operational -> staging
//! stern etl warehouse   # staging -> warehouse
//! stern etl all         # both, in order
//! ```

use sqlx::PgPool;

use stern_admin::etl::{self, EtlCounts, EtlError, Stage};

use super::{CommandError, connect};

fn report(stage: Stage, counts: EtlCounts) {
    tracing::info!(
        %stage,
        customers = counts.customers,
        products = counts.products,
        dates = counts.dates,
        sales = counts.sales,
        total = counts.total(),
        "ETL stage complete"
    );
}

fn report_failure(err: &EtlError) {
    let completed = err.completed().unwrap_or_default();
    tracing::error!(
        stage = %err.stage(),
        step = %err.failed_step().map_or_else(|| "transaction".to_string(), |s| s.to_string()),
        customers = completed.customers,
        products = completed.products,
        dates = completed.dates,
        sales = completed.sales,
        error = %err,
        "ETL stage rolled back"
    );
}

async fn run_stage(pool: &PgPool, stage: Stage) -> Result<(), CommandError> {
    let result = match stage {
        Stage::Staging => etl::staging::run(pool).await,
        Stage::Warehouse => etl::warehouse::run(pool).await,
    };
    match result {
        Ok(counts) => {
            report(stage, counts);
            Ok(())
        }
        Err(err) => {
            report_failure(&err);
            Err(err.into())
        }
    }
}

/// Run a single stage.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the stage fails.
pub async fn stage(stage: Stage) -> Result<(), CommandError> {
    let pool = connect().await?;
    run_stage(&pool, stage).await
}

/// Run staging then warehouse. Warehouse is skipped if staging fails.
///
/// # Errors
///
/// Returns the first stage failure.
pub async fn all() -> Result<(), CommandError> {
    let pool = connect().await?;
    run_stage(&pool, Stage::Staging).await?;
    run_stage(&pool, Stage::Warehouse).await
}
