//! Analytics ETL.
//!
//! Two stages, triggered on demand from the dashboard or the CLI:
//!
//! 1. [`staging::run`] - operational `shop` schema into the `staging` star
//!    schema. Dimensions are inserted when their natural key is absent; the
//!    fact table is truncated and reloaded.
//! 2. [`warehouse::run`] - `staging` into the `warehouse` star schema.
//!    Dimensions and facts are only inserted when absent, so repeated runs
//!    over unchanged staging data insert nothing.
//!
//! Each stage runs in one transaction holding a stage-specific advisory lock.
//! A failing step rolls the whole stage back; the error reports the counts of
//! the steps that had completed.
//!
//! Natural keys (missing values compare as empty strings):
//! - customer: name + city + region + country + email
//! - product: name + category + price
//! - date: calendar date

pub mod staging;
pub mod warehouse;

use std::fmt;

use serde::Serialize;
use sqlx::PgConnection;
use thiserror::Error;

/// One of the two ETL stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Staging,
    Warehouse,
}

impl Stage {
    /// Key for `pg_advisory_xact_lock`.
    const fn lock_key(self) -> i64 {
        match self {
            Self::Staging => 0x5354_4552_4E01,
            Self::Warehouse => 0x5354_4552_4E02,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Staging => "staging",
            Self::Warehouse => "warehouse",
        })
    }
}

/// Step within a stage. Serializes as the table it loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Step {
    #[serde(rename = "lock")]
    Lock,
    #[serde(rename = "dim_customer")]
    Customers,
    #[serde(rename = "dim_product")]
    Products,
    #[serde(rename = "dim_date")]
    Dates,
    #[serde(rename = "fact_sales")]
    Sales,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lock => "lock",
            Self::Customers => "dim_customer",
            Self::Products => "dim_product",
            Self::Dates => "dim_date",
            Self::Sales => "fact_sales",
        })
    }
}

/// Rows inserted by one stage run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EtlCounts {
    #[serde(rename = "clientesInserted")]
    pub customers: u64,
    #[serde(rename = "productosInserted")]
    pub products: u64,
    #[serde(rename = "fechasInserted")]
    pub dates: u64,
    #[serde(rename = "ventasInserted")]
    pub sales: u64,
}

impl EtlCounts {
    /// Total rows inserted across all steps.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.customers + self.products + self.dates + self.sales
    }
}

/// Errors from an ETL stage.
#[derive(Debug, Error)]
pub enum EtlError {
    /// The stage transaction could not be opened.
    #[error("{stage} ETL could not start: {source}")]
    Begin {
        stage: Stage,
        #[source]
        source: sqlx::Error,
    },

    /// A step failed; the stage was rolled back.
    #[error("{stage} ETL failed at {step}: {source}")]
    Step {
        stage: Stage,
        step: Step,
        /// Counts of the steps that finished before the failure. None of them
        /// were committed.
        completed: EtlCounts,
        #[source]
        source: sqlx::Error,
    },

    /// Every step ran but the commit failed.
    #[error("{stage} ETL could not commit: {source}")]
    Commit {
        stage: Stage,
        completed: EtlCounts,
        #[source]
        source: sqlx::Error,
    },
}

impl EtlError {
    /// Stage that failed.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Begin { stage, .. } | Self::Step { stage, .. } | Self::Commit { stage, .. } => {
                *stage
            }
        }
    }

    /// Step that failed, `None` when the transaction itself failed.
    #[must_use]
    pub const fn failed_step(&self) -> Option<Step> {
        match self {
            Self::Step { step, .. } => Some(*step),
            Self::Begin { .. } | Self::Commit { .. } => None,
        }
    }

    /// What failed, without the database detail.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Begin { stage, .. } => format!("{stage} ETL could not start"),
            Self::Step { stage, step, .. } => format!("{stage} ETL failed at {step}"),
            Self::Commit { stage, .. } => format!("{stage} ETL could not commit"),
        }
    }

    /// Counts completed before the failure, if any step ran.
    #[must_use]
    pub const fn completed(&self) -> Option<EtlCounts> {
        match self {
            Self::Begin { .. } => None,
            Self::Step { completed, .. } | Self::Commit { completed, .. } => Some(*completed),
        }
    }
}

/// Builds the error for a failed step, capturing the counts so far.
fn step_failed(
    stage: Stage,
    step: Step,
    completed: EtlCounts,
) -> impl FnOnce(sqlx::Error) -> EtlError {
    move |source| EtlError::Step {
        stage,
        step,
        completed,
        source,
    }
}

/// Serialize concurrent runs of the same stage until the transaction ends.
async fn acquire_stage_lock(conn: &mut PgConnection, stage: Stage) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(stage.lock_key())
        .execute(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_serialize_with_dashboard_names() {
        let counts = EtlCounts {
            customers: 3,
            products: 2,
            dates: 1,
            sales: 7,
        };
        let json = serde_json::to_value(counts).unwrap_or_default();
        assert_eq!(json["clientesInserted"], 3);
        assert_eq!(json["productosInserted"], 2);
        assert_eq!(json["fechasInserted"], 1);
        assert_eq!(json["ventasInserted"], 7);
        assert_eq!(counts.total(), 13);
    }

    #[test]
    fn test_step_error_keeps_completed_counts() {
        let completed = EtlCounts {
            customers: 4,
            products: 1,
            ..EtlCounts::default()
        };
        let err = step_failed(Stage::Staging, Step::Dates, completed)(sqlx::Error::RowNotFound);

        assert_eq!(err.completed(), Some(completed));
        assert_eq!(err.stage(), Stage::Staging);
        assert_eq!(err.failed_step(), Some(Step::Dates));
        assert_eq!(err.summary(), "staging ETL failed at dim_date");
        assert!(err.to_string().starts_with("staging ETL failed at dim_date"));
    }

    #[test]
    fn test_stage_lock_keys_differ() {
        assert_ne!(Stage::Staging.lock_key(), Stage::Warehouse.lock_key());
    }
}
