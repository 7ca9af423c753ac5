//! Stage 2: staging star schema into the warehouse.
//!
//! Every insert is guarded by an existence check on the natural key (for
//! dimensions) or on the resolved surrogate keys plus measures (for facts),
//! so the warehouse only grows by what staging adds.

use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use super::{EtlCounts, EtlError, Stage, Step, acquire_stage_lock, step_failed};

const STAGE: Stage = Stage::Warehouse;

/// Run stage 2 in a single transaction.
///
/// # Errors
///
/// Returns [`EtlError`] when the transaction cannot start or commit, or a
/// step fails. Nothing is persisted in either case.
#[instrument(skip(pool))]
pub async fn run(pool: &PgPool) -> Result<EtlCounts, EtlError> {
    tracing::info!("Warehouse ETL started");

    let mut tx = pool
        .begin()
        .await
        .map_err(|source| EtlError::Begin { stage: STAGE, source })?;
    let mut counts = EtlCounts::default();

    acquire_stage_lock(&mut tx, STAGE)
        .await
        .map_err(step_failed(STAGE, Step::Lock, counts))?;

    counts.customers = load_customers(&mut tx)
        .await
        .map_err(step_failed(STAGE, Step::Customers, counts))?;
    tracing::info!(inserted = counts.customers, "Warehoused customers");

    counts.products = load_products(&mut tx)
        .await
        .map_err(step_failed(STAGE, Step::Products, counts))?;
    tracing::info!(inserted = counts.products, "Warehoused products");

    counts.dates = load_dates(&mut tx)
        .await
        .map_err(step_failed(STAGE, Step::Dates, counts))?;
    tracing::info!(inserted = counts.dates, "Warehoused dates");

    counts.sales = load_sales(&mut tx)
        .await
        .map_err(step_failed(STAGE, Step::Sales, counts))?;
    tracing::info!(inserted = counts.sales, "Warehoused sales");

    tx.commit().await.map_err(|source| EtlError::Commit {
        stage: STAGE,
        completed: counts,
        source,
    })?;

    tracing::info!(total = counts.total(), "Warehouse ETL finished");
    Ok(counts)
}

async fn load_customers(conn: &mut PgConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r"
        INSERT INTO warehouse.dim_customer (name, city, region, country, email)
        SELECT DISTINCT ON (s.name, COALESCE(s.city, ''), COALESCE(s.region, ''),
                            COALESCE(s.country, ''), COALESCE(s.email, ''))
               s.name, s.city, s.region, s.country, s.email
        FROM staging.dim_customer s
        WHERE NOT EXISTS (
            SELECT 1 FROM warehouse.dim_customer w
            WHERE w.name = s.name
              AND COALESCE(w.city, '') = COALESCE(s.city, '')
              AND COALESCE(w.region, '') = COALESCE(s.region, '')
              AND COALESCE(w.country, '') = COALESCE(s.country, '')
              AND COALESCE(w.email, '') = COALESCE(s.email, '')
        )
        ORDER BY s.name, COALESCE(s.city, ''), COALESCE(s.region, ''),
                 COALESCE(s.country, ''), COALESCE(s.email, ''), s.customer_sk
        ",
    )
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

async fn load_products(conn: &mut PgConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r"
        INSERT INTO warehouse.dim_product (name, category, price)
        SELECT DISTINCT ON (s.name, COALESCE(s.category, ''), s.price)
               s.name, s.category, s.price
        FROM staging.dim_product s
        WHERE NOT EXISTS (
            SELECT 1 FROM warehouse.dim_product w
            WHERE w.name = s.name
              AND COALESCE(w.category, '') = COALESCE(s.category, '')
              AND w.price = s.price
        )
        ORDER BY s.name, COALESCE(s.category, ''), s.price, s.product_sk
        ",
    )
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

async fn load_dates(conn: &mut PgConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r"
        INSERT INTO warehouse.dim_date (full_date, year, month, day, quarter)
        SELECT s.full_date, s.year, s.month, s.day, s.quarter
        FROM staging.dim_date s
        WHERE NOT EXISTS (
            SELECT 1 FROM warehouse.dim_date w WHERE w.full_date = s.full_date
        )
        ORDER BY s.full_date
        ",
    )
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Remap each staged fact to warehouse surrogate keys through the natural
/// keys of its staged dimensions, and insert it unless an identical fact
/// (same keys, quantity and total) is already warehoused.
async fn load_sales(conn: &mut PgConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r"
        INSERT INTO warehouse.fact_sales (customer_sk, product_sk, date_sk, quantity, sale_total)
        SELECT wc.customer_sk, wp.product_sk, wd.date_sk, f.quantity, f.line_subtotal
        FROM staging.fact_sales f
        JOIN staging.dim_customer sc ON sc.customer_sk = f.customer_sk
        JOIN staging.dim_product sp ON sp.product_sk = f.product_sk
        JOIN staging.dim_date sd ON sd.date_sk = f.date_sk
        JOIN LATERAL (
            SELECT w.customer_sk FROM warehouse.dim_customer w
            WHERE w.name = sc.name
              AND COALESCE(w.city, '') = COALESCE(sc.city, '')
              AND COALESCE(w.region, '') = COALESCE(sc.region, '')
              AND COALESCE(w.country, '') = COALESCE(sc.country, '')
              AND COALESCE(w.email, '') = COALESCE(sc.email, '')
            ORDER BY w.customer_sk
            LIMIT 1
        ) wc ON TRUE
        JOIN LATERAL (
            SELECT w.product_sk FROM warehouse.dim_product w
            WHERE w.name = sp.name
              AND COALESCE(w.category, '') = COALESCE(sp.category, '')
              AND w.price = sp.price
            ORDER BY w.product_sk
            LIMIT 1
        ) wp ON TRUE
        JOIN warehouse.dim_date wd ON wd.full_date = sd.full_date
        WHERE NOT EXISTS (
            SELECT 1 FROM warehouse.fact_sales w
            WHERE w.customer_sk = wc.customer_sk
              AND w.product_sk = wp.product_sk
              AND w.date_sk = wd.date_sk
              AND w.quantity = f.quantity
              AND w.sale_total = f.line_subtotal
        )
        ORDER BY f.sale_sk
        ",
    )
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}
