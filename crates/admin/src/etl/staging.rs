//! Stage 1: operational schema into the staging star schema.

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use stern_core::calendar::DateAttributes;

use super::{EtlCounts, EtlError, Stage, Step, acquire_stage_lock, step_failed};

const STAGE: Stage = Stage::Staging;

/// Run stage 1 in a single transaction.
///
/// # Errors
///
/// Returns [`EtlError`] when the transaction cannot start or commit, or a
/// step fails. Nothing is persisted in either case.
#[instrument(skip(pool))]
pub async fn run(pool: &PgPool) -> Result<EtlCounts, EtlError> {
    tracing::info!("Staging ETL started");

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
    tracing::info!(inserted = counts.customers, "Staged customers");

    counts.products = load_products(&mut tx)
        .await
        .map_err(step_failed(STAGE, Step::Products, counts))?;
    tracing::info!(inserted = counts.products, "Staged products");

    counts.dates = load_dates(&mut tx)
        .await
        .map_err(step_failed(STAGE, Step::Dates, counts))?;
    tracing::info!(inserted = counts.dates, "Staged dates");

    counts.sales = reload_sales(&mut tx)
        .await
        .map_err(step_failed(STAGE, Step::Sales, counts))?;
    tracing::info!(inserted = counts.sales, "Reloaded staged sales");

    tx.commit().await.map_err(|source| EtlError::Commit {
        stage: STAGE,
        completed: counts,
        source,
    })?;

    tracing::info!(total = counts.total(), "Staging ETL finished");
    Ok(counts)
}

/// Active customers whose natural key is not staged yet.
async fn load_customers(conn: &mut PgConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r"
        INSERT INTO staging.dim_customer
            (name, city, region, country, email, signup_date, active)
        SELECT c.name, c.city, c.region, c.country, c.email,
               (c.signup_date AT TIME ZONE 'UTC')::date, c.active
        FROM shop.customer c
        WHERE c.active
          AND NOT EXISTS (
              SELECT 1 FROM staging.dim_customer d
              WHERE d.name = c.name
                AND COALESCE(d.city, '') = COALESCE(c.city, '')
                AND COALESCE(d.region, '') = COALESCE(c.region, '')
                AND COALESCE(d.country, '') = COALESCE(c.country, '')
                AND COALESCE(d.email, '') = COALESCE(c.email, '')
          )
        ORDER BY c.customer_id
        ",
    )
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Active products whose natural key is not staged yet.
///
/// Two active products sharing name, category and price stage as one row.
async fn load_products(conn: &mut PgConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r"
        INSERT INTO staging.dim_product (name, category, price, active)
        SELECT DISTINCT ON (p.name, COALESCE(p.category, ''), p.price)
               p.name, p.category, p.price, p.active
        FROM shop.product p
        WHERE p.active
          AND NOT EXISTS (
              SELECT 1 FROM staging.dim_product d
              WHERE d.name = p.name
                AND COALESCE(d.category, '') = COALESCE(p.category, '')
                AND d.price = p.price
          )
        ORDER BY p.name, COALESCE(p.category, ''), p.price, p.product_id
        ",
    )
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Order dates missing from the date dimension, with derived attributes.
async fn load_dates(conn: &mut PgConnection) -> Result<u64, sqlx::Error> {
    let missing: Vec<NaiveDate> = sqlx::query_scalar(
        r"
        SELECT DISTINCT (o.order_date AT TIME ZONE 'UTC')::date AS full_date
        FROM shop.sales_order o
        WHERE NOT EXISTS (
            SELECT 1 FROM staging.dim_date d
            WHERE d.full_date = (o.order_date AT TIME ZONE 'UTC')::date
        )
        ORDER BY full_date
        ",
    )
    .fetch_all(&mut *conn)
    .await?;

    if missing.is_empty() {
        return Ok(0);
    }

    let rows = DateColumns::from_dates(&missing);
    let result = sqlx::query(
        r"
        INSERT INTO staging.dim_date
            (full_date, year, month, day, quarter, month_name, day_name, is_weekend)
        SELECT * FROM UNNEST(
            $1::date[], $2::int[], $3::int[], $4::int[], $5::int[],
            $6::text[], $7::text[], $8::bool[]
        )
        ",
    )
    .bind(&rows.full_date)
    .bind(&rows.year)
    .bind(&rows.month)
    .bind(&rows.day)
    .bind(&rows.quarter)
    .bind(&rows.month_name)
    .bind(&rows.day_name)
    .bind(&rows.is_weekend)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Truncate the staged facts and reload one row per order line.
///
/// Lines are resolved to staged dimensions by natural key; lines whose
/// customer or product was never staged (inactive) are skipped.
async fn reload_sales(conn: &mut PgConnection) -> Result<u64, sqlx::Error> {
    sqlx::query("TRUNCATE TABLE staging.fact_sales RESTART IDENTITY")
        .execute(&mut *conn)
        .await?;

    let result = sqlx::query(
        r"
        INSERT INTO staging.fact_sales
            (customer_sk, product_sk, date_sk, quantity, unit_price, line_subtotal,
             discount, shipping, order_total, status, currency)
        SELECT dc.customer_sk, dp.product_sk, dd.date_sk,
               l.quantity, l.unit_price, l.line_subtotal,
               o.discount, o.shipping, o.total, o.status, o.currency
        FROM shop.sales_order o
        JOIN shop.order_line l ON l.order_id = o.order_id
        JOIN shop.customer c ON c.customer_id = o.customer_id
        JOIN shop.product p ON p.product_id = l.product_id
        JOIN LATERAL (
            SELECT d.customer_sk FROM staging.dim_customer d
            WHERE d.name = c.name
              AND COALESCE(d.city, '') = COALESCE(c.city, '')
              AND COALESCE(d.region, '') = COALESCE(c.region, '')
              AND COALESCE(d.country, '') = COALESCE(c.country, '')
              AND COALESCE(d.email, '') = COALESCE(c.email, '')
            ORDER BY d.customer_sk
            LIMIT 1
        ) dc ON TRUE
        JOIN LATERAL (
            SELECT d.product_sk FROM staging.dim_product d
            WHERE d.name = p.name
              AND COALESCE(d.category, '') = COALESCE(p.category, '')
              AND d.price = p.price
            ORDER BY d.product_sk
            LIMIT 1
        ) dp ON TRUE
        JOIN staging.dim_date dd ON dd.full_date = (o.order_date AT TIME ZONE 'UTC')::date
        ORDER BY o.order_id, l.order_line_id
        ",
    )
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Date attributes pivoted into one array per column for `UNNEST`.
#[derive(Debug, Default)]
struct DateColumns {
    full_date: Vec<NaiveDate>,
    year: Vec<i32>,
    month: Vec<i32>,
    day: Vec<i32>,
    quarter: Vec<i32>,
    month_name: Vec<&'static str>,
    day_name: Vec<&'static str>,
    is_weekend: Vec<bool>,
}

impl DateColumns {
    fn from_dates(dates: &[NaiveDate]) -> Self {
        let mut columns = Self::default();
        for attrs in dates.iter().copied().map(DateAttributes::from_date) {
            columns.full_date.push(attrs.date);
            columns.year.push(attrs.year);
            columns.month.push(attrs.month);
            columns.day.push(attrs.day);
            columns.quarter.push(attrs.quarter);
            columns.month_name.push(attrs.month_name);
            columns.day_name.push(attrs.day_name);
            columns.is_weekend.push(attrs.is_weekend);
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_columns_stay_aligned() {
        let dates = [
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap_or_default(),
            NaiveDate::from_ymd_opt(2025, 11, 3).unwrap_or_default(),
        ];
        let columns = DateColumns::from_dates(&dates);

        assert_eq!(columns.full_date, dates);
        assert_eq!(columns.quarter, vec![1, 4]);
        assert_eq!(columns.month_name, vec!["Marzo", "Noviembre"]);
        assert_eq!(columns.day_name, vec!["Sábado", "Lunes"]);
        assert_eq!(columns.is_weekend, vec![true, false]);
    }
}
