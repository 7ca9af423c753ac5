//! Dashboard counters.

use rust_decimal::Decimal;
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::stats::DashboardStats;

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    total_customers: i64,
    total_products: i64,
    total_orders: i64,
    total_revenue: Decimal,
}

/// Repository for dashboard statistics.
pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    /// Create a new stats repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Headline counts for the dashboard.
    ///
    /// Revenue is the current total of orders that were paid, after refunds.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn dashboard(&self) -> Result<DashboardStats, RepositoryError> {
        let row = sqlx::query_as::<_, StatsRow>(
            r"
            SELECT
                (SELECT COUNT(*) FROM shop.customer) AS total_customers,
                (SELECT COUNT(*) FROM shop.product) AS total_products,
                (SELECT COUNT(*) FROM shop.sales_order) AS total_orders,
                (SELECT COALESCE(SUM(total), 0)::numeric(14, 2)
                   FROM shop.sales_order
                  WHERE status IN ('pagado', 'reembolsado_parcial', 'reembolsado_total')
                ) AS total_revenue
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(DashboardStats {
            total_customers: row.total_customers,
            total_products: row.total_products,
            total_orders: row.total_orders,
            total_revenue: row.total_revenue,
        })
    }
}
