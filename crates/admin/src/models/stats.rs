//! Dashboard headline numbers.

use rust_decimal::Decimal;
use serde::Serialize;

/// Totals shown at the top of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_customers: i64,
    pub total_products: i64,
    pub total_orders: i64,
    /// Sum of totals of paid and (partially) refunded orders, net of refunds.
    pub total_revenue: Decimal,
}
