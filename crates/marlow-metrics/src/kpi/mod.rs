//! Operational KPI aggregations
//!
//! Reporting views over the transaction table: sales trends, product
//! rankings, market share and reverse-logistics impact. These answer the
//! standing business questions around the core analytics; each returns a
//! small in-memory result table.

pub mod cancellations;
pub mod markets;
pub mod products;
pub mod sales;

pub use cancellations::{cancellation_summary, top_cancelled_products};
pub use markets::{customer_behavior, market_share_by_country, units_per_order};
pub use products::{
    pricing_analysis, product_matrix, top_products_by_quantity, top_products_by_revenue,
};
pub use sales::{monthly_revenue, yearly_revenue};

use serde::{Deserialize, Serialize};

/// Configuration shared by the KPI aggregations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiConfig {
    /// Stock codes that represent fees or adjustments rather than products,
    /// excluded from product rankings.
    pub excluded_stock_codes: Vec<String>,
    /// Market excluded by the international market-share view.
    pub domestic_market: String,
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            excluded_stock_codes: ["POST", "D", "M", "BANK CHARGES", "ADJUST", "ADJUST2"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            domestic_market: "United Kingdom".to_string(),
        }
    }
}
