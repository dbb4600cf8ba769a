//! Market and customer-behavior KPIs.

use super::KpiConfig;
use marlow_core::schema::{self, COUNTRY, CUSTOMER_ID, INVOICE, QUANTITY, TOTAL_SUM};
use marlow_core::Result;
use polars::prelude::*;

const NAME: &str = "kpi_markets";

/// Revenue, volume and unique-customer counts per country, descending by
/// revenue. With `exclude_domestic` the configured home market is removed,
/// which focuses the view on international share.
pub fn market_share_by_country(
    transactions: &DataFrame,
    config: &KpiConfig,
    exclude_domestic: bool,
) -> Result<DataFrame> {
    schema::ensure_columns(transactions, &[COUNTRY, CUSTOMER_ID, QUANTITY], NAME)?;
    schema::ensure_revenue(transactions, NAME)?;

    let mut lf = schema::with_line_revenue(transactions);
    if exclude_domestic {
        lf = lf.filter(col(COUNTRY).neq(lit(config.domestic_market.as_str())));
    }

    Ok(lf
        .group_by_stable([col(COUNTRY)])
        .agg([
            col(TOTAL_SUM).sum().alias("TotalRevenue"),
            col(QUANTITY).sum().cast(DataType::Int64).alias("TotalQuantity"),
            col(CUSTOMER_ID)
                .n_unique()
                .cast(DataType::Int64)
                .alias("UniqueCustomers"),
        ])
        .sort(
            ["TotalRevenue"],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .collect()?)
}

/// Average spend and average distinct-order count per customer, as a
/// one-row table. Rows without a customer id are excluded.
pub fn customer_behavior(transactions: &DataFrame) -> Result<DataFrame> {
    schema::ensure_columns(transactions, &[CUSTOMER_ID, INVOICE], NAME)?;
    schema::ensure_revenue(transactions, NAME)?;

    Ok(schema::with_line_revenue(transactions)
        .filter(col(CUSTOMER_ID).is_not_null())
        .group_by_stable([col(CUSTOMER_ID)])
        .agg([
            col(TOTAL_SUM).sum().alias("customer_revenue"),
            col(INVOICE)
                .n_unique()
                .cast(DataType::Float64)
                .alias("order_count"),
        ])
        .select([
            col("customer_revenue").mean().alias("AvgSpendPerCustomer"),
            col("order_count").mean().alias("AvgOrdersPerCustomer"),
        ])
        .collect()?)
}

/// Average units dispatched per unique invoice, as a one-row table.
pub fn units_per_order(transactions: &DataFrame) -> Result<DataFrame> {
    schema::ensure_columns(transactions, &[INVOICE, QUANTITY], NAME)?;

    Ok(transactions
        .clone()
        .lazy()
        .group_by_stable([col(INVOICE)])
        .agg([col(QUANTITY)
            .sum()
            .cast(DataType::Float64)
            .alias("items_per_order")])
        .select([col("items_per_order").mean().alias("AvgUnitsPerOrder")])
        .collect()?)
}
