//! Reverse-logistics KPIs over the cancellation table.
//!
//! Cancellation rows carry negative quantities, so unit and revenue
//! figures are reported as absolute values.

use marlow_core::schema::{self, DESCRIPTION, INVOICE, QUANTITY, TOTAL_SUM};
use marlow_core::Result;
use polars::prelude::*;

const NAME: &str = "kpi_cancellations";

/// One-row summary of cancellation impact: distinct cancelled orders,
/// cancelled units and the revenue that would have been realized.
pub fn cancellation_summary(cancellations: &DataFrame) -> Result<DataFrame> {
    schema::ensure_columns(cancellations, &[INVOICE, QUANTITY], NAME)?;
    schema::ensure_revenue(cancellations, NAME)?;

    Ok(schema::with_line_revenue(cancellations)
        .select([
            col(INVOICE)
                .n_unique()
                .cast(DataType::Int64)
                .alias("TotalCancelledOrders"),
            col(QUANTITY)
                .abs()
                .sum()
                .cast(DataType::Int64)
                .alias("TotalCancelledUnits"),
            col(TOTAL_SUM).abs().sum().alias("PotentialRevenueLoss"),
        ])
        .collect()?)
}

/// Top `n` products by cancelled units, with the event count per product.
pub fn top_cancelled_products(cancellations: &DataFrame, n: usize) -> Result<DataFrame> {
    schema::ensure_columns(cancellations, &[DESCRIPTION, QUANTITY], NAME)?;

    Ok(cancellations
        .clone()
        .lazy()
        .filter(col(DESCRIPTION).is_not_null())
        .group_by_stable([col(DESCRIPTION)])
        .agg([
            len().cast(DataType::Int64).alias("CancellationEvents"),
            col(QUANTITY)
                .abs()
                .sum()
                .cast(DataType::Int64)
                .alias("TotalUnitsCancelled"),
        ])
        .sort(
            ["TotalUnitsCancelled"],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .limit(n as IdxSize)
        .collect()?)
}
