//! Sales / cancellation partitioning.
//!
//! Cancellation events are transactions with a negative quantity. The two
//! resulting tables feed different paths: sales drive RFM/ABC/elasticity,
//! cancellations drive the reverse-logistics views and the customer
//! cancellation profile.

use crate::error::{DataError, Result};
use marlow_core::schema::{self, QUANTITY};
use polars::prelude::*;
use tracing::debug;

/// A transaction table partitioned into sales and cancellation events.
#[derive(Debug, Clone)]
pub struct SplitTransactions {
    /// Rows with a non-negative quantity.
    pub sales: DataFrame,
    /// Rows with a negative quantity.
    pub cancellations: DataFrame,
}

/// Partition a raw transaction table on the sign of the quantity column.
pub fn partition_by_quantity_sign(transactions: &DataFrame) -> Result<SplitTransactions> {
    if !schema::has_column(transactions, QUANTITY) {
        return Err(DataError::Parse(format!(
            "transaction table has no '{QUANTITY}' column"
        )));
    }

    let sales = transactions
        .clone()
        .lazy()
        .filter(col(QUANTITY).gt_eq(lit(0)))
        .collect()?;
    let cancellations = transactions
        .clone()
        .lazy()
        .filter(col(QUANTITY).lt(lit(0)))
        .collect()?;

    debug!(
        sales = sales.height(),
        cancellations = cancellations.height(),
        "partitioned transactions by quantity sign"
    );

    Ok(SplitTransactions {
        sales,
        cancellations,
    })
}
