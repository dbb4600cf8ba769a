//! Cancellation Profile Merge
//!
//! Joins per-customer cancellation event counts onto a customer metrics
//! table. The join is a left join, so every customer row survives whether or
//! not the customer ever cancelled; the fill of missing counts targets the
//! count column alone, leaving categorical columns (e.g. segment labels)
//! untouched.

use marlow_core::schema::{self, CANCELLATION_COUNT, CUSTOMER_ID};
use marlow_core::{Result, Transform, TransformCategory};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the cancellation merge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationMergeConfig {
    /// Join key column present in both tables (default: `Customer ID`)
    pub customer_column: String,
    /// Name of the produced count column (default: `CancellationCount`)
    pub count_column: String,
}

impl Default for CancellationMergeConfig {
    fn default() -> Self {
        Self {
            customer_column: CUSTOMER_ID.to_string(),
            count_column: CANCELLATION_COUNT.to_string(),
        }
    }
}

/// CancellationMerger joins cancellation activity onto customer profiles
#[derive(Debug)]
pub struct CancellationMerger {
    config: CancellationMergeConfig,
}

impl CancellationMerger {
    const NAME: &'static str = "cancellation_profile";

    /// Create a merger with the default column mapping.
    pub fn new() -> Self {
        Self::with_config(CancellationMergeConfig::default())
    }

    /// Create a merger with a custom column mapping.
    pub const fn with_config(config: CancellationMergeConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub const fn config(&self) -> &CancellationMergeConfig {
        &self.config
    }

    /// Merge cancellation event counts onto the customer table.
    ///
    /// Cancellation rows with a null customer id are ignored; customers with
    /// no cancellation history get a count of 0.
    pub fn merge(&self, customers: &DataFrame, cancellations: &DataFrame) -> Result<DataFrame> {
        let customer = self.config.customer_column.as_str();
        let count = self.config.count_column.as_str();

        schema::ensure_columns(customers, &[customer], Self::NAME)?;
        schema::ensure_columns(cancellations, &[customer], Self::NAME)?;

        debug!(
            customers = customers.height(),
            cancellation_events = cancellations.height(),
            "merging cancellation counts onto customer table"
        );

        let counts = cancellations
            .clone()
            .lazy()
            .filter(col(customer).is_not_null())
            .group_by_stable([col(customer)])
            .agg([len().cast(DataType::Int64).alias(count)]);

        // Keep the customer table's row order through the join.
        let mut join_args = JoinArgs::new(JoinType::Left);
        join_args.maintain_order = MaintainOrderJoin::Left;

        let merged = customers
            .clone()
            .lazy()
            .join(counts, [col(customer)], [col(customer)], join_args)
            .with_column(col(count).fill_null(lit(0i64)))
            .collect()?;

        Ok(merged)
    }
}

impl Transform for CancellationMerger {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn category(&self) -> TransformCategory {
        TransformCategory::Customer
    }

    fn required_columns(&self) -> &[&str] {
        &[CUSTOMER_ID]
    }

    /// Counts cancellation events in `data` per customer; use
    /// [`CancellationMerger::merge`] for the two-table join form.
    fn apply(&self, data: &DataFrame) -> Result<DataFrame> {
        let customer = self.config.customer_column.as_str();
        let count = self.config.count_column.as_str();
        schema::ensure_columns(data, &[customer], Self::NAME)?;

        Ok(data
            .clone()
            .lazy()
            .filter(col(customer).is_not_null())
            .group_by_stable([col(customer)])
            .agg([len().cast(DataType::Int64).alias(count)])
            .collect()?)
    }
}

impl Default for CancellationMerger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customers() -> DataFrame {
        df!(
            CUSTOMER_ID => &["1001", "1002", "1003"],
            "Recency" => &[1i64, 9, 30],
            "Segment" => &[Some("loyal"), None, Some("at-risk")],
        )
        .unwrap()
    }

    fn cancellations() -> DataFrame {
        df!(
            CUSTOMER_ID => &[Some("1001"), Some("1001"), Some("1003"), None],
            "Invoice" => &["C1", "C2", "C3", "C4"],
            "Quantity" => &[-1i64, -2, -1, -5],
        )
        .unwrap()
    }

    #[test]
    fn test_every_customer_appears_exactly_once() {
        let merged = CancellationMerger::new()
            .merge(&customers(), &cancellations())
            .unwrap();

        assert_eq!(merged.height(), 3);
        let ids = merged.column(CUSTOMER_ID).unwrap().str().unwrap();
        assert_eq!(ids.get(0), Some("1001"));
        assert_eq!(ids.get(1), Some("1002"));
        assert_eq!(ids.get(2), Some("1003"));
    }

    #[test]
    fn test_counts_and_zero_fill() {
        let merged = CancellationMerger::new()
            .merge(&customers(), &cancellations())
            .unwrap();

        let counts = merged.column(CANCELLATION_COUNT).unwrap().i64().unwrap();
        assert_eq!(counts.get(0), Some(2));
        // Customer 1002 never cancelled: 0, not null.
        assert_eq!(counts.get(1), Some(0));
        assert_eq!(counts.get(2), Some(1));
        assert_eq!(merged.column(CANCELLATION_COUNT).unwrap().null_count(), 0);
    }

    #[test]
    fn test_fill_does_not_touch_other_columns() {
        let merged = CancellationMerger::new()
            .merge(&customers(), &cancellations())
            .unwrap();

        // The null segment label must survive the fill untouched.
        let segments = merged.column("Segment").unwrap().str().unwrap();
        assert_eq!(segments.get(0), Some("loyal"));
        assert_eq!(segments.get(1), None);
        assert_eq!(segments.get(2), Some("at-risk"));
    }

    #[test]
    fn test_null_keyed_cancellations_are_ignored() {
        let merged = CancellationMerger::new()
            .merge(&customers(), &cancellations())
            .unwrap();

        let total: i64 = merged
            .column(CANCELLATION_COUNT)
            .unwrap()
            .i64()
            .unwrap()
            .sum()
            .unwrap();
        // Four events in the table, one with a null key.
        assert_eq!(total, 3);
    }

    #[test]
    fn test_missing_join_key_is_fatal() {
        let bad = df!("Recency" => &[1i64]).unwrap();
        let err = CancellationMerger::new()
            .merge(&bad, &cancellations())
            .unwrap_err();
        assert!(matches!(
            err,
            marlow_core::TransformError::MissingColumn { .. }
        ));
    }
}
