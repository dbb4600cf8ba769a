//! RFM Customer Metrics
//!
//! Aggregates one row per customer: days since the latest invoice (Recency),
//! distinct invoice count (Frequency) and summed line revenue (Monetary).
//! The recency anchor is derived from the dataset itself, so a fixed input
//! always produces the same scores.

use chrono::{DateTime, NaiveDateTime, TimeDelta};
use marlow_core::schema::{
    self, CUSTOMER_ID, FREQUENCY, INVOICE, INVOICE_DATE, MONETARY, RECENCY, TOTAL_SUM,
};
use marlow_core::{Result, Transform, TransformCategory, TransformError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the RFM calculator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RfmConfig {
    /// Customer identifier column (default: `Customer ID`)
    pub customer_column: String,
    /// Invoice identifier column (default: `Invoice`)
    pub invoice_column: String,
    /// Timestamp column (default: `InvoiceDate`)
    pub timestamp_column: String,
}

impl Default for RfmConfig {
    fn default() -> Self {
        Self {
            customer_column: CUSTOMER_ID.to_string(),
            invoice_column: INVOICE.to_string(),
            timestamp_column: INVOICE_DATE.to_string(),
        }
    }
}

/// Result of an RFM computation.
///
/// Besides the metrics table this carries the dataset-derived reference date
/// and the number of rows that were dropped for having no customer id, so
/// callers can report the exclusion instead of silently losing rows.
#[derive(Debug, Clone)]
pub struct RfmReport {
    /// One row per customer: id, `Recency`, `Frequency`, `Monetary`.
    pub metrics: DataFrame,
    /// Anchor date used for recency: max timestamp in the dataset + 1 day.
    pub reference_date: NaiveDateTime,
    /// Rows excluded before aggregation because the customer id was null.
    pub excluded_null_customers: usize,
}

/// RfmCalculator aggregates per-customer recency, frequency and monetary value
#[derive(Debug)]
pub struct RfmCalculator {
    config: RfmConfig,
}

impl RfmCalculator {
    const NAME: &'static str = "rfm_metrics";

    /// Create a calculator with the default column mapping.
    pub fn new() -> Self {
        Self::with_config(RfmConfig::default())
    }

    /// Create a calculator with a custom column mapping.
    pub const fn with_config(config: RfmConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub const fn config(&self) -> &RfmConfig {
        &self.config
    }

    /// Compute RFM metrics for every customer present in the input.
    ///
    /// Rows with a null customer id are excluded before aggregation and
    /// counted in the returned report. Frequency counts distinct invoice
    /// ids, so multi-line invoices do not inflate it.
    pub fn compute(&self, transactions: &DataFrame) -> Result<RfmReport> {
        let customer = self.config.customer_column.as_str();
        let invoice = self.config.invoice_column.as_str();
        let timestamp = self.config.timestamp_column.as_str();

        schema::ensure_columns(transactions, &[customer, invoice, timestamp], Self::NAME)?;
        schema::ensure_revenue(transactions, Self::NAME)?;

        let dtype = transactions.column(timestamp)?.dtype().clone();
        if !matches!(dtype, DataType::Datetime(_, _) | DataType::Date) {
            return Err(TransformError::InvalidColumnType {
                column: timestamp.to_string(),
                dtype: dtype.to_string(),
            });
        }

        let excluded_null_customers = transactions.column(customer)?.null_count();
        if excluded_null_customers > 0 {
            debug!(
                excluded_null_customers,
                "excluding transactions with a null customer id"
            );
        }

        let reference_date = reference_date(transactions, timestamp, Self::NAME)?;

        let metrics = schema::with_line_revenue(transactions)
            .filter(col(customer).is_not_null())
            .group_by_stable([col(customer)])
            .agg([
                (lit(reference_date) - col(timestamp).max())
                    .dt()
                    .total_days()
                    .cast(DataType::Int64)
                    .alias(RECENCY),
                col(invoice).n_unique().cast(DataType::Int64).alias(FREQUENCY),
                col(TOTAL_SUM).sum().cast(DataType::Float64).alias(MONETARY),
            ])
            .sort([customer], SortMultipleOptions::default())
            .collect()?;

        Ok(RfmReport {
            metrics,
            reference_date,
            excluded_null_customers,
        })
    }
}

impl Transform for RfmCalculator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn category(&self) -> TransformCategory {
        TransformCategory::Customer
    }

    fn required_columns(&self) -> &[&str] {
        &[CUSTOMER_ID, INVOICE, INVOICE_DATE]
    }

    fn apply(&self, data: &DataFrame) -> Result<DataFrame> {
        Ok(self.compute(data)?.metrics)
    }
}

impl Default for RfmCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Max timestamp in the dataset plus one day.
///
/// The +1 guarantees Recency >= 1 for the most recent transaction and keeps
/// the anchor independent of the wall clock.
fn reference_date(
    df: &DataFrame,
    timestamp_column: &str,
    transform: &'static str,
) -> Result<NaiveDateTime> {
    let bounds = df
        .clone()
        .lazy()
        .select([col(timestamp_column).max()])
        .collect()?;
    let value = bounds.column(timestamp_column)?.get(0)?;
    let max = datetime_value(&value).ok_or(TransformError::EmptyInput { transform })?;
    Ok(max + TimeDelta::days(1))
}

fn datetime_value(value: &AnyValue<'_>) -> Option<NaiveDateTime> {
    match value {
        AnyValue::Datetime(v, unit, _) => timestamp_to_naive(*v, *unit),
        AnyValue::DatetimeOwned(v, unit, _) => timestamp_to_naive(*v, *unit),
        AnyValue::Date(days) => {
            DateTime::from_timestamp(i64::from(*days) * 86_400, 0).map(|dt| dt.naive_utc())
        }
        _ => None,
    }
}

fn timestamp_to_naive(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let utc = match unit {
        TimeUnit::Nanoseconds => DateTime::from_timestamp_nanos(value),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value)?,
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value)?,
    };
    Some(utc.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;
    use marlow_core::schema::{PRICE, QUANTITY};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn sample() -> DataFrame {
        df!(
            CUSTOMER_ID => &[Some("1001"), Some("1001"), Some("1001"), Some("1002"), None],
            INVOICE => &["A", "A", "B", "C", "D"],
            QUANTITY => &[2i64, 1, 1, 4, 3],
            PRICE => &[5.0, 5.0, 10.0, 2.5, 1.0],
            INVOICE_DATE => &[
                at(2011, 12, 8, 10, 0),
                at(2011, 12, 8, 10, 0),
                at(2011, 12, 9, 12, 30),
                at(2011, 12, 1, 9, 15),
                at(2011, 12, 9, 12, 30),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_frequency_counts_distinct_invoices() {
        let report = RfmCalculator::new().compute(&sample()).unwrap();
        let metrics = &report.metrics;

        // Customer 1001 has three lines but only two invoices.
        let frequency = metrics.column(FREQUENCY).unwrap().i64().unwrap();
        assert_eq!(frequency.get(0), Some(2));
        assert_eq!(frequency.get(1), Some(1));
    }

    #[test]
    fn test_monetary_sums_line_revenue() {
        let report = RfmCalculator::new().compute(&sample()).unwrap();
        let monetary = report.metrics.column(MONETARY).unwrap().f64().unwrap();
        // 2*5 + 1*5 + 1*10
        assert_abs_diff_eq!(monetary.get(0).unwrap(), 25.0);
        assert_abs_diff_eq!(monetary.get(1).unwrap(), 10.0);
    }

    #[test]
    fn test_recency_is_at_least_one() {
        let report = RfmCalculator::new().compute(&sample()).unwrap();
        let recency = report.metrics.column(RECENCY).unwrap().i64().unwrap();

        // Customer 1001 transacted on the dataset max date.
        assert_eq!(recency.get(0), Some(1));
        // Customer 1002's latest invoice is 8 days before the max date.
        assert_eq!(recency.get(1), Some(9));
        for value in recency.into_iter().flatten() {
            assert!(value >= 1);
        }
    }

    #[test]
    fn test_reference_date_is_dataset_max_plus_one_day() {
        let report = RfmCalculator::new().compute(&sample()).unwrap();
        assert_eq!(report.reference_date, at(2011, 12, 10, 12, 30));
    }

    #[test]
    fn test_null_customers_are_excluded_and_counted() {
        let report = RfmCalculator::new().compute(&sample()).unwrap();
        assert_eq!(report.excluded_null_customers, 1);
        assert_eq!(report.metrics.height(), 2);
    }

    #[test]
    fn test_monetary_conservation_without_null_customers() {
        let df = df!(
            CUSTOMER_ID => &[Some("1"), Some("2"), Some("2"), Some("3")],
            INVOICE => &["A", "B", "C", "D"],
            QUANTITY => &[1i64, 2, 3, 4],
            PRICE => &[1.5, 2.0, 0.5, 10.0],
            INVOICE_DATE => &[
                at(2020, 1, 1, 0, 0),
                at(2020, 1, 2, 0, 0),
                at(2020, 1, 3, 0, 0),
                at(2020, 1, 4, 0, 0),
            ],
        )
        .unwrap();

        let report = RfmCalculator::new().compute(&df).unwrap();
        let total: f64 = report
            .metrics
            .column(MONETARY)
            .unwrap()
            .f64()
            .unwrap()
            .sum()
            .unwrap();
        // 1.5 + 4.0 + 1.5 + 40.0
        assert_abs_diff_eq!(total, 47.0);
    }

    #[test]
    fn test_precomputed_revenue_column_is_respected() {
        let df = df!(
            CUSTOMER_ID => &[Some("1")],
            INVOICE => &["A"],
            TOTAL_SUM => &[123.0],
            INVOICE_DATE => &[at(2020, 1, 1, 0, 0)],
        )
        .unwrap();

        let report = RfmCalculator::new().compute(&df).unwrap();
        let monetary = report.metrics.column(MONETARY).unwrap().f64().unwrap();
        assert_abs_diff_eq!(monetary.get(0).unwrap(), 123.0);
    }

    #[test]
    fn test_unparsed_timestamp_column_is_rejected() {
        let df = df!(
            CUSTOMER_ID => &[Some("1")],
            INVOICE => &["A"],
            QUANTITY => &[1i64],
            PRICE => &[1.0],
            INVOICE_DATE => &["2020-01-01 00:00:00"],
        )
        .unwrap();

        let err = RfmCalculator::new().compute(&df).unwrap_err();
        assert!(matches!(err, TransformError::InvalidColumnType { .. }));
    }

    #[test]
    fn test_missing_invoice_column_is_fatal() {
        let df = df!(
            CUSTOMER_ID => &[Some("1")],
            QUANTITY => &[1i64],
            PRICE => &[1.0],
            INVOICE_DATE => &[at(2020, 1, 1, 0, 0)],
        )
        .unwrap();

        let err = RfmCalculator::new().compute(&df).unwrap_err();
        assert!(matches!(
            err,
            TransformError::MissingColumn { ref column, .. } if column == INVOICE
        ));
    }
}
