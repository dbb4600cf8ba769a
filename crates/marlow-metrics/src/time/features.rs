//! Time Feature Derivation
//!
//! Expands a timestamp column into calendar features: date parts, weekly
//! behavior (day-of-week index, weekday name, weekend flag), payroll-cycle
//! flags (month start/end) and a warehouse-shift bucket from the hour.
//! Timestamp strings that fail to parse abort the stage with a typed error;
//! nothing is silently coerced to null.

use marlow_core::schema::{
    self, DAY, DAY_NAME, DAY_OF_WEEK, DAY_PART, HOUR, INVOICE_DATE, IS_MONTH_END, IS_MONTH_START,
    IS_WEEKEND, MONTH, YEAR,
};
use marlow_core::{Result, Transform, TransformCategory, TransformError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for time feature derivation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeFeatureConfig {
    /// Timestamp column to expand (default: `InvoiceDate`)
    pub timestamp_column: String,
    /// Whether to emit the weekday-name column (default: true)
    pub include_day_name: bool,
}

impl Default for TimeFeatureConfig {
    fn default() -> Self {
        Self {
            timestamp_column: INVOICE_DATE.to_string(),
            include_day_name: true,
        }
    }
}

/// TimeFeatureDeriver expands a timestamp column into calendar features
#[derive(Debug)]
pub struct TimeFeatureDeriver {
    config: TimeFeatureConfig,
}

impl TimeFeatureDeriver {
    const NAME: &'static str = "time_features";

    /// Create a deriver with the default configuration.
    pub fn new() -> Self {
        Self::with_config(TimeFeatureConfig::default())
    }

    /// Create a deriver with a custom configuration.
    pub const fn with_config(config: TimeFeatureConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub const fn config(&self) -> &TimeFeatureConfig {
        &self.config
    }

    /// Return the input table augmented with the calendar feature columns.
    pub fn derive(&self, table: &DataFrame) -> Result<DataFrame> {
        let timestamp = self.config.timestamp_column.as_str();
        schema::ensure_columns(table, &[timestamp], Self::NAME)?;

        let parsed = self.parse_timestamps(table)?;
        let date = col(timestamp).cast(DataType::Date);

        let mut calendar: Vec<Expr> = Vec::new();
        if self.config.include_day_name {
            calendar.push(day_name_expr().alias(DAY_NAME));
        }
        calendar.push(col(DAY_OF_WEEK).gt_eq(lit(5)).alias(IS_WEEKEND));
        calendar.push(col(DAY).eq(lit(1)).alias(IS_MONTH_START));
        calendar.push(
            date.clone()
                .eq(date.dt().month_end())
                .alias(IS_MONTH_END),
        );
        calendar.push(day_part_expr().alias(DAY_PART));

        let augmented = parsed
            .lazy()
            .with_columns([
                col(timestamp).dt().year().alias(YEAR),
                col(timestamp).dt().month().cast(DataType::Int32).alias(MONTH),
                col(timestamp).dt().day().cast(DataType::Int32).alias(DAY),
                col(timestamp).dt().hour().cast(DataType::Int32).alias(HOUR),
                (col(timestamp).dt().weekday().cast(DataType::Int32) - lit(1)).alias(DAY_OF_WEEK),
            ])
            .with_columns(calendar)
            .collect()?;

        Ok(augmented)
    }

    /// Bring the timestamp column to datetime, rejecting unparsable values.
    fn parse_timestamps(&self, table: &DataFrame) -> Result<DataFrame> {
        let timestamp = self.config.timestamp_column.as_str();
        let column = table.column(timestamp)?;

        match column.dtype() {
            DataType::Datetime(_, _) => Ok(table.clone()),
            DataType::Date => Ok(table
                .clone()
                .lazy()
                .with_column(
                    col(timestamp).cast(DataType::Datetime(TimeUnit::Microseconds, None)),
                )
                .collect()?),
            DataType::String => {
                let parsed = table
                    .clone()
                    .lazy()
                    .with_column(
                        col(timestamp)
                            .str()
                            .to_datetime(
                                Some(TimeUnit::Microseconds),
                                None,
                                StrptimeOptions {
                                    strict: false,
                                    ..Default::default()
                                },
                                lit("raise"),
                            )
                            .alias(timestamp),
                    )
                    .collect()?;

                let failures =
                    parsed.column(timestamp)?.null_count() - column.null_count();
                if failures > 0 {
                    let original = column.str()?;
                    let converted = parsed.column(timestamp)?.datetime()?;
                    for index in 0..table.height() {
                        if converted.get(index).is_none() {
                            if let Some(value) = original.get(index) {
                                return Err(TransformError::UnparsableTimestamp {
                                    column: timestamp.to_string(),
                                    value: value.to_string(),
                                });
                            }
                        }
                    }
                }
                Ok(parsed)
            }
            other => Err(TransformError::InvalidColumnType {
                column: timestamp.to_string(),
                dtype: other.to_string(),
            }),
        }
    }
}

impl Transform for TimeFeatureDeriver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn category(&self) -> TransformCategory {
        TransformCategory::Temporal
    }

    fn required_columns(&self) -> &[&str] {
        &[INVOICE_DATE]
    }

    fn apply(&self, data: &DataFrame) -> Result<DataFrame> {
        self.derive(data)
    }
}

impl Default for TimeFeatureDeriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed English weekday labels keyed on the day-of-week index, so the
/// output never depends on the process locale.
fn day_name_expr() -> Expr {
    when(col(DAY_OF_WEEK).eq(lit(0)))
        .then(lit("Monday"))
        .when(col(DAY_OF_WEEK).eq(lit(1)))
        .then(lit("Tuesday"))
        .when(col(DAY_OF_WEEK).eq(lit(2)))
        .then(lit("Wednesday"))
        .when(col(DAY_OF_WEEK).eq(lit(3)))
        .then(lit("Thursday"))
        .when(col(DAY_OF_WEEK).eq(lit(4)))
        .then(lit("Friday"))
        .when(col(DAY_OF_WEEK).eq(lit(5)))
        .then(lit("Saturday"))
        .otherwise(lit("Sunday"))
}

/// Half-open hour buckets: [0,6) [6,12) [12,18) [18,24).
fn day_part_expr() -> Expr {
    when(col(HOUR).lt(lit(6)))
        .then(lit("Early Morning"))
        .when(col(HOUR).lt(lit(12)))
        .then(lit("Morning"))
        .when(col(HOUR).lt(lit(18)))
        .then(lit("Afternoon"))
        .otherwise(lit("Evening"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use rstest::rstest;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn derive_one(timestamp: NaiveDateTime) -> DataFrame {
        let df = df!(INVOICE_DATE => &[timestamp]).unwrap();
        TimeFeatureDeriver::new().derive(&df).unwrap()
    }

    fn i32_at(df: &DataFrame, name: &str) -> i32 {
        df.column(name).unwrap().i32().unwrap().get(0).unwrap()
    }

    fn bool_at(df: &DataFrame, name: &str) -> bool {
        df.column(name).unwrap().bool().unwrap().get(0).unwrap()
    }

    fn str_at(df: &DataFrame, name: &str) -> String {
        df.column(name)
            .unwrap()
            .str()
            .unwrap()
            .get(0)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_basic_calendar_parts() {
        // 2011-12-09 was a Friday.
        let out = derive_one(at(2011, 12, 9, 12, 50));

        assert_eq!(i32_at(&out, YEAR), 2011);
        assert_eq!(i32_at(&out, MONTH), 12);
        assert_eq!(i32_at(&out, DAY), 9);
        assert_eq!(i32_at(&out, HOUR), 12);
        assert_eq!(i32_at(&out, DAY_OF_WEEK), 4);
        assert_eq!(str_at(&out, DAY_NAME), "Friday");
        assert!(!bool_at(&out, IS_WEEKEND));
        assert_eq!(str_at(&out, DAY_PART), "Afternoon");
    }

    #[rstest]
    #[case(at(2011, 12, 10, 9, 0), 5, "Saturday", true)]
    #[case(at(2011, 12, 11, 9, 0), 6, "Sunday", true)]
    #[case(at(2011, 12, 12, 9, 0), 0, "Monday", false)]
    fn test_weekend_flag(
        #[case] timestamp: NaiveDateTime,
        #[case] index: i32,
        #[case] name: &str,
        #[case] weekend: bool,
    ) {
        let out = derive_one(timestamp);
        assert_eq!(i32_at(&out, DAY_OF_WEEK), index);
        assert_eq!(str_at(&out, DAY_NAME), name);
        assert_eq!(bool_at(&out, IS_WEEKEND), weekend);
    }

    #[rstest]
    #[case(0, "Early Morning")]
    #[case(5, "Early Morning")]
    #[case(6, "Morning")]
    #[case(11, "Morning")]
    #[case(12, "Afternoon")]
    #[case(17, "Afternoon")]
    #[case(18, "Evening")]
    #[case(23, "Evening")]
    fn test_day_part_buckets(#[case] hour: u32, #[case] expected: &str) {
        let out = derive_one(at(2011, 6, 15, hour, 0));
        assert_eq!(str_at(&out, DAY_PART), expected);
    }

    #[test]
    fn test_month_boundary_flags() {
        let start = derive_one(at(2011, 3, 1, 8, 0));
        assert!(bool_at(&start, IS_MONTH_START));
        assert!(!bool_at(&start, IS_MONTH_END));

        // February in a non-leap year.
        let end = derive_one(at(2011, 2, 28, 20, 0));
        assert!(bool_at(&end, IS_MONTH_END));
        assert!(!bool_at(&end, IS_MONTH_START));

        let middle = derive_one(at(2011, 2, 14, 20, 0));
        assert!(!bool_at(&middle, IS_MONTH_START));
        assert!(!bool_at(&middle, IS_MONTH_END));
    }

    #[test]
    fn test_string_timestamps_are_parsed() {
        let df = df!(INVOICE_DATE => &["2011-12-09 12:50:00"]).unwrap();
        let out = TimeFeatureDeriver::new().derive(&df).unwrap();
        assert_eq!(i32_at(&out, YEAR), 2011);
        assert_eq!(i32_at(&out, HOUR), 12);
    }

    #[test]
    fn test_unparsable_timestamp_is_a_typed_error() {
        let df = df!(INVOICE_DATE => &["2011-12-09 12:50:00", "not a date"]).unwrap();
        let err = TimeFeatureDeriver::new().derive(&df).unwrap_err();
        assert!(matches!(
            err,
            TransformError::UnparsableTimestamp { ref value, .. } if value == "not a date"
        ));
    }

    #[test]
    fn test_day_name_column_is_optional() {
        let config = TimeFeatureConfig {
            include_day_name: false,
            ..Default::default()
        };
        let df = df!(INVOICE_DATE => &[at(2011, 12, 9, 12, 50)]).unwrap();
        let out = TimeFeatureDeriver::with_config(config).derive(&df).unwrap();
        assert!(!schema::has_column(&out, DAY_NAME));
        assert!(schema::has_column(&out, IS_WEEKEND));
    }

    #[test]
    fn test_original_columns_are_preserved() {
        let df = df!(
            "Invoice" => &["A"],
            INVOICE_DATE => &[at(2011, 12, 9, 12, 50)],
            "Quantity" => &[3i64],
        )
        .unwrap();
        let out = TimeFeatureDeriver::new().derive(&df).unwrap();
        assert!(schema::has_column(&out, "Invoice"));
        assert!(schema::has_column(&out, "Quantity"));
        assert_eq!(out.height(), 1);
    }

    #[test]
    fn test_missing_timestamp_column_is_fatal() {
        let df = df!("Invoice" => &["A"]).unwrap();
        let err = TimeFeatureDeriver::new().derive(&df).unwrap_err();
        assert!(matches!(err, TransformError::MissingColumn { .. }));
    }
}
