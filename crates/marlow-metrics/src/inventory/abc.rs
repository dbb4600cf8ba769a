//! ABC Inventory Analysis
//!
//! Ranks products by total revenue and assigns Pareto tiers from the running
//! cumulative revenue share. A product's tier therefore depends on every
//! higher-ranked product's contribution, not on its own revenue alone.

use marlow_core::schema::{
    self, ABC_CLASS, CUMULATIVE_REVENUE, DESCRIPTION, PRICE, QUANTITY, REVENUE_SHARE_PCT,
    TOTAL_SUM,
};
use marlow_core::{Result, Transform, TransformCategory, TransformError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the ABC classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbcConfig {
    /// Product identifier column (default: `Description`)
    pub product_column: String,
    /// Cumulative share boundary of class A, in percent (default: 80)
    pub class_a_threshold: f64,
    /// Cumulative share boundary of class B, in percent (default: 95)
    pub class_b_threshold: f64,
}

impl Default for AbcConfig {
    fn default() -> Self {
        Self {
            product_column: DESCRIPTION.to_string(),
            class_a_threshold: 80.0,
            class_b_threshold: 95.0,
        }
    }
}

/// AbcClassifier assigns Pareto revenue tiers to products
#[derive(Debug)]
pub struct AbcClassifier {
    config: AbcConfig,
}

impl AbcClassifier {
    const NAME: &'static str = "abc_analysis";

    /// Create a classifier with the default 80/95 boundaries.
    pub fn new() -> Self {
        Self::with_config(AbcConfig::default())
    }

    /// Create a classifier with custom boundaries or product column.
    pub const fn with_config(config: AbcConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub const fn config(&self) -> &AbcConfig {
        &self.config
    }

    /// Rank products by revenue and assign tiers.
    ///
    /// Products are sorted descending by total revenue; revenue ties keep
    /// their first-appearance order, so repeated runs over the same input
    /// never reorder products. The top-ranked product is always class A,
    /// which also covers the single-product case at 100% share. A dataset
    /// whose total revenue is zero is rejected with
    /// [`TransformError::ZeroTotalRevenue`] rather than producing NaN
    /// shares.
    pub fn classify(&self, transactions: &DataFrame) -> Result<DataFrame> {
        let product = self.config.product_column.as_str();
        schema::ensure_columns(transactions, &[product], Self::NAME)?;
        schema::ensure_revenue(transactions, Self::NAME)?;

        let ranked = schema::with_line_revenue(transactions)
            .group_by_stable([col(product)])
            .agg([col(TOTAL_SUM).sum().cast(DataType::Float64).alias(TOTAL_SUM)])
            .sort(
                [TOTAL_SUM],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_maintain_order(true),
            )
            .with_row_index("rank", None)
            .with_column(col(TOTAL_SUM).cum_sum(false).alias(CUMULATIVE_REVENUE))
            .collect()?;

        let total = ranked
            .column(TOTAL_SUM)?
            .f64()?
            .sum()
            .unwrap_or(0.0);
        if total == 0.0 {
            return Err(TransformError::ZeroTotalRevenue);
        }

        debug!(products = ranked.height(), total, "classifying product revenue tiers");

        let class_a = self.config.class_a_threshold;
        let class_b = self.config.class_b_threshold;

        let classified = ranked
            .lazy()
            .with_column(
                (lit(100.0) * col(CUMULATIVE_REVENUE) / lit(total)).alias(REVENUE_SHARE_PCT),
            )
            .with_column(
                when(
                    col(REVENUE_SHARE_PCT)
                        .lt_eq(lit(class_a))
                        .or(col("rank").eq(lit(0u32))),
                )
                .then(lit("A"))
                .when(col(REVENUE_SHARE_PCT).lt_eq(lit(class_b)))
                .then(lit("B"))
                .otherwise(lit("C"))
                .alias(ABC_CLASS),
            )
            .select([
                col(product),
                col(TOTAL_SUM),
                col(CUMULATIVE_REVENUE),
                col(REVENUE_SHARE_PCT),
                col(ABC_CLASS),
            ])
            .collect()?;

        Ok(classified)
    }
}

impl Transform for AbcClassifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn category(&self) -> TransformCategory {
        TransformCategory::Inventory
    }

    fn required_columns(&self) -> &[&str] {
        &[DESCRIPTION, QUANTITY, PRICE]
    }

    fn apply(&self, data: &DataFrame) -> Result<DataFrame> {
        self.classify(data)
    }
}

impl Default for AbcClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn classes(df: &DataFrame) -> Vec<String> {
        df.column(ABC_CLASS)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap().to_string())
            .collect()
    }

    fn shares(df: &DataFrame) -> Vec<f64> {
        df.column(REVENUE_SHARE_PCT)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect()
    }

    #[test]
    fn test_reference_ranking() {
        // Revenues [100, 50, 30, 20] over a total of 200.
        let df = df!(
            DESCRIPTION => &["W", "X", "Y", "Z"],
            TOTAL_SUM => &[100.0, 50.0, 30.0, 20.0],
        )
        .unwrap();

        let out = AbcClassifier::new().classify(&df).unwrap();

        let expected_shares = [50.0, 75.0, 90.0, 100.0];
        for (share, expected) in shares(&out).iter().zip(expected_shares) {
            assert_abs_diff_eq!(*share, expected, epsilon = 1e-9);
        }
        assert_eq!(classes(&out), vec!["A", "A", "B", "C"]);
    }

    #[test]
    fn test_revenue_is_aggregated_and_sorted() {
        let df = df!(
            DESCRIPTION => &["low", "high", "high", "mid"],
            QUANTITY => &[1i64, 5, 5, 3],
            PRICE => &[1.0, 10.0, 10.0, 5.0],
        )
        .unwrap();

        let out = AbcClassifier::new().classify(&df).unwrap();

        let products = out.column(DESCRIPTION).unwrap().str().unwrap();
        assert_eq!(products.get(0), Some("high"));
        assert_eq!(products.get(1), Some("mid"));
        assert_eq!(products.get(2), Some("low"));

        let revenue = out.column(TOTAL_SUM).unwrap().f64().unwrap();
        assert_abs_diff_eq!(revenue.get(0).unwrap(), 100.0);
    }

    #[test]
    fn test_cumulative_share_is_nondecreasing() {
        let df = df!(
            DESCRIPTION => &["a", "b", "c", "d", "e"],
            TOTAL_SUM => &[5.0, 40.0, 12.0, 1.0, 30.0],
        )
        .unwrap();

        let out = AbcClassifier::new().classify(&df).unwrap();
        let shares = shares(&out);
        for pair in shares.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
        assert_abs_diff_eq!(*shares.last().unwrap(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_single_product_is_class_a_at_full_share() {
        let df = df!(
            DESCRIPTION => &["only"],
            TOTAL_SUM => &[42.0],
        )
        .unwrap();

        let out = AbcClassifier::new().classify(&df).unwrap();
        assert_eq!(out.height(), 1);
        assert_eq!(classes(&out), vec!["A"]);
        assert_abs_diff_eq!(shares(&out)[0], 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_revenue_ties_keep_input_order() {
        let df = df!(
            DESCRIPTION => &["first", "second", "third"],
            TOTAL_SUM => &[10.0, 10.0, 10.0],
        )
        .unwrap();

        let out = AbcClassifier::new().classify(&df).unwrap();
        let products = out.column(DESCRIPTION).unwrap().str().unwrap();
        assert_eq!(products.get(0), Some("first"));
        assert_eq!(products.get(1), Some("second"));
        assert_eq!(products.get(2), Some("third"));
    }

    #[test]
    fn test_zero_total_revenue_is_a_typed_error() {
        let df = df!(
            DESCRIPTION => &["a", "b"],
            TOTAL_SUM => &[0.0, 0.0],
        )
        .unwrap();

        let err = AbcClassifier::new().classify(&df).unwrap_err();
        assert!(matches!(err, TransformError::ZeroTotalRevenue));
    }

    #[test]
    fn test_missing_product_column_is_fatal() {
        let df = df!(TOTAL_SUM => &[1.0]).unwrap();
        let err = AbcClassifier::new().classify(&df).unwrap_err();
        assert!(matches!(err, TransformError::MissingColumn { .. }));
    }
}
