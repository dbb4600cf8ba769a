//! Price Elasticity Estimation
//!
//! Sums sold quantity per (product, price) pair, orders the price points of
//! each product ascending by price, and computes the percent change in
//! quantity and price between successive points. Elasticity is the ratio of
//! the two. The ascending-price order is part of the contract: percent
//! changes are order-dependent, so the ordering must never be left to
//! incidental aggregation order.

use marlow_core::schema::{
    self, DESCRIPTION, ELASTICITY, PCT_CHANGE_P, PCT_CHANGE_Q, PRICE, QUANTITY,
};
use marlow_core::{Result, Transform, TransformCategory};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the elasticity estimator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticityConfig {
    /// Product identifier column (default: `Description`)
    pub product_column: String,
    /// Unit price column (default: `Price`)
    pub price_column: String,
    /// Quantity column (default: `Quantity`)
    pub quantity_column: String,
}

impl Default for ElasticityConfig {
    fn default() -> Self {
        Self {
            product_column: DESCRIPTION.to_string(),
            price_column: PRICE.to_string(),
            quantity_column: QUANTITY.to_string(),
        }
    }
}

/// ElasticityEstimator computes quantity/price percent-change ratios
#[derive(Debug)]
pub struct ElasticityEstimator {
    config: ElasticityConfig,
}

impl ElasticityEstimator {
    const NAME: &'static str = "price_elasticity";

    /// Create an estimator with the default column mapping.
    pub fn new() -> Self {
        Self::with_config(ElasticityConfig::default())
    }

    /// Create an estimator with a custom column mapping.
    pub const fn with_config(config: ElasticityConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub const fn config(&self) -> &ElasticityConfig {
        &self.config
    }

    /// Estimate elasticity between successive price points per product.
    ///
    /// The first price point of a product has no predecessor and is dropped.
    /// Pairs whose price change is zero or whose percent changes are not
    /// finite (a prior price of zero) are dropped as well; no NaN or
    /// infinite row ever reaches the output.
    pub fn estimate(&self, transactions: &DataFrame) -> Result<DataFrame> {
        let product = self.config.product_column.as_str();
        let price = self.config.price_column.as_str();
        let quantity = self.config.quantity_column.as_str();

        schema::ensure_columns(transactions, &[product, price, quantity], Self::NAME)?;

        let observations = transactions
            .clone()
            .lazy()
            .group_by_stable([col(product), col(price)])
            .agg([col(quantity)
                .sum()
                .cast(DataType::Float64)
                .alias(quantity)])
            .sort([product, price], SortMultipleOptions::default())
            .with_columns([
                col(quantity)
                    .pct_change(lit(1))
                    .over([col(product)])
                    .alias(PCT_CHANGE_Q),
                col(price)
                    .cast(DataType::Float64)
                    .pct_change(lit(1))
                    .over([col(product)])
                    .alias(PCT_CHANGE_P),
            ])
            .with_column((col(PCT_CHANGE_Q) / col(PCT_CHANGE_P)).alias(ELASTICITY))
            .filter(
                col(PCT_CHANGE_P)
                    .is_not_null()
                    .and(col(PCT_CHANGE_P).neq(lit(0.0)))
                    .and(col(PCT_CHANGE_Q).is_finite())
                    .and(col(PCT_CHANGE_P).is_finite())
                    .and(col(ELASTICITY).is_finite()),
            )
            .collect()?;

        debug!(pairs = observations.height(), "estimated elasticity point pairs");

        Ok(observations)
    }
}

impl Transform for ElasticityEstimator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn category(&self) -> TransformCategory {
        TransformCategory::Pricing
    }

    fn required_columns(&self) -> &[&str] {
        &[DESCRIPTION, PRICE, QUANTITY]
    }

    fn apply(&self, data: &DataFrame) -> Result<DataFrame> {
        self.estimate(data)
    }
}

impl Default for ElasticityEstimator {
    fn default() -> Self {
        Self::new()
    }
}
