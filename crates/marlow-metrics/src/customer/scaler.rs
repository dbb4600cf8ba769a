//! Cluster Preparation
//!
//! Prepares RFM metrics for distance-based clustering: log(1+x) to tame the
//! right skew of retail spend distributions, then standardization to zero
//! mean and unit variance using statistics fitted on the batch itself. The
//! fitted statistics are returned as an explicit value so the identical
//! mapping can be replayed on new data without refitting.

use marlow_core::schema::{self, FREQUENCY, MONETARY, RECENCY};
use marlow_core::{Result, TransformError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Standard deviations below this are treated as zero variance.
const MIN_STD: f64 = 1e-12;

/// Configuration for the cluster-preparation step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterPrepConfig {
    /// Metric columns to transform (default: Recency, Frequency, Monetary)
    pub features: Vec<String>,
}

impl Default for ClusterPrepConfig {
    fn default() -> Self {
        Self {
            features: vec![
                RECENCY.to_string(),
                FREQUENCY.to_string(),
                MONETARY.to_string(),
            ],
        }
    }
}

/// Fitted scale parameters for one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScale {
    /// Feature column name.
    pub name: String,
    /// Batch mean of the log1p-transformed values.
    pub mean: f64,
    /// Batch population standard deviation of the log1p-transformed values.
    pub std: f64,
}

impl FeatureScale {
    /// Whether the feature had (near-)zero variance at fit time.
    ///
    /// Degenerate features are passed through unscaled instead of dividing
    /// by zero.
    pub fn is_degenerate(&self) -> bool {
        self.std < MIN_STD
    }
}

/// Immutable scale parameters fitted on one batch.
///
/// Serializable, so callers can persist it and replay the exact transform on
/// later data. It is a plain value: reuse across runs happens by passing it
/// around, never through shared process state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedScaler {
    /// Per-feature scale parameters, in configuration order.
    pub scales: Vec<FeatureScale>,
}

impl FittedScaler {
    /// Apply log1p and the fitted standardization to a metrics table.
    pub fn transform(&self, metrics: &DataFrame) -> Result<DataFrame> {
        for scale in &self.scales {
            if !schema::has_column(metrics, &scale.name) {
                return Err(TransformError::MissingColumn {
                    column: scale.name.clone(),
                    transform: ClusterPrep::NAME,
                });
            }
        }

        let exprs = self
            .scales
            .iter()
            .map(|scale| {
                let logged = col(&scale.name).cast(DataType::Float64).log1p();
                if scale.is_degenerate() {
                    logged.alias(&scale.name)
                } else {
                    ((logged - lit(scale.mean)) / lit(scale.std)).alias(&scale.name)
                }
            })
            .collect::<Vec<_>>();

        Ok(metrics.clone().lazy().with_columns(exprs).collect()?)
    }
}

/// ClusterPrep fits and applies the normalization in one pass
#[derive(Debug)]
pub struct ClusterPrep {
    config: ClusterPrepConfig,
}

impl ClusterPrep {
    const NAME: &'static str = "cluster_prep";

    /// Create with the default RFM feature set.
    pub fn new() -> Self {
        Self::with_config(ClusterPrepConfig::default())
    }

    /// Create with a custom feature list.
    pub const fn with_config(config: ClusterPrepConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub const fn config(&self) -> &ClusterPrepConfig {
        &self.config
    }

    /// Fit scale parameters on a batch without transforming it.
    pub fn fit(&self, metrics: &DataFrame) -> Result<FittedScaler> {
        let features: Vec<&str> = self.config.features.iter().map(String::as_str).collect();
        schema::ensure_columns(metrics, &features, Self::NAME)?;

        let stats = metrics
            .clone()
            .lazy()
            .select(
                features
                    .iter()
                    .flat_map(|feature| {
                        let logged = col(*feature).cast(DataType::Float64).log1p();
                        [
                            logged.clone().mean().alias(format!("{feature}:mean")),
                            logged.std(0).alias(format!("{feature}:std")),
                        ]
                    })
                    .collect::<Vec<_>>(),
            )
            .collect()?;

        let mut scales = Vec::with_capacity(features.len());
        for feature in features {
            let mean = scalar(&stats, &format!("{feature}:mean"))?;
            let std = scalar(&stats, &format!("{feature}:std"))?;
            scales.push(FeatureScale {
                name: feature.to_string(),
                mean,
                std,
            });
        }

        Ok(FittedScaler { scales })
    }

    /// Fit on the batch and transform it, returning both the table and the
    /// fitted parameters.
    pub fn fit_transform(&self, metrics: &DataFrame) -> Result<(DataFrame, FittedScaler)> {
        let scaler = self.fit(metrics)?;
        let transformed = scaler.transform(metrics)?;
        Ok((transformed, scaler))
    }
}

impl Default for ClusterPrep {
    fn default() -> Self {
        Self::new()
    }
}

fn scalar(stats: &DataFrame, column: &str) -> Result<f64> {
    stats
        .column(column)?
        .f64()?
        .get(0)
        .ok_or(TransformError::EmptyInput {
            transform: ClusterPrep::NAME,
        })
}
