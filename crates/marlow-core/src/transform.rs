//! The transform abstraction shared by all analytics stages.
//!
//! Every stage consumes a materialized transaction (or metrics) table and
//! returns a new table. Stages never mutate their input, which keeps them
//! independently composable and lets callers run data-independent stages
//! concurrently if they choose.

use polars::prelude::*;
use thiserror::Error;

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;

/// Errors that can occur while applying a transform.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A required column is absent and cannot be derived.
    #[error("column '{column}' is required by {transform} and is neither present nor derivable")]
    MissingColumn {
        /// Name of the missing column
        column: String,
        /// Transform that required it
        transform: &'static str,
    },

    /// A timestamp value could not be parsed.
    #[error("value '{value}' in column '{column}' is not a parsable timestamp")]
    UnparsableTimestamp {
        /// Column being parsed
        column: String,
        /// First offending value
        value: String,
    },

    /// Total revenue of the dataset is zero, so revenue shares are undefined.
    #[error("total revenue is zero; revenue shares are undefined")]
    ZeroTotalRevenue,

    /// The input table has no usable rows.
    #[error("{transform} received a table with no usable rows")]
    EmptyInput {
        /// Transform that rejected the input
        transform: &'static str,
    },

    /// A column has a type the transform cannot work with.
    #[error("column '{column}' has unsupported type {dtype}")]
    InvalidColumnType {
        /// Offending column
        column: String,
        /// Its actual data type
        dtype: String,
    },

    /// Polars error.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Broad grouping of transforms, used by the registry and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformCategory {
    /// Customer-level metrics (RFM, scaling, cancellation profiles)
    Customer,
    /// Inventory-value metrics (ABC tiering)
    Inventory,
    /// Price-sensitivity metrics (elasticity)
    Pricing,
    /// Calendar-derived features
    Temporal,
}

/// A pure transform over a transaction or metrics table.
pub trait Transform {
    /// Unique name of the transform.
    fn name(&self) -> &str;

    /// Category the transform belongs to.
    fn category(&self) -> TransformCategory;

    /// Columns the input table must contain (directly or derivably).
    fn required_columns(&self) -> &[&str];

    /// Apply the transform, returning a new table.
    fn apply(&self, data: &DataFrame) -> Result<DataFrame>;
}
