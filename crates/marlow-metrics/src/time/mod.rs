//! Calendar feature derivation
//!
//! Expands the invoice timestamp into seasonality, weekly-behavior and
//! shift-planning features consumed by downstream demand analysis.

pub mod features;

pub use features::TimeFeatureDeriver;
