//! Integration module for the analytics pipeline.
//!
//! Glues the data, metrics and output crates together: input resolution
//! (store or CSV), the full stage sequence, and export of the result
//! bundle.

pub(crate) mod pipeline;
