//! Customer-level analytics
//!
//! Covers the RFM scoring path: per-customer recency/frequency/monetary
//! aggregation, the normalization step that prepares those metrics for
//! clustering, and the merge of cancellation activity onto customer rows.

pub mod cancellations;
pub mod rfm;
pub mod scaler;

pub use cancellations::CancellationMerger;
pub use rfm::RfmCalculator;
pub use scaler::ClusterPrep;
