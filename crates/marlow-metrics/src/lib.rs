#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/marlow-analytics/marlow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod customer;
pub mod inventory;
pub mod kpi;
pub mod pricing;
pub mod registry;
pub mod time;

// Re-export common types
pub use marlow_core::{Result, Transform, TransformCategory, TransformError};

pub use customer::cancellations::{CancellationMergeConfig, CancellationMerger};
pub use customer::rfm::{RfmCalculator, RfmConfig, RfmReport};
pub use customer::scaler::{ClusterPrep, ClusterPrepConfig, FeatureScale, FittedScaler};
pub use inventory::abc::{AbcClassifier, AbcConfig};
pub use pricing::elasticity::{ElasticityConfig, ElasticityEstimator};
pub use time::features::{TimeFeatureConfig, TimeFeatureDeriver};

// Re-export registry types for convenience
pub use registry::{
    TransformInfo, available_transforms, get_transform_info, transforms_by_category,
};
