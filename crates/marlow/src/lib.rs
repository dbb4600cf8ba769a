#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/marlow-analytics/marlow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export main types from sub-crates
pub use marlow_core as core;
pub use marlow_data as data;
pub use marlow_metrics as metrics;
pub use marlow_output as output;

// Re-export the common transform surface
pub use marlow_core::{Result, Transform, TransformCategory, TransformError};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
