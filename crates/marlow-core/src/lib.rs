#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/marlow-analytics/marlow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod schema;
pub mod transform;

pub use transform::{Result, Transform, TransformCategory, TransformError};
