#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/marlow-analytics/marlow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod csv;
pub mod error;
pub mod split;
pub mod store;

pub use error::{DataError, Result};
pub use split::{SplitTransactions, partition_by_quantity_sign};
pub use store::{SqliteStore, StoreConfig};
