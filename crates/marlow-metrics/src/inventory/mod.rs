//! Inventory-value analytics
//!
//! Pareto-style tiering of the product catalogue: a small share of products
//! usually carries most of the revenue, and the ABC classification makes
//! that split explicit for stocking and priority decisions.

pub mod abc;

pub use abc::AbcClassifier;
