//! Price-sensitivity analytics
//!
//! Local demand-sensitivity estimates from observed (price, quantity)
//! pairs. These are point estimates over historical price moves, not a
//! demand model.

pub mod elasticity;

pub use elasticity::ElasticityEstimator;
