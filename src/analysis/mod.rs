//! Analysis modules.
//!
//! Aggregation policies and the regression used for best-fit lines.

pub mod aggregator;
pub mod regression;

pub use aggregator::*;
pub use regression::{linear_fit, residual};
