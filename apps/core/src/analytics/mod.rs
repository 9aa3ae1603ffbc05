//! Statistical analysis of fetched datasets, one routine per intent.

pub mod engine;
pub mod stats;
pub mod types;

pub use engine::{confidence_for, interpret_correlation, AnalyticsEngine};
pub use types::*;
