//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! feature engineering, single-profile scoring and batch scoring.

mod feature_engineer;
mod scorer;
mod worker;

pub use feature_engineer::FeatureEngineer;
pub use scorer::{ChurnScorer, ScoredProfile};
pub use worker::{BatchProgress, BatchScoringWorker, BatchWorkerHandle};
