//! Adapters layer: Concrete implementations of ports.
//!
//! - `logistic`: logistic regression predictor
//! - `tree_ensemble`: random forest / gradient boosting predictor
//! - `artifact`: JSON artifact loading and integrity checks
//! - `sanitize`: identifier filtering for logs

pub mod artifact;
pub mod logistic;
pub mod sanitize;
pub mod tree_ensemble;

pub use artifact::{ModelArtifact, ModelManifest, ModelSource, ModelSpec};
