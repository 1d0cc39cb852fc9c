//! # Churnscope
//!
//! Churn scoring for telecom customers.
//!
//! This crate provides:
//! - Deterministic feature engineering into the classifier's fixed
//!   37-slot contract
//! - A scoring service that owns a loaded predictor and interprets its output
//! - Predictor adapters for exported logistic regression and tree ensembles
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (CustomerProfile, FeatureVector, PredictionResult)
//! - `ports`: Trait definitions for external collaborators (the predictor)
//! - `adapters`: Concrete implementations (model families, artifact loading, log sanitizing)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven settings for the binaries

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{ChurnScorer, FeatureEngineer, ScoredProfile};
pub use domain::{CustomerProfile, FeatureVector, PredictionResult, RawCustomerProfile};

use ports::{ModelLoadError, PredictorError};

/// Result type for Churnscope operations
pub type Result<T> = std::result::Result<T, ChurnError>;

/// Main error type for Churnscope
#[derive(Debug, thiserror::Error)]
pub enum ChurnError {
    #[error("Invalid customer profile: {}", .0.join("; "))]
    InvalidProfile(Vec<String>),

    #[error("Model load failed: {0}")]
    ModelLoad(#[from] ModelLoadError),

    #[error("Scorer not initialized: no predictor has been loaded")]
    NotInitialized,

    #[error("Scorer already initialized")]
    AlreadyInitialized,

    #[error("Prediction failed for a {features}-feature vector: {source}")]
    Prediction {
        features: usize,
        #[source]
        source: PredictorError,
    },
}
