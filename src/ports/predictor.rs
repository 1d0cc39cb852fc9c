//! Predictor port: Trait for the trained churn classifier.
//!
//! This trait abstracts the concrete model family (linear model, tree
//! ensemble, ...) from feature engineering and the scoring service.

use std::path::PathBuf;

/// Errors raised by a predictor at inference time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictorError {
    #[error("Feature count mismatch: got {got}, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Non-finite feature value at index {index}")]
    NonFiniteInput { index: usize },

    #[error("Predictor returned an invalid label: {0}")]
    InvalidLabel(u8),

    #[error("Predictor returned invalid probabilities: [{0}, {1}]")]
    InvalidProbability(f64, f64),

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Errors raised while acquiring a predictor artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("Model artifact not found at {0:?}")]
    NotFound(PathBuf),

    #[error("Failed to read {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed model artifact: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unsupported artifact format version {0}")]
    UnsupportedVersion(u32),

    #[error("Incompatible feature count: model has {got}, scorer requires {expected}")]
    FeatureCount { expected: usize, got: usize },

    #[error("Feature {index} is {got:?}, expected {expected:?}")]
    FeatureOrder {
        index: usize,
        expected: String,
        got: String,
    },

    #[error("Integrity check failed: {0}")]
    Integrity(String),

    #[error("Invalid model parameters: {0}")]
    InvalidParameters(String),
}

/// A trained binary churn classifier.
///
/// Implementations are loaded once and then only read, so they must be
/// shareable across threads.
pub trait ChurnPredictor: Send + Sync {
    /// Number of input features the model was fit on.
    fn n_features(&self) -> usize;

    /// Predict the class label (0 = stays, 1 = churns).
    ///
    /// # Errors
    /// Returns `PredictorError` if the input is rejected.
    fn predict(&self, features: &[f64]) -> Result<u8, PredictorError>;

    /// Predict class probabilities `[p(stays), p(churns)]`.
    ///
    /// # Errors
    /// Returns `PredictorError` if the input is rejected.
    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], PredictorError>;

    /// Short human-readable model description for logs.
    fn describe(&self) -> String {
        format!("predictor ({} features)", self.n_features())
    }
}

/// Shared input check for predictor implementations.
///
/// # Errors
/// Returns `PredictorError` on a length mismatch or a non-finite value.
pub fn check_input(features: &[f64], expected: usize) -> Result<(), PredictorError> {
    if features.len() != expected {
        return Err(PredictorError::DimensionMismatch {
            expected,
            got: features.len(),
        });
    }
    if let Some(index) = features.iter().position(|x| !x.is_finite()) {
        return Err(PredictorError::NonFiniteInput { index });
    }
    Ok(())
}
