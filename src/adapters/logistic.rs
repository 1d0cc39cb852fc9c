//! Logistic regression predictor.
//!
//! Parameters are exported from the training pipeline as plain JSON:
//! coefficients and intercept in the model's feature order, plus the
//! optional standard-scaler statistics applied before the linear term.

use serde::{Deserialize, Serialize};

use crate::ports::{check_input, ChurnPredictor, ModelLoadError, PredictorError};

fn default_threshold() -> f64 {
    0.5
}

/// Standard-scaler statistics: `x' = (x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Fitted logistic regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    /// Decision threshold on p(churn)
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl LogisticModel {
    /// Check parameter consistency against the expected feature count.
    ///
    /// # Errors
    /// Returns `ModelLoadError` on any inconsistency.
    pub fn validate(&self, n_features: usize) -> Result<(), ModelLoadError> {
        if self.coefficients.len() != n_features {
            return Err(ModelLoadError::FeatureCount {
                expected: n_features,
                got: self.coefficients.len(),
            });
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelLoadError::InvalidParameters(
                "coefficients and intercept must be finite".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ModelLoadError::InvalidParameters(format!(
                "threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != n_features || scaler.scale.len() != n_features {
                return Err(ModelLoadError::InvalidParameters(
                    "scaler lengths do not match the feature count".into(),
                ));
            }
            if scaler
                .scale
                .iter()
                .any(|s| !s.is_finite() || *s == 0.0)
            {
                return Err(ModelLoadError::InvalidParameters(
                    "scaler scale values must be finite and non-zero".into(),
                ));
            }
        }
        Ok(())
    }

    /// Linear term `intercept + w . x'`.
    fn decision_function(&self, features: &[f64]) -> f64 {
        let linear: f64 = match &self.scaler {
            Some(scaler) => features
                .iter()
                .zip(&self.coefficients)
                .zip(scaler.mean.iter().zip(&scaler.scale))
                .map(|((x, w), (mean, scale))| w * (x - mean) / scale)
                .sum(),
            None => features
                .iter()
                .zip(&self.coefficients)
                .map(|(x, w)| w * x)
                .sum(),
        };
        self.intercept + linear
    }
}

impl ChurnPredictor for LogisticModel {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> Result<u8, PredictorError> {
        let [_, p] = self.predict_proba(features)?;
        Ok(u8::from(p >= self.threshold))
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], PredictorError> {
        check_input(features, self.n_features())?;
        let p = sigmoid(self.decision_function(features));
        Ok([1.0 - p, p])
    }

    fn describe(&self) -> String {
        format!(
            "logistic regression ({} features, scaled={}, threshold={})",
            self.coefficients.len(),
            self.scaler.is_some(),
            self.threshold
        )
    }
}
