//! Churn scoring service: owns the predictor and interprets its output.
//!
//! The scorer starts Uninitialized and becomes Ready once a predictor has
//! been installed. There is no way back: the predictor lives as long as the
//! scorer and is shared read-only by every scoring call.

use std::sync::{Arc, OnceLock};

use crate::adapters::ModelSource;
use crate::domain::{
    CustomerProfile, CustomerSegment, FeatureVector, PredictionResult, RawCustomerProfile,
    RecommendationTrack, RiskBand, RiskFactor, FEATURE_COUNT,
};
use crate::ports::{ChurnPredictor, ModelLoadError, PredictorError};
use crate::{ChurnError, Result};

use super::FeatureEngineer;

/// Allowed deviation of `p(stays) + p(churns)` from 1.
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// A prediction together with the feature vector it was computed from.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ScoredProfile {
    #[serde(flatten)]
    pub result: PredictionResult,
    pub features: FeatureVector,
}

/// Service scoring customer profiles against a loaded churn predictor.
///
/// Share it as `Arc<ChurnScorer>`; `score` takes `&self` and never locks.
#[derive(Default)]
pub struct ChurnScorer {
    predictor: OnceLock<Arc<dyn ChurnPredictor>>,
}

impl std::fmt::Debug for ChurnScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChurnScorer")
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl ChurnScorer {
    /// Create an uninitialized scorer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the predictor artifact and move to Ready.
    ///
    /// On failure the scorer stays Uninitialized.
    ///
    /// # Errors
    /// Returns `ChurnError::ModelLoad` if the artifact cannot be acquired,
    /// or `ChurnError::AlreadyInitialized` if a predictor is already installed.
    pub fn initialize(&self, source: &ModelSource) -> Result<()> {
        if self.is_ready() {
            return Err(ChurnError::AlreadyInitialized);
        }
        tracing::info!("Initializing churn scorer from {:?}...", source.path());

        let predictor = source.load()?;
        self.install(Arc::from(predictor))
    }

    /// Install an already-constructed predictor and move to Ready.
    ///
    /// # Errors
    /// Returns `ChurnError::ModelLoad` if the predictor's feature count does
    /// not match the feature contract, or `ChurnError::AlreadyInitialized`.
    pub fn initialize_with(&self, predictor: Arc<dyn ChurnPredictor>) -> Result<()> {
        self.install(predictor)
    }

    fn install(&self, predictor: Arc<dyn ChurnPredictor>) -> Result<()> {
        let n = predictor.n_features();
        if n != FEATURE_COUNT {
            return Err(ModelLoadError::FeatureCount {
                expected: FEATURE_COUNT,
                got: n,
            }
            .into());
        }

        let description = predictor.describe();
        self.predictor
            .set(predictor)
            .map_err(|_| ChurnError::AlreadyInitialized)?;

        tracing::info!("Churn scorer ready: {}", description);
        Ok(())
    }

    /// Whether a predictor is installed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.predictor.get().is_some()
    }

    /// Score a customer profile.
    ///
    /// # Errors
    /// - `ChurnError::NotInitialized` before a successful `initialize`
    /// - `ChurnError::InvalidProfile` for out-of-range fields
    /// - `ChurnError::Prediction` if the predictor rejects the vector
    pub fn score(&self, profile: &CustomerProfile) -> Result<PredictionResult> {
        self.score_with_features(profile).map(|scored| scored.result)
    }

    /// Parse and score a string-typed profile.
    ///
    /// # Errors
    /// As [`ChurnScorer::score`], with `InvalidProfile` also covering
    /// out-of-domain categorical values.
    pub fn score_raw(&self, raw: &RawCustomerProfile) -> Result<ScoredProfile> {
        let profile = CustomerProfile::try_from(raw).map_err(ChurnError::InvalidProfile)?;
        self.score_with_features(&profile)
    }

    /// Score a profile and keep the feature vector for inspection.
    ///
    /// # Errors
    /// As [`ChurnScorer::score`].
    pub fn score_with_features(&self, profile: &CustomerProfile) -> Result<ScoredProfile> {
        let predictor = self.predictor.get().ok_or(ChurnError::NotInitialized)?;

        let features = FeatureEngineer::transform(profile)?;
        let x = features.to_array();
        tracing::debug!("Engineered {} features", x.len());

        let prediction_error = |source: PredictorError| ChurnError::Prediction {
            features: x.len(),
            source,
        };

        let label = predictor.predict(&x).map_err(prediction_error)?;
        let churn_label = match label {
            0 => false,
            1 => true,
            other => return Err(prediction_error(PredictorError::InvalidLabel(other))),
        };

        let [p0, p1] = predictor.predict_proba(&x).map_err(prediction_error)?;
        if !(0.0..=1.0).contains(&p1)
            || !(0.0..=1.0).contains(&p0)
            || (p0 + p1 - 1.0).abs() > PROBABILITY_SUM_TOLERANCE
        {
            return Err(prediction_error(PredictorError::InvalidProbability(p0, p1)));
        }

        let recommendation_track = RecommendationTrack::from_label(churn_label);
        let result = PredictionResult {
            churn_label,
            churn_probability: p1,
            risk_factors: RiskFactor::evaluate(profile),
            recommendation_track,
            recommendation: recommendation_track.recommendation(),
            risk_band: RiskBand::from_probability(p1),
            segment: CustomerSegment::from_cluster_label(features.cluster_label),
        };

        tracing::debug!(
            "Scored profile: label={}, probability={:.3} ({}), risk_factors={}",
            result.churn_label,
            result.churn_probability,
            result.risk_band,
            result.risk_factors.len()
        );

        Ok(ScoredProfile { result, features })
    }
}
