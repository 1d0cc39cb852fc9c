//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O.
//! Categorical inputs are closed enums and all types are serializable.

mod features;
mod prediction;
mod profile;

pub use features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use prediction::{
    CustomerSegment, PredictionResult, Recommendation, RecommendationTrack, RiskBand,
    RiskFactor,
};
pub use profile::{
    Contract, CustomerProfile, Gender, InternetService, PaymentMethod, ProfileSignals,
    RawCustomerProfile, YesNo, MONTHLY_CHARGES_RANGE, TENURE_RANGE,
};
