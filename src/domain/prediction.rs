//! Prediction result types.
//!
//! Represents the interpreted output of a churn scoring call.

use serde::{Serialize, Serializer};

use super::profile::{CustomerProfile, PaymentMethod};

/// Heuristic churn risk factors shown alongside a prediction.
///
/// These are fixed explanation rules, not model feature importances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskFactor {
    MonthToMonthContract,
    NewCustomer,
    ElectronicCheckPayment,
    FiberMonthToMonth,
    HighMonthlyCharges,
    NoSecurityServices,
}

impl RiskFactor {
    /// Checklist order used when collecting factors.
    pub const CHECKLIST: [RiskFactor; 6] = [
        Self::MonthToMonthContract,
        Self::NewCustomer,
        Self::ElectronicCheckPayment,
        Self::FiberMonthToMonth,
        Self::HighMonthlyCharges,
        Self::NoSecurityServices,
    ];

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::MonthToMonthContract => "Month-to-month contract (highest churn rate)",
            Self::NewCustomer => "New customer (< 12 months tenure)",
            Self::ElectronicCheckPayment => "Electronic check payment (less reliable)",
            Self::FiberMonthToMonth => "Fiber optic + month-to-month (high-risk combo)",
            Self::HighMonthlyCharges => "High monthly charges (price sensitivity)",
            Self::NoSecurityServices => "No security/support services (low engagement)",
        }
    }

    /// Whether this factor applies to the given profile.
    #[must_use]
    pub fn applies_to(&self, profile: &CustomerProfile) -> bool {
        let signals = profile.signals();
        match self {
            Self::MonthToMonthContract => signals.is_month_to_month,
            Self::NewCustomer => profile.tenure < 12,
            Self::ElectronicCheckPayment => profile.payment_method == PaymentMethod::ElectronicCheck,
            Self::FiberMonthToMonth => signals.is_fiber && signals.is_month_to_month,
            Self::HighMonthlyCharges => profile.monthly_charges > 70.0,
            Self::NoSecurityServices => signals.security_count == 0,
        }
    }

    /// All factors that apply, in checklist order. Empty means no flagged risk.
    #[must_use]
    pub fn evaluate(profile: &CustomerProfile) -> Vec<RiskFactor> {
        Self::CHECKLIST
            .iter()
            .copied()
            .filter(|factor| factor.applies_to(profile))
            .collect()
    }
}

impl std::fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

impl Serialize for RiskFactor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.description())
    }
}

/// Follow-up track chosen from the predicted label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTrack {
    /// Predicted to churn: intervene now
    ProactiveRetention,
    /// Predicted to stay: keep the relationship healthy
    Loyalty,
}

impl RecommendationTrack {
    #[must_use]
    pub fn from_label(churn: bool) -> Self {
        if churn {
            Self::ProactiveRetention
        } else {
            Self::Loyalty
        }
    }

    #[must_use]
    pub fn headline(&self) -> &'static str {
        match self {
            Self::ProactiveRetention => "Immediate Actions",
            Self::Loyalty => "Retention Strategy",
        }
    }

    #[must_use]
    pub fn actions(&self) -> &'static [&'static str] {
        match self {
            Self::ProactiveRetention => &[
                "Reach out proactively within 7 days",
                "Offer contract upgrade incentives",
                "Provide personalized service bundle discount",
                "Assign dedicated customer success manager",
            ],
            Self::Loyalty => &[
                "Continue excellent service",
                "Offer loyalty rewards",
                "Periodic check-ins",
                "Upsell premium services when appropriate",
            ],
        }
    }

    #[must_use]
    pub fn recommendation(&self) -> Recommendation {
        Recommendation {
            headline: self.headline(),
            actions: self.actions(),
        }
    }
}

/// Headline and follow-up actions shown with a prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub headline: &'static str,
    pub actions: &'static [&'static str],
}

/// Churn probability band for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    /// Probability below 0.3
    Low,
    /// Probability in [0.3, 0.7)
    Moderate,
    /// Probability of 0.7 or more
    High,
}

impl RiskBand {
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        if probability < 0.3 {
            Self::Low
        } else if probability < 0.7 {
            Self::Moderate
        } else {
            Self::High
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Behavioural segment, mirroring the engineered `cluster_label` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSegment {
    /// Short tenure or high monthly charges (cluster 0)
    HighRisk,
    /// Everyone else (cluster 1)
    Stable,
}

impl CustomerSegment {
    #[must_use]
    pub fn from_cluster_label(label: u8) -> Self {
        if label == 0 {
            Self::HighRisk
        } else {
            Self::Stable
        }
    }
}

/// Interpreted result of scoring one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Label returned by the predictor (true = churn)
    pub churn_label: bool,

    /// Predicted probability of churn, in [0, 1]
    pub churn_probability: f64,

    /// Heuristic reasons, in checklist order
    pub risk_factors: Vec<RiskFactor>,

    pub recommendation_track: RecommendationTrack,

    /// What to do about it, per `recommendation_track`
    pub recommendation: Recommendation,

    pub risk_band: RiskBand,

    pub segment: CustomerSegment,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{Contract, InternetService, YesNo};

    #[test]
    fn test_risk_band_from_probability() {
        assert_eq!(RiskBand::from_probability(0.1), RiskBand::Low);
        assert_eq!(RiskBand::from_probability(0.3), RiskBand::Moderate);
        assert_eq!(RiskBand::from_probability(0.69), RiskBand::Moderate);
        assert_eq!(RiskBand::from_probability(0.7), RiskBand::High);
    }

    #[test]
    fn test_checklist_order() {
        let profile = CustomerProfile {
            contract: Contract::MonthToMonth,
            tenure: 3,
            payment_method: PaymentMethod::ElectronicCheck,
            internet_service: InternetService::FiberOptic,
            monthly_charges: 85.0,
            ..Default::default()
        };
        assert_eq!(RiskFactor::evaluate(&profile), RiskFactor::CHECKLIST.to_vec());
    }

    #[test]
    fn test_no_risk_factors() {
        let profile = CustomerProfile {
            contract: Contract::TwoYear,
            tenure: 48,
            payment_method: PaymentMethod::BankTransferAutomatic,
            internet_service: InternetService::Dsl,
            monthly_charges: 55.0,
            online_security: YesNo::Yes,
            ..Default::default()
        };
        assert!(RiskFactor::evaluate(&profile).is_empty());
    }

    #[test]
    fn test_charges_threshold_is_strict() {
        let profile = CustomerProfile {
            contract: Contract::OneYear,
            tenure: 30,
            payment_method: PaymentMethod::MailedCheck,
            monthly_charges: 70.0,
            tech_support: YesNo::Yes,
            ..Default::default()
        };
        assert!(RiskFactor::evaluate(&profile).is_empty());
    }

    #[test]
    fn test_recommendation_track() {
        assert_eq!(
            RecommendationTrack::from_label(true),
            RecommendationTrack::ProactiveRetention
        );
        assert_eq!(RecommendationTrack::from_label(false), RecommendationTrack::Loyalty);
        let loyalty = RecommendationTrack::Loyalty.recommendation();
        assert_eq!(loyalty.headline, "Retention Strategy");
        assert_eq!(loyalty.actions.len(), 4);

        let json = serde_json::to_value(RecommendationTrack::ProactiveRetention.recommendation())
            .expect("Should serialize");
        assert_eq!(json["headline"], "Immediate Actions");
        assert_eq!(json["actions"][0], "Reach out proactively within 7 days");
    }

    #[test]
    fn test_risk_factor_serializes_as_text() {
        let json = serde_json::to_string(&vec![RiskFactor::NewCustomer]).expect("Should serialize");
        assert_eq!(json, r#"["New customer (< 12 months tenure)"]"#);
    }
}
