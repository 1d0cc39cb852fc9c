//! The fixed-order feature vector consumed by the churn classifier.
//!
//! Slot order is part of the model contract: the classifier was fit on
//! exactly these 37 columns in exactly this order.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Number of slots in a [`FeatureVector`].
pub const FEATURE_COUNT: usize = 37;

/// Slot names in model order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "contract_risk_score",
    "tenure_group_encoded",
    "price_segment_encoded",
    "TotalCharges_log",
    "gender",
    "SeniorCitizen",
    "Partner",
    "Dependents",
    "PaperlessBilling",
    "is_dsl",
    "is_auto_payment",
    "is_electronic_check",
    "OnlineSecurity_binary",
    "OnlineBackup_binary",
    "DeviceProtection_binary",
    "StreamingMovies_binary",
    "MultipleLines_binary",
    "has_security_bundle",
    "has_premium_protection",
    "has_security_gap",
    "has_partial_security",
    "is_heavy_streaming",
    "long_contract_loyal",
    "fiber_mtm_risk",
    "fiber_long_contract",
    "high_price_no_services",
    "high_price_full_services",
    "new_customer_high_price",
    "paperless_no_autopay",
    "senior_no_support",
    "single_minimal_services",
    "is_flight_risk",
    "is_value_at_risk",
    "needs_retention",
    "upsell_opportunity",
    "premium_retention_target",
    "cluster_label",
];

/// Engineered features for one customer.
///
/// Built by `FeatureEngineer::transform`; never mutated afterwards.
/// Boolean slots encode as 1.0 / 0.0 in [`FeatureVector::to_array`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    /// 2 - contract ordinal (higher = shorter commitment)
    pub contract_risk_score: u8,
    /// 0: <12 months, 1: <36 months, 2: otherwise
    pub tenure_group_encoded: u8,
    /// 0: <35, 1: <70, 2: otherwise
    pub price_segment_encoded: u8,
    /// ln(1 + monthly_charges * tenure)
    pub total_charges_log: f64,
    pub is_male: bool,
    pub senior_citizen: bool,
    pub partner: bool,
    pub dependents: bool,
    pub paperless_billing: bool,
    pub is_dsl: bool,
    pub is_auto_payment: bool,
    pub is_electronic_check: bool,
    pub online_security: bool,
    pub online_backup: bool,
    pub device_protection: bool,
    pub streaming_movies: bool,
    pub multiple_lines: bool,
    pub has_security_bundle: bool,
    pub has_premium_protection: bool,
    pub has_security_gap: bool,
    pub has_partial_security: bool,
    pub is_heavy_streaming: bool,
    pub long_contract_loyal: bool,
    pub fiber_mtm_risk: bool,
    pub fiber_long_contract: bool,
    pub high_price_no_services: bool,
    pub high_price_full_services: bool,
    pub new_customer_high_price: bool,
    pub paperless_no_autopay: bool,
    pub senior_no_support: bool,
    pub single_minimal_services: bool,
    pub is_flight_risk: bool,
    pub is_value_at_risk: bool,
    pub needs_retention: bool,
    pub upsell_opportunity: bool,
    pub premium_retention_target: bool,
    /// 0: high-risk segment, 1: stable segment
    pub cluster_label: u8,
}

#[inline]
fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

impl FeatureVector {
    /// Numeric encoding in model order (see [`FEATURE_NAMES`]).
    #[must_use]
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            f64::from(self.contract_risk_score),
            f64::from(self.tenure_group_encoded),
            f64::from(self.price_segment_encoded),
            self.total_charges_log,
            flag(self.is_male),
            flag(self.senior_citizen),
            flag(self.partner),
            flag(self.dependents),
            flag(self.paperless_billing),
            flag(self.is_dsl),
            flag(self.is_auto_payment),
            flag(self.is_electronic_check),
            flag(self.online_security),
            flag(self.online_backup),
            flag(self.device_protection),
            flag(self.streaming_movies),
            flag(self.multiple_lines),
            flag(self.has_security_bundle),
            flag(self.has_premium_protection),
            flag(self.has_security_gap),
            flag(self.has_partial_security),
            flag(self.is_heavy_streaming),
            flag(self.long_contract_loyal),
            flag(self.fiber_mtm_risk),
            flag(self.fiber_long_contract),
            flag(self.high_price_no_services),
            flag(self.high_price_full_services),
            flag(self.new_customer_high_price),
            flag(self.paperless_no_autopay),
            flag(self.senior_no_support),
            flag(self.single_minimal_services),
            flag(self.is_flight_risk),
            flag(self.is_value_at_risk),
            flag(self.needs_retention),
            flag(self.upsell_opportunity),
            flag(self.premium_retention_target),
            f64::from(self.cluster_label),
        ]
    }

    /// `(name, value)` pairs in model order, for inspection and debugging.
    #[must_use]
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        FEATURE_NAMES.iter().copied().zip(self.to_array()).collect()
    }

    /// Look up a slot by its model column name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.to_array()[i])
    }
}

impl Serialize for FeatureVector {
    /// Serializes as an ordered `name -> value` map.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let values = self.to_array();
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for (name, value) in FEATURE_NAMES.iter().zip(values.iter()) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> FeatureVector {
        FeatureVector {
            contract_risk_score: 0,
            tenure_group_encoded: 0,
            price_segment_encoded: 0,
            total_charges_log: 0.0,
            is_male: false,
            senior_citizen: false,
            partner: false,
            dependents: false,
            paperless_billing: false,
            is_dsl: false,
            is_auto_payment: false,
            is_electronic_check: false,
            online_security: false,
            online_backup: false,
            device_protection: false,
            streaming_movies: false,
            multiple_lines: false,
            has_security_bundle: false,
            has_premium_protection: false,
            has_security_gap: false,
            has_partial_security: false,
            is_heavy_streaming: false,
            long_contract_loyal: false,
            fiber_mtm_risk: false,
            fiber_long_contract: false,
            high_price_no_services: false,
            high_price_full_services: false,
            new_customer_high_price: false,
            paperless_no_autopay: false,
            senior_no_support: false,
            single_minimal_services: false,
            is_flight_risk: false,
            is_value_at_risk: false,
            needs_retention: false,
            upsell_opportunity: false,
            premium_retention_target: false,
            cluster_label: 0,
        }
    }

    #[test]
    fn test_names_are_unique() {
        let mut names = FEATURE_NAMES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_slot_positions() {
        let v = FeatureVector {
            contract_risk_score: 2,
            total_charges_log: 3.5,
            is_dsl: true,
            has_security_gap: true,
            cluster_label: 1,
            ..blank()
        };
        let arr = v.to_array();
        assert!((arr[0] - 2.0).abs() < f64::EPSILON);
        assert!((arr[3] - 3.5).abs() < f64::EPSILON);
        assert!((arr[9] - 1.0).abs() < f64::EPSILON);
        assert!((arr[19] - 1.0).abs() < f64::EPSILON);
        assert!((arr[36] - 1.0).abs() < f64::EPSILON);
        assert_eq!(arr.iter().filter(|x| **x != 0.0).count(), 5);

        assert_eq!(v.get("is_dsl"), Some(1.0));
        assert_eq!(v.get("has_security_gap"), Some(1.0));
        assert_eq!(v.get("not_a_feature"), None);
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let v = FeatureVector {
            is_male: true,
            ..blank()
        };
        let json = serde_json::to_string(&v).expect("Should serialize");
        assert!(json.starts_with(r#"{"contract_risk_score":0"#));
        assert!(json.contains(r#""gender":1.0"#));
        assert!(json.ends_with(r#""cluster_label":0.0}"#));
    }
}
