//! Feature engineering: customer profile -> model feature vector.
//!
//! Pure and deterministic. The derived flags must match the definitions the
//! classifier was trained with, slot for slot.

use crate::domain::{
    Contract, CustomerProfile, FeatureVector, Gender, RawCustomerProfile, YesNo,
};
use crate::{ChurnError, Result};

/// Builds the classifier's feature vector from a customer profile.
pub struct FeatureEngineer;

/// 0: under a year, 1: under three years, 2: otherwise.
fn tenure_group(tenure: u32) -> u8 {
    if tenure < 12 {
        0
    } else if tenure < 36 {
        1
    } else {
        2
    }
}

/// 0: budget (<35), 1: mid (<70), 2: premium.
fn price_segment(monthly_charges: f64) -> u8 {
    if monthly_charges < 35.0 {
        0
    } else if monthly_charges < 70.0 {
        1
    } else {
        2
    }
}

impl FeatureEngineer {
    /// Transform a validated profile.
    ///
    /// # Errors
    /// Returns `ChurnError::InvalidProfile` if a numeric field is out of range.
    pub fn transform(profile: &CustomerProfile) -> Result<FeatureVector> {
        profile.validate().map_err(ChurnError::InvalidProfile)?;

        let s = profile.signals();
        let tenure = profile.tenure;
        let charges = profile.monthly_charges;
        let mtm = s.is_month_to_month;
        let high_price = charges > 70.0;

        Ok(FeatureVector {
            contract_risk_score: 2 - profile.contract.encoded(),
            tenure_group_encoded: tenure_group(tenure),
            price_segment_encoded: price_segment(charges),
            total_charges_log: (charges * f64::from(tenure)).ln_1p(),
            is_male: profile.gender == Gender::Male,
            senior_citizen: profile.senior_citizen.is_yes(),
            partner: profile.partner.is_yes(),
            dependents: profile.dependents.is_yes(),
            paperless_billing: profile.paperless_billing.is_yes(),
            is_dsl: s.is_dsl,
            is_auto_payment: s.is_auto_payment,
            is_electronic_check: s.is_electronic_check,
            online_security: profile.online_security.is_yes(),
            online_backup: profile.online_backup.is_yes(),
            device_protection: profile.device_protection.is_yes(),
            streaming_movies: profile.streaming_movies.is_yes(),
            multiple_lines: profile.multiple_lines.is_yes(),
            has_security_bundle: s.security_count >= 3,
            has_premium_protection: s.security_count == 4,
            has_security_gap: s.has_internet && s.security_count == 0,
            has_partial_security: (1..=2).contains(&s.security_count),
            is_heavy_streaming: profile.streaming_tv.is_yes() && profile.streaming_movies.is_yes(),
            long_contract_loyal: !mtm && tenure > 24,
            fiber_mtm_risk: s.is_fiber && mtm,
            fiber_long_contract: s.is_fiber && profile.contract == Contract::TwoYear,
            high_price_no_services: high_price && s.security_count == 0,
            high_price_full_services: high_price && s.security_count >= 2,
            new_customer_high_price: tenure < 6 && high_price,
            paperless_no_autopay: profile.paperless_billing.is_yes() && !s.is_auto_payment,
            senior_no_support: profile.senior_citizen.is_yes()
                && profile.tech_support == YesNo::No,
            single_minimal_services: !profile.partner.is_yes()
                && !profile.dependents.is_yes()
                && s.security_count <= 1,
            is_flight_risk: mtm && s.is_electronic_check,
            is_value_at_risk: high_price && s.is_fiber && mtm,
            needs_retention: mtm && tenure < 12,
            upsell_opportunity: tenure > 12 && s.security_count < 2 && charges < 70.0,
            premium_retention_target: high_price && tenure > 12,
            cluster_label: if tenure < 12 || charges > 80.0 { 0 } else { 1 },
        })
    }

    /// Parse a string-typed profile, then transform it.
    ///
    /// # Errors
    /// Returns `ChurnError::InvalidProfile` listing every out-of-domain
    /// categorical value and out-of-range numeric field.
    pub fn transform_raw(raw: &RawCustomerProfile) -> Result<FeatureVector> {
        let profile = CustomerProfile::try_from(raw).map_err(ChurnError::InvalidProfile)?;
        Self::transform(&profile)
    }
}
