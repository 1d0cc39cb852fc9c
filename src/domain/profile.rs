//! Customer profile types for churn scoring.
//!
//! Categorical fields are closed enums; the string-typed boundary used by
//! forms, files and other callers is [`RawCustomerProfile`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Valid tenure range in months (inclusive).
pub const TENURE_RANGE: std::ops::RangeInclusive<u32> = 0..=72;

/// Valid monthly charges range in currency units (inclusive).
pub const MONTHLY_CHARGES_RANGE: std::ops::RangeInclusive<f64> = 18.0..=120.0;

/// Declares a closed categorical domain with its canonical labels.
macro_rules! categorical {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Canonical label as it appears in the source data.
            #[must_use]
            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(Self::$variant),)+
                    other => Err(format!(
                        "{} {:?} is not one of [{}]",
                        $field,
                        other,
                        [$($label),+].join(", ")
                    )),
                }
            }
        }
    };
}

categorical! {
    /// Customer gender.
    Gender, "gender" {
        Male => "Male",
        Female => "Female",
    }
}

categorical! {
    /// A "Yes"/"No" service or demographic flag.
    YesNo, "flag" {
        Yes => "Yes",
        No => "No",
    }
}

categorical! {
    /// Contract commitment length.
    Contract, "contract" {
        MonthToMonth => "Month-to-month",
        OneYear => "One year",
        TwoYear => "Two year",
    }
}

categorical! {
    /// Internet service type.
    InternetService, "internet_service" {
        No => "No",
        Dsl => "DSL",
        FiberOptic => "Fiber optic",
    }
}

categorical! {
    /// Billing payment method.
    PaymentMethod, "payment_method" {
        ElectronicCheck => "Electronic check",
        MailedCheck => "Mailed check",
        BankTransferAutomatic => "Bank transfer (automatic)",
        CreditCardAutomatic => "Credit card (automatic)",
    }
}

impl YesNo {
    #[must_use]
    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }
}

impl Contract {
    /// Ordinal encoding: 0 = month-to-month, 1 = one year, 2 = two year.
    #[must_use]
    pub fn encoded(self) -> u8 {
        match self {
            Self::MonthToMonth => 0,
            Self::OneYear => 1,
            Self::TwoYear => 2,
        }
    }
}

impl PaymentMethod {
    /// Whether the method is one of the "(automatic)" methods.
    #[must_use]
    pub fn is_automatic(self) -> bool {
        self.label().contains("automatic")
    }
}

/// Validated customer profile.
///
/// Construct directly with typed values, or from a [`RawCustomerProfile`]
/// via `TryFrom`. Numeric ranges are checked by [`CustomerProfile::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub gender: Gender,
    pub senior_citizen: YesNo,
    pub partner: YesNo,
    pub dependents: YesNo,

    /// Months with the company (0-72)
    pub tenure: u32,
    pub contract: Contract,
    pub paperless_billing: YesNo,
    pub payment_method: PaymentMethod,

    pub phone_service: YesNo,
    pub multiple_lines: YesNo,
    pub internet_service: InternetService,

    /// Monthly charges (18.0-120.0)
    pub monthly_charges: f64,

    pub online_security: YesNo,
    pub online_backup: YesNo,
    pub device_protection: YesNo,
    pub tech_support: YesNo,

    pub streaming_tv: YesNo,
    pub streaming_movies: YesNo,
}

impl Default for CustomerProfile {
    /// The scoring form's initial state.
    fn default() -> Self {
        Self {
            gender: Gender::Male,
            senior_citizen: YesNo::No,
            partner: YesNo::No,
            dependents: YesNo::No,
            tenure: 12,
            contract: Contract::MonthToMonth,
            paperless_billing: YesNo::No,
            payment_method: PaymentMethod::ElectronicCheck,
            phone_service: YesNo::No,
            multiple_lines: YesNo::No,
            internet_service: InternetService::No,
            monthly_charges: 65.0,
            online_security: YesNo::No,
            online_backup: YesNo::No,
            device_protection: YesNo::No,
            tech_support: YesNo::No,
            streaming_tv: YesNo::No,
            streaming_movies: YesNo::No,
        }
    }
}

/// Intermediate quantities shared by several feature slots and the
/// risk factor checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileSignals {
    /// Number of security/support add-ons subscribed (0-4).
    pub security_count: u8,
    pub has_internet: bool,
    pub is_fiber: bool,
    pub is_dsl: bool,
    pub is_auto_payment: bool,
    pub is_electronic_check: bool,
    pub is_month_to_month: bool,
}

impl CustomerProfile {
    /// Validate numeric fields against their declared ranges.
    ///
    /// # Errors
    /// Returns every violation found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !TENURE_RANGE.contains(&self.tenure) {
            errors.push(format!(
                "tenure {} out of range [{}, {}]",
                self.tenure,
                TENURE_RANGE.start(),
                TENURE_RANGE.end()
            ));
        }
        if !self.monthly_charges.is_finite()
            || !MONTHLY_CHARGES_RANGE.contains(&self.monthly_charges)
        {
            errors.push(format!(
                "monthly_charges {} out of range [{}, {}]",
                self.monthly_charges,
                MONTHLY_CHARGES_RANGE.start(),
                MONTHLY_CHARGES_RANGE.end()
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Number of security/support add-ons set to "Yes".
    #[must_use]
    pub fn security_count(&self) -> u8 {
        [
            self.online_security,
            self.online_backup,
            self.device_protection,
            self.tech_support,
        ]
        .iter()
        .filter(|flag| flag.is_yes())
        .count() as u8
    }

    #[must_use]
    pub fn signals(&self) -> ProfileSignals {
        ProfileSignals {
            security_count: self.security_count(),
            has_internet: self.internet_service != InternetService::No,
            is_fiber: self.internet_service == InternetService::FiberOptic,
            is_dsl: self.internet_service == InternetService::Dsl,
            is_auto_payment: self.payment_method.is_automatic(),
            is_electronic_check: self.payment_method == PaymentMethod::ElectronicCheck,
            is_month_to_month: self.contract == Contract::MonthToMonth,
        }
    }
}

/// String-typed customer profile as received from a form, file or request.
///
/// Field names match [`CustomerProfile`]; categorical values use the
/// dataset's labels ("Yes", "Fiber optic", "Two year", ...). Numeric
/// fields are wide enough to carry out-of-range values to validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCustomerProfile {
    pub gender: String,
    pub senior_citizen: String,
    pub partner: String,
    pub dependents: String,
    pub tenure: i64,
    pub contract: String,
    pub paperless_billing: String,
    pub payment_method: String,
    pub phone_service: String,
    pub multiple_lines: String,
    pub internet_service: String,
    pub monthly_charges: f64,
    pub online_security: String,
    pub online_backup: String,
    pub device_protection: String,
    pub tech_support: String,
    pub streaming_tv: String,
    pub streaming_movies: String,
}

impl From<&CustomerProfile> for RawCustomerProfile {
    fn from(p: &CustomerProfile) -> Self {
        Self {
            gender: p.gender.label().to_string(),
            senior_citizen: p.senior_citizen.label().to_string(),
            partner: p.partner.label().to_string(),
            dependents: p.dependents.label().to_string(),
            tenure: i64::from(p.tenure),
            contract: p.contract.label().to_string(),
            paperless_billing: p.paperless_billing.label().to_string(),
            payment_method: p.payment_method.label().to_string(),
            phone_service: p.phone_service.label().to_string(),
            multiple_lines: p.multiple_lines.label().to_string(),
            internet_service: p.internet_service.label().to_string(),
            monthly_charges: p.monthly_charges,
            online_security: p.online_security.label().to_string(),
            online_backup: p.online_backup.label().to_string(),
            device_protection: p.device_protection.label().to_string(),
            tech_support: p.tech_support.label().to_string(),
            streaming_tv: p.streaming_tv.label().to_string(),
            streaming_movies: p.streaming_movies.label().to_string(),
        }
    }
}

/// Parses one field, recording the failure under the field's name.
fn parse_field<T>(name: &str, value: &str, errors: &mut Vec<String>) -> Option<T>
where
    T: FromStr<Err = String>,
{
    match value.parse::<T>() {
        Ok(v) => Some(v),
        Err(e) => {
            errors.push(format!("{name}: {e}"));
            None
        }
    }
}

impl TryFrom<&RawCustomerProfile> for CustomerProfile {
    type Error = Vec<String>;

    /// Parse and validate every field, collecting all violations.
    fn try_from(raw: &RawCustomerProfile) -> Result<Self, Self::Error> {
        let mut errors = Vec::new();

        let gender = parse_field::<Gender>("gender", &raw.gender, &mut errors);
        let senior_citizen = parse_field::<YesNo>("senior_citizen", &raw.senior_citizen, &mut errors);
        let partner = parse_field::<YesNo>("partner", &raw.partner, &mut errors);
        let dependents = parse_field::<YesNo>("dependents", &raw.dependents, &mut errors);
        let contract = parse_field::<Contract>("contract", &raw.contract, &mut errors);
        let paperless_billing =
            parse_field::<YesNo>("paperless_billing", &raw.paperless_billing, &mut errors);
        let payment_method =
            parse_field::<PaymentMethod>("payment_method", &raw.payment_method, &mut errors);
        let phone_service = parse_field::<YesNo>("phone_service", &raw.phone_service, &mut errors);
        let multiple_lines = parse_field::<YesNo>("multiple_lines", &raw.multiple_lines, &mut errors);
        let internet_service =
            parse_field::<InternetService>("internet_service", &raw.internet_service, &mut errors);
        let online_security =
            parse_field::<YesNo>("online_security", &raw.online_security, &mut errors);
        let online_backup = parse_field::<YesNo>("online_backup", &raw.online_backup, &mut errors);
        let device_protection =
            parse_field::<YesNo>("device_protection", &raw.device_protection, &mut errors);
        let tech_support = parse_field::<YesNo>("tech_support", &raw.tech_support, &mut errors);
        let streaming_tv = parse_field::<YesNo>("streaming_tv", &raw.streaming_tv, &mut errors);
        let streaming_movies =
            parse_field::<YesNo>("streaming_movies", &raw.streaming_movies, &mut errors);

        let tenure = u32::try_from(raw.tenure)
            .ok()
            .filter(|t| TENURE_RANGE.contains(t));
        if tenure.is_none() {
            errors.push(format!(
                "tenure {} out of range [{}, {}]",
                raw.tenure,
                TENURE_RANGE.start(),
                TENURE_RANGE.end()
            ));
        }
        if !raw.monthly_charges.is_finite() || !MONTHLY_CHARGES_RANGE.contains(&raw.monthly_charges)
        {
            errors.push(format!(
                "monthly_charges {} out of range [{}, {}]",
                raw.monthly_charges,
                MONTHLY_CHARGES_RANGE.start(),
                MONTHLY_CHARGES_RANGE.end()
            ));
        }

        match (
            gender,
            senior_citizen,
            partner,
            dependents,
            tenure,
            contract,
            paperless_billing,
            payment_method,
            phone_service,
            multiple_lines,
            internet_service,
            online_security,
            online_backup,
            device_protection,
            tech_support,
            streaming_tv,
            streaming_movies,
        ) {
            (
                Some(gender),
                Some(senior_citizen),
                Some(partner),
                Some(dependents),
                Some(tenure),
                Some(contract),
                Some(paperless_billing),
                Some(payment_method),
                Some(phone_service),
                Some(multiple_lines),
                Some(internet_service),
                Some(online_security),
                Some(online_backup),
                Some(device_protection),
                Some(tech_support),
                Some(streaming_tv),
                Some(streaming_movies),
            ) if errors.is_empty() => Ok(Self {
                gender,
                senior_citizen,
                partner,
                dependents,
                tenure,
                contract,
                paperless_billing,
                payment_method,
                phone_service,
                multiple_lines,
                internet_service,
                monthly_charges: raw.monthly_charges,
                online_security,
                online_backup,
                device_protection,
                tech_support,
                streaming_tv,
                streaming_movies,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorical_parsing() {
        assert_eq!("Fiber optic".parse::<InternetService>(), Ok(InternetService::FiberOptic));
        assert_eq!("Two year".parse::<Contract>(), Ok(Contract::TwoYear));
        assert!("fiber optic".parse::<InternetService>().is_err());
        assert!("Quarterly".parse::<Contract>().is_err());
    }

    #[test]
    fn test_automatic_payment_methods() {
        assert!(PaymentMethod::BankTransferAutomatic.is_automatic());
        assert!(PaymentMethod::CreditCardAutomatic.is_automatic());
        assert!(!PaymentMethod::ElectronicCheck.is_automatic());
        assert!(!PaymentMethod::MailedCheck.is_automatic());
    }

    #[test]
    fn test_security_count() {
        let mut profile = CustomerProfile::default();
        assert_eq!(profile.security_count(), 0);

        profile.online_security = YesNo::Yes;
        profile.tech_support = YesNo::Yes;
        assert_eq!(profile.security_count(), 2);

        // Streaming add-ons are not security services.
        profile.streaming_tv = YesNo::Yes;
        assert_eq!(profile.security_count(), 2);
    }

    #[test]
    fn test_validation() {
        assert!(CustomerProfile::default().validate().is_ok());

        let invalid = CustomerProfile {
            tenure: 73,
            monthly_charges: 17.5,
            ..Default::default()
        };
        let errors = invalid.validate().unwrap_err();
        assert_eq!(errors.len(), 2);

        let nan = CustomerProfile {
            monthly_charges: f64::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_raw_roundtrip_through_labels() {
        let profile = CustomerProfile {
            contract: Contract::OneYear,
            payment_method: PaymentMethod::CreditCardAutomatic,
            internet_service: InternetService::Dsl,
            ..Default::default()
        };
        let raw = RawCustomerProfile::from(&profile);
        assert_eq!(raw.contract, "One year");
        assert_eq!(CustomerProfile::try_from(&raw), Ok(profile));
    }

    #[test]
    fn test_raw_collects_every_violation() {
        let mut raw = RawCustomerProfile::from(&CustomerProfile::default());
        raw.contract = "Quarterly".to_string();
        raw.partner = "Maybe".to_string();
        raw.tenure = 100;

        let errors = CustomerProfile::try_from(&raw).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("partner"));
        assert!(errors.iter().any(|e| e.contains("Quarterly")));
        assert!(errors.iter().any(|e| e.starts_with("tenure")));
    }

    #[test]
    fn test_negative_tenure_reaches_validation() {
        let mut value =
            serde_json::to_value(RawCustomerProfile::from(&CustomerProfile::default()))
                .expect("Should serialize");
        value["tenure"] = serde_json::json!(-1);

        let raw: RawCustomerProfile = serde_json::from_value(value).expect("Should parse");
        let errors = CustomerProfile::try_from(&raw).unwrap_err();
        assert_eq!(errors, vec!["tenure -1 out of range [0, 72]".to_string()]);

        let huge = RawCustomerProfile {
            tenure: i64::from(u32::MAX) + 1,
            ..raw
        };
        assert!(CustomerProfile::try_from(&huge).is_err());
    }

    #[test]
    fn test_profile_deserializes_dataset_labels() {
        let json = r#"{
            "gender": "Female", "senior_citizen": "Yes", "partner": "No",
            "dependents": "No", "tenure": 5, "contract": "Month-to-month",
            "paperless_billing": "Yes", "payment_method": "Mailed check",
            "phone_service": "Yes", "multiple_lines": "No",
            "internet_service": "DSL", "monthly_charges": 45.5,
            "online_security": "No", "online_backup": "Yes",
            "device_protection": "No", "tech_support": "No",
            "streaming_tv": "No", "streaming_movies": "No"
        }"#;
        let profile: CustomerProfile = serde_json::from_str(json).expect("Should parse");
        assert_eq!(profile.gender, Gender::Female);
        assert_eq!(profile.payment_method, PaymentMethod::MailedCheck);
        assert_eq!(profile.security_count(), 1);
    }
}
