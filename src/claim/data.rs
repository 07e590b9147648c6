//! Claim data structures: stoppage periods and claimant facts

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::days_inclusive;
use crate::error::CalcError;
use crate::rates::{BenefitClass, RateCode};

/// Membership status of the claimant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Self-employed practitioner: always paid the full rate
    Standard,
    /// Locum practitioner: paid the chosen option share
    Locum,
    /// Collaborating spouse: paid the chosen option share
    CollaboratingSpouse,
}

impl Status {
    pub fn applies_option(&self) -> bool {
        !matches!(self, Status::Standard)
    }

    /// Multiplier applied to the base daily rate
    ///
    /// Options above 1 are percentages (50 means 0.5).
    pub fn option_factor(&self, option: f64) -> f64 {
        if !self.applies_option() {
            return 1.0;
        }
        if option > 1.0 {
            option / 100.0
        } else {
            option
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" | "m" => Some(Status::Standard),
            "locum" | "rspm" => Some(Status::Locum),
            "collaborating_spouse" | "ccpl" => Some(Status::CollaboratingSpouse),
            _ => None,
        }
    }
}

/// A declaration made after the legal deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LateDeclaration {
    pub declared_on: NaiveDate,
    /// Lateness excused by the fund; no deferral applies
    #[serde(default)]
    pub excused: bool,
}

/// A contiguous span of work incapacity as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoppagePeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,

    /// Caller's opinion on relapse; reported back, never used for control
    #[serde(default)]
    pub declared_relapse: Option<bool>,

    #[serde(default)]
    pub late_declaration: Option<LateDeclaration>,

    /// Date the contribution account was brought up to date, when late
    #[serde(default)]
    pub late_account_update: Option<NaiveDate>,

    /// Entitlement date imposed by the fund, bypassing every rule
    #[serde(default)]
    pub forced_entitlement_date: Option<NaiveDate>,

    /// Date up to which the incapacity was attested for this period
    #[serde(default)]
    pub attestation_date: Option<NaiveDate>,

    /// Medical controller opinion; `Some(false)` makes the period unpayable
    #[serde(default)]
    pub medical_control_valid: Option<bool>,
}

impl StoppagePeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            declared_relapse: None,
            late_declaration: None,
            late_account_update: None,
            forced_entitlement_date: None,
            attestation_date: None,
            medical_control_valid: None,
        }
    }

    /// Inclusive length in days
    pub fn duration(&self) -> u32 {
        days_inclusive(self.start, self.end)
    }
}

/// Claimant facts shared by every period of a claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimContext {
    pub birth_date: NaiveDate,

    /// Reference date for age, caps, and the implicit attestation
    pub as_of: NaiveDate,

    pub affiliation_date: NaiveDate,

    /// Days already paid under earlier claims
    #[serde(default)]
    pub prior_paid_days: u32,

    /// Condition pre-dates enrollment
    #[serde(default)]
    pub prior_condition: bool,

    /// Code already applied to this condition; kept unchanged when present
    #[serde(default)]
    pub historical_rate: Option<RateCode>,

    pub class: BenefitClass,
    pub status: Status,

    /// Option share, as a fraction (<= 1) or a percentage (> 1)
    pub option: f64,

    /// Social security ceiling ("PASS") used by the post-reform formula
    pub pass: f64,

    /// Replaces the computed total by `rate * payable days`
    #[serde(default)]
    pub forced_daily_rate: Option<f64>,

    /// Applied to the final total
    #[serde(default)]
    pub pro_rata: Option<f64>,

    /// Claim-wide attestation used when a period has none
    #[serde(default)]
    pub attestation_date: Option<NaiveDate>,

    /// Payments have been made up to and including this date
    #[serde(default)]
    pub last_payment_date: Option<NaiveDate>,
}

impl ClaimContext {
    /// Minimal context with standard status, full option, and no history
    pub fn new(
        birth_date: NaiveDate,
        as_of: NaiveDate,
        affiliation_date: NaiveDate,
        class: BenefitClass,
        pass: f64,
    ) -> Self {
        Self {
            birth_date,
            as_of,
            affiliation_date,
            prior_paid_days: 0,
            prior_condition: false,
            historical_rate: None,
            class,
            status: Status::Standard,
            option: 1.0,
            pass,
            forced_daily_rate: None,
            pro_rata: None,
            attestation_date: None,
            last_payment_date: None,
        }
    }

    /// Reject values that cannot describe a real claimant
    pub fn validate(&self) -> Result<(), CalcError> {
        if self.as_of < self.birth_date {
            return Err(CalcError::invalid_value("as_of", "precedes the birth date"));
        }
        if self.affiliation_date < self.birth_date {
            return Err(CalcError::invalid_value("affiliation_date", "precedes the birth date"));
        }
        if !self.pass.is_finite() || self.pass < 0.0 {
            return Err(CalcError::invalid_value("pass", "must be a non-negative amount"));
        }
        if !self.option.is_finite() || self.option <= 0.0 || self.option > 100.0 {
            return Err(CalcError::invalid_value("option", "must be in (0, 1] or (1, 100]"));
        }
        if let Some(rate) = self.forced_daily_rate {
            if !rate.is_finite() || rate < 0.0 {
                return Err(CalcError::invalid_value("forced_daily_rate", "must be non-negative"));
            }
        }
        if let Some(factor) = self.pro_rata {
            if !factor.is_finite() || factor < 0.0 {
                return Err(CalcError::invalid_value("pro_rata", "must be non-negative"));
            }
        }
        Ok(())
    }
}

/// A complete claim: periods plus claimant facts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Caller reference, echoed in batch outputs
    #[serde(default)]
    pub claim_id: Option<String>,
    pub periods: Vec<StoppagePeriod>,
    pub context: ClaimContext,
}

/// Reject periods whose start falls after their end
pub fn validate_periods(periods: &[StoppagePeriod]) -> Result<(), CalcError> {
    for (index, period) in periods.iter().enumerate() {
        if period.start > period.end {
            return Err(CalcError::PeriodOutOfOrder {
                index,
                start: period.start,
                end: period.end,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_option_factor_by_status() {
        assert_eq!(Status::Standard.option_factor(0.25), 1.0);
        assert_eq!(Status::Locum.option_factor(50.0), 0.5);
        assert_eq!(Status::CollaboratingSpouse.option_factor(0.25), 0.25);
        assert_eq!(Status::CollaboratingSpouse.option_factor(1.0), 1.0);
    }

    #[test]
    fn test_period_duration() {
        let period = StoppagePeriod::new(d(2024, 1, 1), d(2024, 3, 31));
        assert_eq!(period.duration(), 91);
    }

    #[test]
    fn test_validate_periods() {
        let periods = vec![
            StoppagePeriod::new(d(2024, 1, 1), d(2024, 1, 10)),
            StoppagePeriod::new(d(2024, 2, 10), d(2024, 2, 1)),
        ];
        match validate_periods(&periods) {
            Err(CalcError::PeriodOutOfOrder { index, .. }) => assert_eq!(index, 1),
            other => panic!("Expected PeriodOutOfOrder, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_context() {
        let mut ctx = ClaimContext::new(d(1970, 1, 1), d(2024, 1, 1), d(2000, 1, 1), BenefitClass::B, 46_368.0);
        assert!(ctx.validate().is_ok());

        ctx.option = 0.0;
        assert!(ctx.validate().is_err());

        ctx.option = 1.0;
        ctx.as_of = d(1960, 1, 1);
        assert!(ctx.validate().is_err());
    }

    #[test]
    fn test_status_parse_aliases() {
        assert_eq!(Status::parse("CCPL"), Some(Status::CollaboratingSpouse));
        assert_eq!(Status::parse("standard"), Some(Status::Standard));
        assert_eq!(Status::parse("other"), None);
    }
}
