//! Load claims from JSON
//!
//! The front ends hand over loosely typed JSON; this module turns it into
//! typed values and names the offending field when something is wrong.

use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::{Claim, ClaimContext, LateDeclaration, Status, StoppagePeriod};
use crate::calendar::parse_date;
use crate::error::CalcError;
use crate::rates::{BenefitClass, RateCode};

/// Raw period as found in the request body
#[derive(Debug, Deserialize)]
struct RawPeriod {
    start: Option<String>,
    end: Option<String>,
    #[serde(default)]
    declared_relapse: Option<bool>,
    #[serde(default)]
    late_declaration_date: Option<String>,
    #[serde(default)]
    late_declaration_excused: bool,
    #[serde(default)]
    late_account_update: Option<String>,
    #[serde(default)]
    forced_entitlement_date: Option<String>,
    #[serde(default)]
    attestation_date: Option<String>,
    #[serde(default)]
    medical_control_valid: Option<bool>,
}

/// Raw claim as found in the request body
#[derive(Debug, Deserialize)]
struct RawClaim {
    #[serde(default)]
    claim_id: Option<String>,
    birth_date: Option<String>,
    as_of: Option<String>,
    affiliation_date: Option<String>,
    #[serde(default)]
    prior_paid_days: u32,
    #[serde(default)]
    prior_condition: bool,
    #[serde(default)]
    historical_rate: Option<u8>,
    #[serde(default)]
    class: Option<String>,
    /// Income two years prior, used when `class` is absent
    #[serde(default)]
    income: Option<f64>,
    #[serde(default)]
    assessed_by_default: bool,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    option: Option<f64>,
    pass: Option<f64>,
    #[serde(default)]
    forced_daily_rate: Option<f64>,
    #[serde(default)]
    pro_rata: Option<f64>,
    #[serde(default)]
    attestation_date: Option<String>,
    #[serde(default)]
    last_payment_date: Option<String>,
    periods: Option<Vec<RawPeriod>>,
}

fn required_date(field: &str, value: Option<&String>) -> Result<NaiveDate, CalcError> {
    let raw = value.ok_or_else(|| CalcError::MissingField(field.to_string()))?;
    parse_date(raw).ok_or_else(|| CalcError::InvalidDate {
        field: field.to_string(),
        value: raw.clone(),
    })
}

fn optional_date(field: &str, value: Option<&String>) -> Result<Option<NaiveDate>, CalcError> {
    match value {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_date(raw).map(Some).ok_or_else(|| CalcError::InvalidDate {
            field: field.to_string(),
            value: raw.clone(),
        }),
    }
}

impl RawPeriod {
    fn to_period(&self, index: usize) -> Result<StoppagePeriod, CalcError> {
        let field = |name: &str| format!("periods[{}].{}", index, name);

        let late_declaration = optional_date(&field("late_declaration_date"), self.late_declaration_date.as_ref())?
            .map(|declared_on| LateDeclaration {
                declared_on,
                excused: self.late_declaration_excused,
            });

        Ok(StoppagePeriod {
            start: required_date(&field("start"), self.start.as_ref())?,
            end: required_date(&field("end"), self.end.as_ref())?,
            declared_relapse: self.declared_relapse,
            late_declaration,
            late_account_update: optional_date(&field("late_account_update"), self.late_account_update.as_ref())?,
            forced_entitlement_date: optional_date(
                &field("forced_entitlement_date"),
                self.forced_entitlement_date.as_ref(),
            )?,
            attestation_date: optional_date(&field("attestation_date"), self.attestation_date.as_ref())?,
            medical_control_valid: self.medical_control_valid,
        })
    }
}

impl RawClaim {
    fn to_claim(self) -> Result<Claim, CalcError> {
        let pass = self.pass.ok_or_else(|| CalcError::MissingField("pass".to_string()))?;

        let class = match (&self.class, self.income) {
            (Some(raw), _) => BenefitClass::parse(raw)
                .ok_or_else(|| CalcError::invalid_value("class", format!("unknown class {:?}", raw)))?,
            (None, Some(income)) => BenefitClass::from_income(income, pass, self.assessed_by_default),
            (None, None) if self.assessed_by_default => BenefitClass::A,
            (None, None) => return Err(CalcError::MissingField("class".to_string())),
        };

        let status = match &self.status {
            Some(raw) => Status::parse(raw)
                .ok_or_else(|| CalcError::invalid_value("status", format!("unknown status {:?}", raw)))?,
            None => Status::Standard,
        };

        let historical_rate = match self.historical_rate {
            Some(code) => Some(
                RateCode::new(code)
                    .ok_or_else(|| CalcError::invalid_value("historical_rate", format!("{} is not 1-9", code)))?,
            ),
            None => None,
        };

        let raw_periods = self
            .periods
            .ok_or_else(|| CalcError::MissingField("periods".to_string()))?;
        let periods = raw_periods
            .iter()
            .enumerate()
            .map(|(i, p)| p.to_period(i))
            .collect::<Result<Vec<_>, _>>()?;

        let context = ClaimContext {
            birth_date: required_date("birth_date", self.birth_date.as_ref())?,
            as_of: required_date("as_of", self.as_of.as_ref())?,
            affiliation_date: required_date("affiliation_date", self.affiliation_date.as_ref())?,
            prior_paid_days: self.prior_paid_days,
            prior_condition: self.prior_condition,
            historical_rate,
            class,
            status,
            option: self.option.unwrap_or(1.0),
            pass,
            forced_daily_rate: self.forced_daily_rate,
            pro_rata: self.pro_rata,
            attestation_date: optional_date("attestation_date", self.attestation_date.as_ref())?,
            last_payment_date: optional_date("last_payment_date", self.last_payment_date.as_ref())?,
        };
        context.validate()?;

        Ok(Claim {
            claim_id: self.claim_id,
            periods,
            context,
        })
    }
}

/// Parse a single claim from a JSON string
pub fn parse_claim_json(json: &str) -> Result<Claim, CalcError> {
    let raw: RawClaim = serde_json::from_str(json)?;
    raw.to_claim()
}

/// Parse a JSON array of claims
pub fn parse_claims_json(json: &str) -> Result<Vec<Claim>, CalcError> {
    let raw: Vec<RawClaim> = serde_json::from_str(json)?;
    raw.into_iter().map(RawClaim::to_claim).collect()
}

/// Load a single claim from any reader
pub fn load_claim_from_reader<R: Read>(reader: R) -> Result<Claim, CalcError> {
    let raw: RawClaim = serde_json::from_reader(reader)?;
    raw.to_claim()
}

/// Load a single claim from a JSON file
pub fn load_claim<P: AsRef<Path>>(path: P) -> Result<Claim, CalcError> {
    let file = File::open(path)?;
    load_claim_from_reader(BufReader::new(file))
}
