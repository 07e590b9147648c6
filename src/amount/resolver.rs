//! Rate resolution
//!
//! Two steps: pick a rate code from the claimant's age, affiliation, and
//! episode position, then price a day under that code. The rate table is
//! injected and only ever read.

use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::claim::{ClaimContext, Status};
use crate::rates::{AffiliationTier, BenefitClass, CodeFamily, RateCode, RateTable, RateTier};

/// Age from which the extended codes and three-tier path apply
pub const SENIOR_AGE: u32 = 62;

/// Age from which only the extended codes apply
pub const ELDER_AGE: u32 = 70;

/// Where a daily rate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Table,
    ReformFormula,
    /// Not covered by the table and before the reform cutoff
    Unavailable,
}

/// Inputs to rate-code selection, evaluated at a segment start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodeInputs {
    pub age: u32,
    pub quarters: u32,
    pub prior_condition: bool,
    pub historical: Option<RateCode>,
    /// 1, 2 or 3: position inside the episode (days 1-365, 366-730, beyond)
    pub sub_period: u8,
    /// Episode long enough for the 62-69 three-tier path
    pub senior_path: bool,
}

/// Claim facts that affect the monetary amount of a day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    pub class: BenefitClass,
    pub status: Status,
    pub option: f64,
    pub pass: f64,
}

impl From<&ClaimContext> for Pricing {
    fn from(ctx: &ClaimContext) -> Self {
        Self {
            class: ctx.class,
            status: ctx.status,
            option: ctx.option,
            pass: ctx.pass,
        }
    }
}

/// A resolved daily rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyRate {
    /// Table or formula rate before any multiplier
    pub base: f64,
    /// Amount owed for one day
    pub rate: f64,
    pub source: RateSource,
}

/// Select the rate code for one segment
///
/// Returns `None` only when a prior condition meets fewer than the minimum
/// affiliation quarters at the segment date.
pub fn select_rate_code(inputs: &CodeInputs) -> Option<RateCode> {
    if let Some(code) = inputs.historical {
        return Some(code);
    }

    let tier = AffiliationTier::from_quarters(inputs.quarters, inputs.prior_condition)?;
    let family = match inputs.age {
        age if age < SENIOR_AGE => CodeFamily::Standard,
        age if age < ELDER_AGE => match (inputs.sub_period, inputs.senior_path) {
            (1, true) => CodeFamily::Senior,
            (1, false) => CodeFamily::Standard,
            _ => CodeFamily::Extended,
        },
        _ => CodeFamily::Extended,
    };
    Some(RateCode::from_parts(family, tier))
}

/// Table tier for a code
///
/// Extended codes use the intermediate tier when the episode follows the
/// 62-69 three-tier path, the reduced tier otherwise.
pub fn tier_for(code: RateCode, age: u32, senior_path: bool) -> RateTier {
    match code.family() {
        CodeFamily::Standard => RateTier::Full,
        CodeFamily::Senior => RateTier::Intermediate,
        CodeFamily::Extended if senior_path && age < ELDER_AGE => RateTier::Intermediate,
        CodeFamily::Extended => RateTier::Reduced,
    }
}

/// Prices days against an injected rate table
#[derive(Debug, Clone, Copy)]
pub struct RateResolver<'a> {
    table: &'a RateTable,
    reform_cutoff: NaiveDate,
}

impl<'a> RateResolver<'a> {
    pub fn new(table: &'a RateTable, reform_cutoff: NaiveDate) -> Self {
        Self { table, reform_cutoff }
    }

    pub fn table(&self) -> &'a RateTable {
        self.table
    }

    pub fn reform_cutoff(&self) -> NaiveDate {
        self.reform_cutoff
    }

    /// Base rate for a day: the covering table period, else the reform
    /// formula from the cutoff onward
    pub fn base_rate(&self, class: BenefitClass, tier: RateTier, pass: f64, date: NaiveDate) -> (f64, RateSource) {
        match self.table.period_for(date) {
            Some(period) => (period.rate(class, tier), RateSource::Table),
            None if date >= self.reform_cutoff => (RateTable::reform_rate(class, pass), RateSource::ReformFormula),
            None => {
                warn!("No rate covers {} (before reform cutoff {})", date, self.reform_cutoff);
                (0.0, RateSource::Unavailable)
            }
        }
    }

    /// Amount owed for one day under `code`
    pub fn daily_rate(&self, code: RateCode, tier: RateTier, date: NaiveDate, pricing: &Pricing) -> DailyRate {
        let (base, source) = self.base_rate(pricing.class, tier, pricing.pass, date);
        let rate = base * code.affiliation_factor() * pricing.status.option_factor(pricing.option);
        DailyRate { base, rate, source }
    }
}
