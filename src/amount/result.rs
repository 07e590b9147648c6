//! Calculation result types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::RateSource;
use crate::entitlement::{ClassifiedPeriod, ZeroDayReason};
use crate::rates::{RateCode, RateTier};

/// Run of days priced under one rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSegment {
    pub year: i32,
    pub month: u32,
    pub quarter: u32,
    /// Affiliation quarters at the segment start
    pub affiliation_quarters: u32,
    pub age: u32,
    /// Position inside the episode: 1 (days 1-365), 2 (366-730), 3 (beyond)
    pub sub_period: u8,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: u32,
    pub rate_code: Option<RateCode>,
    pub tier: Option<RateTier>,
    /// Daily rate, unrounded
    pub daily_rate: f64,
    pub source: RateSource,
    pub amount: f64,
    /// Set when the segment pays nothing
    pub reason: Option<ZeroDayReason>,
}

/// One day of a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLine {
    pub date: NaiveDate,
    pub rate_code: Option<RateCode>,
    pub daily_rate: f64,
    pub amount: f64,
}

/// Payment breakdown for one classified period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetail {
    pub period_index: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub entitlement_date: Option<NaiveDate>,
    pub attestation_date: Option<NaiveDate>,
    pub attested_to: Option<NaiveDate>,
    pub payment_start: Option<NaiveDate>,
    pub payment_end: Option<NaiveDate>,
    pub payable_days: u32,
    pub segments: Vec<RateSegment>,
    pub amount: f64,
    pub reason: Option<ZeroDayReason>,
    /// Trimmed by the age cap
    pub capped: bool,
    /// Day-by-day expansion, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily: Option<Vec<DailyLine>>,
}

/// Last day of an entitlement window, for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowEnd {
    /// Window length in days: 365, 730 or 1095
    pub limit_days: u32,
    pub end: NaiveDate,
}

/// Complete outcome of a claim calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub total_days: u32,
    /// Amount owed, after any forced rate and pro-rata
    pub total_amount: f64,
    /// Sum of the segment amounts
    pub computed_amount: f64,
    pub forced_rate_applied: bool,
    pub details: Vec<PaymentDetail>,
    pub periods: Vec<ClassifiedPeriod>,
    pub window_ends: Vec<WindowEnd>,
    /// Age at the reference date
    pub age: u32,
    /// Affiliation quarters at the reference date
    pub affiliation_quarters: u32,
}

/// Compact view for batch outputs and logs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSummary {
    pub periods: usize,
    pub payable_periods: usize,
    pub segments: usize,
    pub total_days: u32,
    pub total_amount: f64,
    pub first_entitlement: Option<NaiveDate>,
}

impl CalculationResult {
    /// Every rate segment, in chronological order
    pub fn segments(&self) -> impl Iterator<Item = &RateSegment> {
        self.details.iter().flat_map(|d| d.segments.iter())
    }

    pub fn first_entitlement_date(&self) -> Option<NaiveDate> {
        self.periods.iter().find_map(|p| p.entitlement_date)
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            periods: self.details.len(),
            payable_periods: self.details.iter().filter(|d| d.payable_days > 0).count(),
            segments: self.segments().count(),
            total_days: self.total_days,
            total_amount: self.total_amount,
            first_entitlement: self.first_entitlement_date(),
        }
    }
}
