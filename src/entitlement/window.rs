//! Payable windows
//!
//! For each classified period, the span of days that can actually be paid:
//! from the entitlement date (or the day after the last payment) up to the
//! earlier of the period end and the attestation. Claim-wide caps are
//! applied once every window is known.

use chrono::{Datelike, NaiveDate};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::ClassifiedPeriod;
use crate::calendar::{add_days, affiliation_quarters, age_at, days_inclusive, month_end};
use crate::claim::ClaimContext;
use crate::config::CalculationConfig;

/// Age from which the lifetime day cap applies
pub const AGE_CAP_AGE: u32 = 70;

/// Why a period or segment pays nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroDayReason {
    NoEntitlementDate,
    OutsidePaymentPeriod,
    AlreadyPaid,
    MedicalControlInvalid,
    InsufficientAffiliation,
    BenefitCapExhausted,
    AgeCapReached,
    RateUnavailable,
}

/// Where the attestation bounding a window came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttestationSource {
    Period,
    Claim,
    /// Neither given: the period end or the reference date
    Implicit,
}

/// Payable span of one classified period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentWindow {
    pub period_index: usize,
    /// Attestation as supplied, before month-end extension
    pub attestation_date: Option<NaiveDate>,
    /// Last attested day after extension
    pub attested_to: Option<NaiveDate>,
    pub attestation_source: Option<AttestationSource>,
    /// Window start: the entitlement date or the last payment date
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub first_payable_day: Option<NaiveDate>,
    pub days: u32,
    /// Trimmed by the age cap
    pub capped: bool,
    pub reason: Option<ZeroDayReason>,
}

impl PaymentWindow {
    fn unpaid(period_index: usize, reason: ZeroDayReason) -> Self {
        Self {
            period_index,
            attestation_date: None,
            attested_to: None,
            attestation_source: None,
            start: None,
            end: None,
            first_payable_day: None,
            days: 0,
            capped: false,
            reason: Some(reason),
        }
    }

    pub fn last_payable_day(&self) -> Option<NaiveDate> {
        match (self.first_payable_day, self.days) {
            (Some(first), days) if days > 0 => Some(add_days(first, days as i64 - 1)),
            _ => None,
        }
    }

    fn zero(&mut self, reason: ZeroDayReason) {
        self.days = 0;
        self.reason = Some(reason);
    }
}

/// Windows for every period of a claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayableWindows {
    pub windows: Vec<PaymentWindow>,
    pub total_days: u32,
}

pub struct PayableWindowCalculator<'a> {
    config: &'a CalculationConfig,
}

impl<'a> PayableWindowCalculator<'a> {
    pub fn new(config: &'a CalculationConfig) -> Self {
        Self { config }
    }

    /// Attestations dated late in the month cover the whole month
    pub fn extend_attestation(&self, date: NaiveDate) -> NaiveDate {
        if date.day() >= self.config.attestation_month_end_day {
            month_end(date)
        } else {
            date
        }
    }

    pub fn compute(&self, periods: &[ClassifiedPeriod], ctx: &ClaimContext) -> PayableWindows {
        let mut windows: Vec<PaymentWindow> = periods.iter().map(|p| self.window_for(p, ctx)).collect();
        self.apply_caps(&mut windows, ctx);

        let total_days: u32 = windows.iter().map(|w| w.days).sum();
        debug!("{} windows, {} payable days", windows.len(), total_days);
        PayableWindows { windows, total_days }
    }

    fn window_for(&self, classified: &ClassifiedPeriod, ctx: &ClaimContext) -> PaymentWindow {
        let index = classified.index;
        let period = &classified.period;

        let Some(entitlement) = classified.entitlement_date else {
            return PaymentWindow::unpaid(index, ZeroDayReason::NoEntitlementDate);
        };
        if period.medical_control_valid == Some(false) {
            return PaymentWindow::unpaid(index, ZeroDayReason::MedicalControlInvalid);
        }

        let (attestation_date, source) = match (period.attestation_date, ctx.attestation_date) {
            (Some(date), _) => (Some(date), AttestationSource::Period),
            (None, Some(date)) => (Some(date), AttestationSource::Claim),
            (None, None) => (None, AttestationSource::Implicit),
        };
        let attested_to = match attestation_date {
            Some(date) => self.extend_attestation(date),
            None => period.end.min(ctx.as_of),
        };
        let end = period.end.min(attested_to);

        // Counting resumes the day after the last payment
        let paid_through = ctx.last_payment_date.filter(|&paid| paid >= entitlement);
        let (start, first_payable_day) = match paid_through {
            Some(paid) => (paid, add_days(paid, 1)),
            None => (entitlement, entitlement),
        };

        let days = days_inclusive(first_payable_day, end);
        let reason = match (days, paid_through) {
            (0, Some(paid)) if paid >= period.end => Some(ZeroDayReason::AlreadyPaid),
            (0, _) => Some(ZeroDayReason::OutsidePaymentPeriod),
            _ => None,
        };

        PaymentWindow {
            period_index: index,
            attestation_date,
            attested_to: Some(attested_to),
            attestation_source: Some(source),
            start: Some(start),
            end: Some(end),
            first_payable_day: Some(first_payable_day),
            days,
            capped: false,
            reason,
        }
    }

    fn apply_caps(&self, windows: &mut [PaymentWindow], ctx: &ClaimContext) {
        let quarters = affiliation_quarters(ctx.affiliation_date, ctx.as_of);

        if ctx.prior_condition && quarters < self.config.min_affiliation_quarters {
            info!(
                "Prior condition with {} affiliation quarters (< {}): nothing payable",
                quarters, self.config.min_affiliation_quarters
            );
            windows
                .iter_mut()
                .filter(|w| w.days > 0)
                .for_each(|w| w.zero(ZeroDayReason::InsufficientAffiliation));
            return;
        }

        if ctx.prior_paid_days > self.config.max_prior_days {
            info!(
                "{} prior paid days exceed the {} day cap: nothing payable",
                ctx.prior_paid_days, self.config.max_prior_days
            );
            windows
                .iter_mut()
                .filter(|w| w.days > 0)
                .for_each(|w| w.zero(ZeroDayReason::BenefitCapExhausted));
            return;
        }

        if age_at(ctx.birth_date, ctx.as_of) >= AGE_CAP_AGE {
            let mut remaining = self.config.age_70_cap_days.saturating_sub(ctx.prior_paid_days);
            for window in windows.iter_mut().filter(|w| w.days > 0) {
                if window.days <= remaining {
                    remaining -= window.days;
                    continue;
                }
                window.capped = true;
                if remaining == 0 {
                    window.zero(ZeroDayReason::AgeCapReached);
                } else {
                    window.days = remaining;
                    window.end = window.last_payable_day();
                    remaining = 0;
                }
            }
        }
    }
}

/// Payable windows under the default rules
pub fn compute_payable_windows(periods: &[ClassifiedPeriod], ctx: &ClaimContext) -> PayableWindows {
    PayableWindowCalculator::new(&CalculationConfig::default()).compute(periods, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::StoppagePeriod;
    use crate::entitlement::compute_entitlement_dates;
    use crate::rates::BenefitClass;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn context(as_of: NaiveDate) -> ClaimContext {
        ClaimContext::new(d(1980, 5, 10), as_of, d(2005, 1, 1), BenefitClass::A, 46_368.0)
    }

    fn windows_for(periods: &[StoppagePeriod], ctx: &ClaimContext) -> PayableWindows {
        let classified = compute_entitlement_dates(periods, ctx.prior_paid_days).unwrap();
        compute_payable_windows(&classified, ctx)
    }

    /// Opens rights on 2024-03-31, ends 2024-06-30
    fn opening_period() -> StoppagePeriod {
        StoppagePeriod::new(d(2024, 1, 1), d(2024, 6, 30))
    }

    #[test]
    fn test_day_91_is_the_only_payable_day() {
        let period = StoppagePeriod::new(d(2024, 1, 1), d(2024, 3, 31));
        let result = windows_for(&[period], &context(d(2024, 12, 31)));
        assert_eq!(result.total_days, 1);
        assert_eq!(result.windows[0].first_payable_day, Some(d(2024, 3, 31)));
    }

    #[test]
    fn test_cumulative_periods_pay_from_threshold() {
        let periods = vec![
            StoppagePeriod::new(d(2024, 1, 1), d(2024, 1, 31)),
            StoppagePeriod::new(d(2024, 3, 1), d(2024, 3, 29)),
            StoppagePeriod::new(d(2024, 5, 1), d(2024, 6, 30)),
        ];
        let result = windows_for(&periods, &context(d(2024, 12, 31)));
        assert_eq!(result.total_days, 31);
        assert_eq!(result.windows[0].reason, Some(ZeroDayReason::NoEntitlementDate));
        assert_eq!(result.windows[2].days, 31);
    }

    #[test]
    fn test_attestation_extends_to_month_end() {
        let mut period = opening_period();
        period.attestation_date = Some(d(2024, 5, 27));
        let result = windows_for(&[period.clone()], &context(d(2024, 12, 31)));
        assert_eq!(result.windows[0].end, Some(d(2024, 5, 31)));
        assert_eq!(result.windows[0].attestation_source, Some(AttestationSource::Period));

        period.attestation_date = Some(d(2024, 5, 26));
        let result = windows_for(&[period], &context(d(2024, 12, 31)));
        assert_eq!(result.windows[0].end, Some(d(2024, 5, 26)));
    }

    #[test]
    fn test_claim_attestation_and_implicit_fallback() {
        let mut ctx = context(d(2024, 12, 31));
        ctx.attestation_date = Some(d(2024, 4, 10));
        let result = windows_for(&[opening_period()], &ctx);
        assert_eq!(result.windows[0].end, Some(d(2024, 4, 10)));
        assert_eq!(result.windows[0].attestation_source, Some(AttestationSource::Claim));

        // Reference date inside the period bounds the implicit attestation
        let result = windows_for(&[opening_period()], &context(d(2024, 4, 30)));
        assert_eq!(result.windows[0].end, Some(d(2024, 4, 30)));
        assert_eq!(result.windows[0].attestation_source, Some(AttestationSource::Implicit));
        assert_eq!(result.total_days, 31);
    }

    #[test]
    fn test_window_resumes_after_last_payment() {
        let mut ctx = context(d(2024, 12, 31));
        ctx.last_payment_date = Some(d(2024, 6, 20));
        let result = windows_for(&[opening_period()], &ctx);
        assert_eq!(result.windows[0].start, Some(d(2024, 6, 20)));
        assert_eq!(result.windows[0].first_payable_day, Some(d(2024, 6, 21)));
        assert_eq!(result.total_days, 10);
    }

    #[test]
    fn test_paid_through_period_end() {
        let mut ctx = context(d(2024, 12, 31));
        ctx.last_payment_date = Some(d(2024, 6, 30));
        let result = windows_for(&[opening_period()], &ctx);
        assert_eq!(result.total_days, 0);
        assert_eq!(result.windows[0].reason, Some(ZeroDayReason::AlreadyPaid));
    }

    #[test]
    fn test_last_payment_before_entitlement_is_ignored() {
        let mut ctx = context(d(2024, 12, 31));
        ctx.last_payment_date = Some(d(2023, 12, 31));
        let result = windows_for(&[opening_period()], &ctx);
        assert_eq!(result.windows[0].first_payable_day, Some(d(2024, 3, 31)));
        assert_eq!(result.total_days, 92);
    }

    #[test]
    fn test_medical_control_blocks_payment() {
        let mut period = opening_period();
        period.medical_control_valid = Some(false);
        let result = windows_for(&[period], &context(d(2024, 12, 31)));
        assert_eq!(result.total_days, 0);
        assert_eq!(result.windows[0].reason, Some(ZeroDayReason::MedicalControlInvalid));
    }

    #[test]
    fn test_prior_condition_needs_eight_quarters() {
        let mut ctx = context(d(2024, 12, 31));
        ctx.prior_condition = true;
        ctx.affiliation_date = d(2023, 10, 1);
        let result = windows_for(&[opening_period()], &ctx);
        assert_eq!(result.total_days, 0);
        assert_eq!(result.windows[0].reason, Some(ZeroDayReason::InsufficientAffiliation));

        ctx.prior_condition = false;
        assert_eq!(windows_for(&[opening_period()], &ctx).total_days, 92);
    }

    #[test]
    fn test_prior_days_cap() {
        let mut ctx = context(d(2024, 12, 31));
        ctx.prior_paid_days = 1096;
        let result = windows_for(&[opening_period()], &ctx);
        assert_eq!(result.total_days, 0);
        assert_eq!(result.windows[0].reason, Some(ZeroDayReason::BenefitCapExhausted));
    }

    #[test]
    fn test_age_cap_trims_chronologically() {
        let mut ctx = context(d(2024, 12, 31));
        ctx.birth_date = d(1950, 1, 1);
        ctx.prior_paid_days = 300;

        // Prior days already clear the threshold: payable from the start
        let periods = vec![StoppagePeriod::new(d(2024, 1, 1), d(2024, 12, 31))];
        let result = windows_for(&periods, &ctx);
        assert_eq!(result.total_days, 65);
        assert!(result.windows[0].capped);
        assert_eq!(result.windows[0].end, Some(d(2024, 3, 5)));

        ctx.prior_paid_days = 365;
        let result = windows_for(&periods, &ctx);
        assert_eq!(result.total_days, 0);
        assert_eq!(result.windows[0].reason, Some(ZeroDayReason::AgeCapReached));
    }
}
