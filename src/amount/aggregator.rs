//! Amount aggregation
//!
//! Splits every payable window into segments over which the rate cannot
//! change, prices each segment, and totals the claim.
//!
//! A segment ends at the earliest of:
//! - the end of the month
//! - the end of the covering rate period (or the day before the next table
//!   period or the reform cutoff when uncovered)
//! - the day before the claimant's next birthday
//! - the 365th or 730th day of the episode, for claimants aged 62-69
//! - the end of the window

use chrono::{Datelike, NaiveDate};
use log::{debug, info};
use std::collections::HashMap;

use super::resolver::{select_rate_code, tier_for, CodeInputs, Pricing, RateResolver, RateSource, ELDER_AGE, SENIOR_AGE};
use super::result::{CalculationResult, DailyLine, PaymentDetail, RateSegment, WindowEnd};
use crate::calendar::{
    add_days, affiliation_quarters, age_at, days_inclusive, month_end, next_birthday_after, quarter_of, round_cents,
};
use crate::claim::ClaimContext;
use crate::config::CalculationConfig;
use crate::entitlement::{ClassifiedPeriod, PayableWindows, PaymentWindow, ZeroDayReason};
use crate::rates::RateTable;

/// Episode day counts at which the 62-69 sub-period changes
const SUB_PERIOD_LIMITS: [u32; 2] = [365, 730];

/// Sub-period number for a day preceded by `elapsed` days of the episode
pub fn sub_period_for(elapsed: u32) -> u8 {
    match elapsed {
        e if e < SUB_PERIOD_LIMITS[0] => 1,
        e if e < SUB_PERIOD_LIMITS[1] => 2,
        _ => 3,
    }
}

/// Entitlement window ends measured from the first entitlement date
///
/// Age 70 and over has a single 365-day window; 62-69 has three; younger
/// claimants have none. Prior paid days shorten every window.
pub fn entitlement_window_ends(first_entitlement: NaiveDate, age: u32, prior_days: u32) -> Vec<WindowEnd> {
    let limits: &[u32] = if age >= ELDER_AGE {
        &[365]
    } else if age >= SENIOR_AGE {
        &[365, 730, 1095]
    } else {
        &[]
    };

    limits
        .iter()
        .filter(|&&limit| limit > prior_days)
        .map(|&limit| WindowEnd {
            limit_days: limit,
            end: add_days(first_entitlement, (limit - prior_days) as i64),
        })
        .collect()
}

pub struct AmountAggregator<'a> {
    resolver: RateResolver<'a>,
    config: &'a CalculationConfig,
}

impl<'a> AmountAggregator<'a> {
    pub fn new(table: &'a RateTable, config: &'a CalculationConfig) -> Self {
        Self {
            resolver: RateResolver::new(table, config.reform_cutoff),
            config,
        }
    }

    /// Price every window and assemble the claim result
    pub fn aggregate(
        &self,
        periods: Vec<ClassifiedPeriod>,
        windows: &PayableWindows,
        ctx: &ClaimContext,
    ) -> CalculationResult {
        let pricing = Pricing::from(ctx);
        let first_episode = periods.first().map(|p| p.episode).unwrap_or(0);
        let episode_start = |episode: usize| if episode == first_episode { ctx.prior_paid_days } else { 0 };

        // Full episode length decides the 62-69 path before any day is priced
        let mut episode_totals: HashMap<usize, u32> = HashMap::new();
        for (period, window) in periods.iter().zip(&windows.windows) {
            *episode_totals
                .entry(period.episode)
                .or_insert_with(|| episode_start(period.episode)) += window.days;
        }

        let mut elapsed: HashMap<usize, u32> = HashMap::new();
        let details: Vec<PaymentDetail> = periods
            .iter()
            .zip(&windows.windows)
            .map(|(period, window)| {
                let episode_elapsed = elapsed
                    .entry(period.episode)
                    .or_insert_with(|| episode_start(period.episode));
                let senior_path = episode_totals
                    .get(&period.episode)
                    .is_some_and(|&total| total >= self.config.senior_path_min_days);
                self.detail_for(period, window, ctx, &pricing, episode_elapsed, senior_path)
            })
            .collect();

        let computed_amount = round_cents(details.iter().map(|d| d.amount).sum());
        // Segments refused for affiliation are not owed, so a forced rate skips them
        let total_days: u32 = details.iter().map(|d| d.payable_days).sum();

        let mut total_amount = match ctx.forced_daily_rate {
            Some(rate) => round_cents(rate * total_days as f64),
            None => computed_amount,
        };
        if let Some(factor) = ctx.pro_rata {
            total_amount = round_cents(total_amount * factor);
        }

        let age = age_at(ctx.birth_date, ctx.as_of);
        let window_ends = periods
            .iter()
            .find_map(|p| p.entitlement_date)
            .map(|first| entitlement_window_ends(first, age, ctx.prior_paid_days))
            .unwrap_or_default();

        info!(
            "Claim priced: {} periods, {} payable days, amount {:.2}",
            periods.len(),
            total_days,
            total_amount
        );

        CalculationResult {
            total_days,
            total_amount,
            computed_amount,
            forced_rate_applied: ctx.forced_daily_rate.is_some(),
            details,
            periods,
            window_ends,
            age,
            affiliation_quarters: affiliation_quarters(ctx.affiliation_date, ctx.as_of),
        }
    }

    fn detail_for(
        &self,
        period: &ClassifiedPeriod,
        window: &PaymentWindow,
        ctx: &ClaimContext,
        pricing: &Pricing,
        episode_elapsed: &mut u32,
        senior_path: bool,
    ) -> PaymentDetail {
        let segments = match (window.first_payable_day, window.last_payable_day()) {
            (Some(first), Some(last)) => self.price_window(first, last, ctx, pricing, episode_elapsed, senior_path),
            _ => Vec::new(),
        };
        let amount = round_cents(segments.iter().map(|s| s.amount).sum());
        let refused: u32 = segments
            .iter()
            .filter(|s| s.reason == Some(ZeroDayReason::InsufficientAffiliation))
            .map(|s| s.days)
            .sum();
        let daily = self.config.detailed_output.then(|| expand_daily(&segments));

        PaymentDetail {
            period_index: period.index,
            start: period.period.start,
            end: period.period.end,
            entitlement_date: period.entitlement_date,
            attestation_date: window.attestation_date,
            attested_to: window.attested_to,
            payment_start: window.start,
            payment_end: window.end,
            payable_days: window.days.saturating_sub(refused),
            segments,
            amount,
            reason: window
                .reason
                .or((window.days > 0 && refused >= window.days).then_some(ZeroDayReason::InsufficientAffiliation)),
            capped: window.capped,
            daily,
        }
    }

    fn price_window(
        &self,
        first: NaiveDate,
        last: NaiveDate,
        ctx: &ClaimContext,
        pricing: &Pricing,
        episode_elapsed: &mut u32,
        senior_path: bool,
    ) -> Vec<RateSegment> {
        let mut segments = Vec::new();
        let mut cursor = first;

        while cursor <= last {
            let age = age_at(ctx.birth_date, cursor);
            let quarters = affiliation_quarters(ctx.affiliation_date, cursor);
            let sub_period = sub_period_for(*episode_elapsed);
            let end = self.segment_end(cursor, last, ctx.birth_date, age, *episode_elapsed);
            let days = days_inclusive(cursor, end);

            let code = select_rate_code(&CodeInputs {
                age,
                quarters,
                prior_condition: ctx.prior_condition,
                historical: ctx.historical_rate,
                sub_period,
                senior_path,
            });

            let (tier, daily_rate, source, reason) = match code {
                Some(code) => {
                    let tier = tier_for(code, age, senior_path);
                    let rate = self.resolver.daily_rate(code, tier, cursor, pricing);
                    let reason = (rate.source == RateSource::Unavailable).then_some(ZeroDayReason::RateUnavailable);
                    (Some(tier), rate.rate, rate.source, reason)
                }
                None => (None, 0.0, RateSource::Unavailable, Some(ZeroDayReason::InsufficientAffiliation)),
            };
            let amount = round_cents(days as f64 * daily_rate);

            debug!(
                "Segment {} to {}: {} days, age {}, sub-period {}, code {:?}, rate {:.4} ({:?})",
                cursor, end, days, age, sub_period, code, daily_rate, source
            );

            segments.push(RateSegment {
                year: cursor.year(),
                month: cursor.month(),
                quarter: quarter_of(cursor),
                affiliation_quarters: quarters,
                age,
                sub_period,
                start: cursor,
                end,
                days,
                rate_code: code,
                tier,
                daily_rate,
                source,
                amount,
                reason,
            });

            *episode_elapsed += days;
            cursor = add_days(end, 1);
        }

        segments
    }

    fn segment_end(&self, cursor: NaiveDate, last: NaiveDate, birth: NaiveDate, age: u32, elapsed: u32) -> NaiveDate {
        let table = self.resolver.table();
        let mut end = month_end(cursor).min(last);

        match table.period_for(cursor) {
            Some(period) => end = end.min(period.end),
            None => {
                if let Some(next) = table.next_start_after(cursor) {
                    end = end.min(add_days(next, -1));
                }
                let cutoff = self.resolver.reform_cutoff();
                if cursor < cutoff {
                    end = end.min(add_days(cutoff, -1));
                }
            }
        }

        let birthday = next_birthday_after(birth, cursor);
        if birthday <= end {
            end = add_days(birthday, -1);
        }

        if (SENIOR_AGE..ELDER_AGE).contains(&age) {
            if let Some(limit) = SUB_PERIOD_LIMITS.iter().find(|&&limit| elapsed < limit) {
                end = end.min(add_days(cursor, (limit - elapsed) as i64 - 1));
            }
        }

        end
    }
}

fn expand_daily(segments: &[RateSegment]) -> Vec<DailyLine> {
    segments
        .iter()
        .flat_map(|segment| {
            (0..segment.days).map(move |offset| DailyLine {
                date: add_days(segment.start, offset as i64),
                rate_code: segment.rate_code,
                daily_rate: segment.daily_rate,
                amount: round_cents(segment.daily_rate),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::StoppagePeriod;
    use crate::entitlement::{compute_entitlement_dates, compute_payable_windows};
    use crate::rates::{BenefitClass, RatePeriod, RateTier};
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn table() -> RateTable {
        RateTable::new(vec![
            RatePeriod::new(d(2023, 1, 1), d(2023, 12, 31), [60.0, 30.0, 45.0], [120.0, 60.0, 90.0], [180.0, 90.0, 135.0]),
            RatePeriod::new(d(2024, 1, 1), d(2024, 12, 31), [64.0, 32.0, 48.0], [128.0, 64.0, 96.0], [192.0, 96.0, 144.0]),
        ])
        .unwrap()
    }

    fn run(periods: &[StoppagePeriod], ctx: &ClaimContext, config: &CalculationConfig) -> CalculationResult {
        let classified = compute_entitlement_dates(periods, ctx.prior_paid_days).unwrap();
        let windows = compute_payable_windows(&classified, ctx);
        let rates = table();
        AmountAggregator::new(&rates, config).aggregate(classified, &windows, ctx)
    }

    fn context(birth: NaiveDate, as_of: NaiveDate) -> ClaimContext {
        ClaimContext::new(birth, as_of, d(2000, 1, 1), BenefitClass::A, 46_368.0)
    }

    #[test]
    fn test_sub_period_boundaries() {
        assert_eq!(sub_period_for(0), 1);
        assert_eq!(sub_period_for(364), 1);
        assert_eq!(sub_period_for(365), 2);
        assert_eq!(sub_period_for(729), 2);
        assert_eq!(sub_period_for(730), 3);
    }

    #[test]
    fn test_window_ends_by_age() {
        let first = d(2024, 1, 1);
        assert!(entitlement_window_ends(first, 50, 0).is_empty());

        let ends = entitlement_window_ends(first, 65, 0);
        assert_eq!(ends.len(), 3);
        assert_eq!(ends[0].end, d(2024, 12, 31));
        assert_eq!(ends[2].end, add_days(first, 1095));

        let ends = entitlement_window_ends(first, 72, 100);
        assert_eq!(ends, vec![WindowEnd { limit_days: 365, end: add_days(first, 265) }]);

        assert_eq!(entitlement_window_ends(first, 65, 800).len(), 1);
    }

    #[test]
    fn test_segments_split_by_month() {
        let ctx = context(d(1980, 1, 15), d(2024, 12, 31));
        let result = run(&[StoppagePeriod::new(d(2024, 1, 1), d(2024, 6, 30))], &ctx, &CalculationConfig::default());

        // Payable 2024-03-31 to 2024-06-30
        let detail = &result.details[0];
        assert_eq!(detail.payable_days, 92);
        assert_eq!(detail.segments.len(), 4);
        assert_eq!(detail.segments[0].days, 1);
        assert_eq!(detail.segments[1].days, 30);
        assert!(detail.segments.iter().all(|s| s.rate_code.map(|c| c.value()) == Some(1)));
        assert_relative_eq!(result.total_amount, 92.0 * 64.0);
        assert_eq!(result.segments().map(|s| s.days).sum::<u32>(), 92);
    }

    #[test]
    fn test_segment_splits_before_birthday() {
        // Turns 62 on 2024-05-10
        let ctx = context(d(1962, 5, 10), d(2024, 12, 31));
        let result = run(&[StoppagePeriod::new(d(2024, 1, 1), d(2024, 6, 30))], &ctx, &CalculationConfig::default());

        let segments = &result.details[0].segments;
        let may: Vec<_> = segments.iter().filter(|s| s.month == 5).collect();
        assert_eq!(may.len(), 2);
        assert_eq!(may[0].end, d(2024, 5, 9));
        assert_eq!(may[0].age, 61);
        assert_eq!(may[1].start, d(2024, 5, 10));
        assert_eq!(may[1].age, 62);
    }

    #[test]
    fn test_senior_short_episode_moves_to_extended_codes() {
        // Age 64, 300 prior days: day 366 of the episode falls on 2024-03-06
        let mut ctx = context(d(1960, 1, 1), d(2024, 12, 31));
        ctx.prior_paid_days = 300;
        let result = run(&[StoppagePeriod::new(d(2024, 1, 1), d(2024, 4, 30))], &ctx, &CalculationConfig::default());

        let segments = &result.details[0].segments;
        let march: Vec<_> = segments.iter().filter(|s| s.month == 3).collect();
        assert_eq!(march.len(), 2);
        assert_eq!(march[0].end, d(2024, 3, 5));
        assert_eq!(march[0].rate_code.map(|c| c.value()), Some(1));
        assert_eq!(march[1].sub_period, 2);
        assert_eq!(march[1].rate_code.map(|c| c.value()), Some(4));
        // Short episode: reduced tier
        assert_relative_eq!(march[1].daily_rate, 32.0);
    }

    #[test]
    fn test_senior_long_episode_uses_three_tier_path() {
        // Age 65-66, 100 prior days, 731 payable days: episode total 831
        let mut ctx = context(d(1958, 1, 1), d(2024, 12, 31));
        ctx.prior_paid_days = 100;
        let result = run(&[StoppagePeriod::new(d(2023, 1, 1), d(2024, 12, 31))], &ctx, &CalculationConfig::default());

        let segments = &result.details[0].segments;
        let code = |s: &RateSegment| s.rate_code.map(|c| c.value());

        // Days 101-365 of the episode: senior code at the intermediate tier
        let first_year: Vec<_> = segments.iter().filter(|s| s.end <= d(2023, 9, 22)).collect();
        assert!(!first_year.is_empty());
        assert!(first_year.iter().all(|s| code(s) == Some(7) && s.sub_period == 1));
        assert!(first_year.iter().all(|s| s.tier == Some(RateTier::Intermediate)));
        assert!(first_year.iter().all(|s| s.daily_rate == 45.0));
        assert_eq!(first_year.last().unwrap().end, d(2023, 9, 22));

        // Day 366 switches to the extended code, still intermediate tier
        let switch = segments.iter().find(|s| s.start == d(2023, 9, 23)).unwrap();
        assert_eq!(code(switch), Some(4));
        assert_eq!(switch.sub_period, 2);
        assert_eq!(switch.tier, Some(RateTier::Intermediate));
        assert_relative_eq!(switch.daily_rate, 45.0);

        let third = segments.iter().find(|s| s.start == d(2024, 9, 22)).unwrap();
        assert_eq!(third.sub_period, 3);
        assert_eq!(code(third), Some(4));
        assert_relative_eq!(third.daily_rate, 48.0);
        assert_eq!(result.total_days, 731);
    }

    #[test]
    fn test_refused_segments_leave_the_total() {
        // Prior condition: 6-7 quarters until June, 8 from July
        let mut ctx = context(d(1980, 1, 15), d(2024, 12, 31));
        ctx.prior_condition = true;
        ctx.affiliation_date = d(2022, 10, 1);
        ctx.forced_daily_rate = Some(10.0);
        let result = run(&[StoppagePeriod::new(d(2024, 1, 1), d(2024, 7, 31))], &ctx, &CalculationConfig::default());

        let detail = &result.details[0];
        assert!(detail
            .segments
            .iter()
            .filter(|s| s.month < 7)
            .all(|s| s.reason == Some(ZeroDayReason::InsufficientAffiliation) && s.amount == 0.0));
        let july = detail.segments.iter().find(|s| s.month == 7).unwrap();
        assert_eq!(july.rate_code.map(|c| c.value()), Some(2));

        assert_eq!(detail.payable_days, 31);
        assert_eq!(result.total_days, 31);
        assert_relative_eq!(result.total_amount, 310.0);
        assert_relative_eq!(result.computed_amount, round_cents(31.0 * 64.0 / 3.0));
    }

    #[test]
    fn test_forced_rate_and_pro_rata() {
        let mut ctx = context(d(1980, 1, 15), d(2024, 12, 31));
        ctx.forced_daily_rate = Some(50.0);
        ctx.pro_rata = Some(0.5);
        let result = run(&[StoppagePeriod::new(d(2024, 1, 1), d(2024, 6, 30))], &ctx, &CalculationConfig::default());

        assert!(result.forced_rate_applied);
        assert_relative_eq!(result.computed_amount, 92.0 * 64.0);
        assert_relative_eq!(result.total_amount, 92.0 * 50.0 * 0.5);
    }

    #[test]
    fn test_uncovered_days_before_cutoff() {
        let ctx = context(d(1980, 1, 15), d(2025, 12, 31));
        let config = CalculationConfig {
            reform_cutoff: d(2025, 6, 1),
            ..Default::default()
        };
        let classified = compute_entitlement_dates(&[StoppagePeriod::new(d(2025, 1, 1), d(2025, 6, 30))], 0).unwrap();
        let windows = compute_payable_windows(&classified, &ctx);
        let rates = table();
        let result = AmountAggregator::new(&rates, &config).aggregate(classified, &windows, &ctx);

        let segments = &result.details[0].segments;
        let may = segments.iter().find(|s| s.month == 5).unwrap();
        assert_eq!(may.source, RateSource::Unavailable);
        assert_eq!(may.reason, Some(ZeroDayReason::RateUnavailable));
        assert_eq!(may.amount, 0.0);

        let june = segments.iter().find(|s| s.month == 6).unwrap();
        assert_eq!(june.source, RateSource::ReformFormula);
        assert_relative_eq!(june.amount, round_cents(30.0 * 46_368.0 / 730.0));
    }

    #[test]
    fn test_detailed_output_expands_days() {
        let ctx = context(d(1980, 1, 15), d(2024, 12, 31));
        let config = CalculationConfig {
            detailed_output: true,
            ..Default::default()
        };
        let result = run(&[StoppagePeriod::new(d(2024, 1, 1), d(2024, 4, 2))], &ctx, &config);

        let daily = result.details[0].daily.as_ref().unwrap();
        assert_eq!(daily.len(), 3);
        assert_eq!(daily[0].date, d(2024, 3, 31));
        assert_eq!(daily[2].date, d(2024, 4, 2));
        assert_relative_eq!(daily[1].amount, 64.0);
    }
}
