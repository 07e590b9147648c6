//! Dated daily-rate table
//!
//! A table is a sorted, non-overlapping list of rate periods. Each period
//! holds nine daily rates: three benefit classes by three rate tiers.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::BenefitClass;
use crate::error::RateTableError;

/// Rate column within a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateTier {
    /// Full rate (tier 1)
    Full,
    /// Reduced rate paid from age 70 (tier 2)
    Reduced,
    /// Intermediate rate of the 62-69 three-tier path (tier 3)
    Intermediate,
}

impl RateTier {
    pub fn number(&self) -> u8 {
        match self {
            RateTier::Full => 1,
            RateTier::Reduced => 2,
            RateTier::Intermediate => 3,
        }
    }

    fn index(&self) -> usize {
        self.number() as usize - 1
    }
}

/// Rates in force over one date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatePeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Daily rates indexed by `[class][tier]`
    rates: [[f64; 3]; 3],
}

impl RatePeriod {
    /// Build a period from rows of `[tier1, tier2, tier3]` for classes A, B, C
    pub fn new(start: NaiveDate, end: NaiveDate, a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> Self {
        Self {
            start,
            end,
            rates: [a, b, c],
        }
    }

    pub fn rate(&self, class: BenefitClass, tier: RateTier) -> f64 {
        self.rates[class.index()][tier.index()]
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Immutable rate table shared by every calculation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    periods: Vec<RatePeriod>,
}

impl RateTable {
    /// Sort and validate periods; overlapping or inverted ranges are rejected
    pub fn new(mut periods: Vec<RatePeriod>) -> Result<Self, RateTableError> {
        periods.sort_by_key(|p| p.start);

        for period in &periods {
            if period.end < period.start {
                return Err(RateTableError::InvertedPeriod {
                    start: period.start,
                    end: period.end,
                });
            }
            if period.rates.iter().flatten().any(|r| *r < 0.0) {
                return Err(RateTableError::NegativeRate { start: period.start });
            }
        }

        for pair in periods.windows(2) {
            if pair[1].start <= pair[0].end {
                return Err(RateTableError::Overlap {
                    previous_end: pair[0].end,
                    next_start: pair[1].start,
                });
            }
        }

        Ok(Self { periods })
    }

    pub fn periods(&self) -> &[RatePeriod] {
        &self.periods
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Period containing `date`, if the table covers it
    pub fn period_for(&self, date: NaiveDate) -> Option<&RatePeriod> {
        let idx = self.periods.partition_point(|p| p.end < date);
        self.periods.get(idx).filter(|p| p.contains(date))
    }

    /// Period governing `year`: the one covering 1 January, else the first
    /// period starting during that year
    pub fn period_for_year(&self, year: i32) -> Option<&RatePeriod> {
        let first_day = NaiveDate::from_ymd_opt(year, 1, 1)?;
        self.period_for(first_day)
            .or_else(|| self.periods.iter().find(|p| p.start.year() == year))
    }

    /// Start of the first period beginning strictly after `date`
    pub fn next_start_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        let idx = self.periods.partition_point(|p| p.start <= date);
        self.periods.get(idx).map(|p| p.start)
    }

    /// First and last covered dates
    pub fn coverage(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.periods.first(), self.periods.last()) {
            (Some(first), Some(last)) => Some((first.start, last.end)),
            _ => None,
        }
    }

    /// Post-reform daily rate: class multiple of the ceiling over 730 days
    pub fn reform_rate(class: BenefitClass, ceiling: f64) -> f64 {
        class.multiplier() * ceiling / 730.0
    }
}
