//! Entitlement engine
//!
//! Turns raw stoppage periods into classified periods with an entitlement
//! date. The work is a single fold over the chronologically ordered,
//! prolongation-merged periods; the accumulator carries the running day
//! count and the index of the period whose entitlement opened the current
//! rights.

use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::calendar::{add_days, days_between, next_business_day};
use crate::claim::{validate_periods, StoppagePeriod};
use crate::config::CalculationConfig;
use crate::error::CalcError;

/// How a period relates to the ones before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    /// First period of the claim
    FirstClaim,
    /// Later period still accumulating toward the qualifying threshold
    Continuation,
    /// Same condition resuming within a year of opened rights
    Relapse,
    /// A year or more after the previous period: the count restarts
    NewCondition,
}

/// One input period, or several merged prolongations, after merging
#[derive(Debug, Clone, PartialEq)]
pub struct MergedPeriod {
    pub period: StoppagePeriod,
    /// Indices in the caller's list, in chronological order
    pub sources: Vec<usize>,
}

impl MergedPeriod {
    fn absorb(&mut self, index: usize, next: &StoppagePeriod) {
        self.period.end = self.period.end.max(next.end);
        self.period.attestation_date = self.period.attestation_date.max(next.attestation_date);
        if self.period.forced_entitlement_date.is_none() {
            self.period.forced_entitlement_date = next.forced_entitlement_date;
        }
        if next.medical_control_valid == Some(false) || self.period.medical_control_valid.is_none() {
            self.period.medical_control_valid = next.medical_control_valid.or(self.period.medical_control_valid);
        }
        self.sources.push(index);
    }
}

/// A period after classification and entitlement-date computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedPeriod {
    /// Position in the merged, chronological list
    pub index: usize,
    pub period: StoppagePeriod,
    /// Caller indices merged into this period
    pub sources: Vec<usize>,
    /// Inclusive length in days
    pub duration: u32,
    pub kind: PeriodKind,
    /// Starts no later than the business day after the previous end
    pub consecutive: bool,
    /// For a relapse, the index of the period that opened the rights
    pub relapse_of: Option<usize>,
    /// Episode number; a new condition starts the next episode
    pub episode: usize,
    /// Running qualifying day count once this period is added
    pub cumulative_days: u32,
    pub entitlement_date: Option<NaiveDate>,
    /// Uncompensated days counted in this period
    pub decompte: u32,
    /// The caller's relapse flag disagrees with the computed kind
    pub relapse_flag_mismatch: bool,
}

/// Sort periods and merge those resuming by the next business day
pub fn merge_prolongations(periods: &[StoppagePeriod]) -> Vec<MergedPeriod> {
    let mut order: Vec<usize> = (0..periods.len()).collect();
    order.sort_by_key(|&i| periods[i].start);

    let mut merged: Vec<MergedPeriod> = Vec::with_capacity(periods.len());
    for i in order {
        let next = &periods[i];
        match merged.last_mut() {
            Some(last) if next.start <= next_business_day(last.period.end) => last.absorb(i, next),
            _ => merged.push(MergedPeriod {
                period: next.clone(),
                sources: vec![i],
            }),
        }
    }
    merged
}

fn sorted_unmerged(periods: &[StoppagePeriod]) -> Vec<MergedPeriod> {
    let mut merged: Vec<MergedPeriod> = periods
        .iter()
        .enumerate()
        .map(|(i, p)| MergedPeriod {
            period: p.clone(),
            sources: vec![i],
        })
        .collect();
    merged.sort_by_key(|m| m.period.start);
    merged
}

#[derive(Debug, Clone, Copy)]
struct Outcome {
    entitlement: Option<NaiveDate>,
    decompte: u32,
}

impl Outcome {
    fn none(decompte: u32) -> Self {
        Self {
            entitlement: None,
            decompte,
        }
    }
}

/// Fold accumulator
struct Chain<'a> {
    config: &'a CalculationConfig,
    cumulative: u32,
    opened_by: Option<usize>,
    previous_end: Option<NaiveDate>,
    episode: usize,
    classified: Vec<ClassifiedPeriod>,
}

impl<'a> Chain<'a> {
    fn new(config: &'a CalculationConfig, prior_days: u32, capacity: usize) -> Self {
        Self {
            config,
            cumulative: prior_days,
            opened_by: None,
            previous_end: None,
            episode: 0,
            classified: Vec::with_capacity(capacity),
        }
    }

    fn classify(&self, period: &StoppagePeriod) -> PeriodKind {
        match self.previous_end {
            None => PeriodKind::FirstClaim,
            Some(previous) if days_between(previous, period.start) >= self.config.relapse_window_days => {
                PeriodKind::NewCondition
            }
            Some(_) if self.opened_by.is_some() => PeriodKind::Relapse,
            Some(_) => PeriodKind::Continuation,
        }
    }

    /// Push a candidate date later for a late declaration or account update
    fn defer(period: &StoppagePeriod, candidate: NaiveDate, days: i64) -> NaiveDate {
        let mut date = candidate;
        if let Some(late) = period.late_declaration.filter(|l| !l.excused) {
            date = date.max(add_days(late.declared_on, days));
        }
        if let Some(updated) = period.late_account_update {
            date = date.max(add_days(updated, days));
        }
        date
    }

    fn threshold_outcome(&self, period: &StoppagePeriod, duration: u32, cumulative_before: u32) -> Outcome {
        let threshold = self.config.qualifying_days;
        if cumulative_before.saturating_add(duration) <= threshold {
            return Outcome::none(duration);
        }

        let offset = threshold.saturating_sub(cumulative_before);
        let candidate = add_days(period.start, offset as i64);
        let deferred = Self::defer(period, candidate, self.config.deferral_days_opening);
        if deferred > period.end {
            return Outcome::none(duration);
        }

        Outcome {
            entitlement: Some(deferred),
            decompte: days_between(period.start, deferred) as u32,
        }
    }

    /// A relapse that opens payment always records the relapse threshold
    fn relapse_outcome(&self, period: &StoppagePeriod, duration: u32, consecutive: bool) -> Outcome {
        let (candidate, deferral) = if consecutive {
            (period.start, self.config.deferral_days_consecutive)
        } else if duration < self.config.relapse_min_duration {
            return Outcome::none(0);
        } else {
            let waiting = self.config.relapse_waiting_days;
            (add_days(period.start, waiting as i64), self.config.deferral_days_opening)
        };

        let deferred = Self::defer(period, candidate, deferral);
        if deferred > period.end {
            return Outcome::none(0);
        }
        Outcome {
            entitlement: Some(deferred),
            decompte: self.config.relapse_decompte_days,
        }
    }

    fn push(mut self, merged: MergedPeriod) -> Self {
        let index = self.classified.len();
        let MergedPeriod { period, sources } = merged;
        let duration = period.duration();
        let kind = self.classify(&period);
        let consecutive = self
            .previous_end
            .is_some_and(|previous| period.start <= next_business_day(previous));

        if kind == PeriodKind::NewCondition {
            self.cumulative = 0;
            self.opened_by = None;
            self.episode += 1;
        }
        let cumulative_before = self.cumulative;
        self.cumulative = self.cumulative.saturating_add(duration);

        let outcome = match (period.forced_entitlement_date, kind) {
            (Some(forced), _) => Outcome {
                entitlement: Some(forced),
                decompte: days_between(period.start, forced).clamp(0, duration as i64) as u32,
            },
            (None, PeriodKind::Relapse) => self.relapse_outcome(&period, duration, consecutive),
            (None, _) => self.threshold_outcome(&period, duration, cumulative_before),
        };

        let relapse_of = if kind == PeriodKind::Relapse { self.opened_by } else { None };
        if outcome.entitlement.is_some() && kind != PeriodKind::Relapse {
            self.opened_by = Some(index);
        }

        let relapse_flag_mismatch = period
            .declared_relapse
            .is_some_and(|flag| flag != (kind == PeriodKind::Relapse));
        if relapse_flag_mismatch {
            warn!(
                "Period {} ({} to {}): caller relapse flag {:?} overridden, classified as {:?}",
                index, period.start, period.end, period.declared_relapse, kind
            );
        }

        debug!(
            "Period {} ({} to {}, {} days): {:?}, entitlement {:?}, decompte {}",
            index, period.start, period.end, duration, kind, outcome.entitlement, outcome.decompte
        );

        self.previous_end = Some(period.end);
        self.classified.push(ClassifiedPeriod {
            index,
            period,
            sources,
            duration,
            kind,
            consecutive,
            relapse_of,
            episode: self.episode,
            cumulative_days: self.cumulative,
            entitlement_date: outcome.entitlement,
            decompte: outcome.decompte,
            relapse_flag_mismatch,
        });
        self
    }
}

/// Merges, classifies, and dates stoppage periods
pub struct EntitlementEngine<'a> {
    config: &'a CalculationConfig,
}

impl<'a> EntitlementEngine<'a> {
    pub fn new(config: &'a CalculationConfig) -> Self {
        Self { config }
    }

    /// Classify every period and compute its entitlement date
    ///
    /// `prior_days` seeds the running qualifying count with days from
    /// earlier claims.
    pub fn compute(&self, periods: &[StoppagePeriod], prior_days: u32) -> Result<Vec<ClassifiedPeriod>, CalcError> {
        validate_periods(periods)?;

        let merged = if self.config.merge_prolongations {
            merge_prolongations(periods)
        } else {
            sorted_unmerged(periods)
        };

        let capacity = merged.len();
        let chain = merged
            .into_iter()
            .fold(Chain::new(self.config, prior_days, capacity), Chain::push);
        Ok(chain.classified)
    }
}

/// Entitlement dates under the default rules
pub fn compute_entitlement_dates(
    periods: &[StoppagePeriod],
    prior_days: u32,
) -> Result<Vec<ClassifiedPeriod>, CalcError> {
    EntitlementEngine::new(&CalculationConfig::default()).compute(periods, prior_days)
}
