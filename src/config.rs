//! Calculation parameters
//!
//! Every regulatory constant used by the engines lives here so that a run
//! can be replayed under a different rule revision without code changes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::calendar::parse_date;

/// Default reform cutoff: uncovered dates from here on use the ceiling formula
pub const DEFAULT_REFORM_CUTOFF: (i32, u32, u32) = (2025, 1, 1);

/// Configuration for a calculation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationConfig {
    /// Uncompensated days before a first claim or new condition opens rights
    pub qualifying_days: u32,

    /// Uncompensated days at the start of a non-consecutive relapse
    /// (14 means payable from the 15th day)
    pub relapse_waiting_days: u32,

    /// Minimum duration for a non-consecutive relapse to open any payment
    pub relapse_min_duration: u32,

    /// Qualifying days recorded for a relapse that opens payment
    pub relapse_decompte_days: u32,

    /// A period starting fewer days than this after the previous end is a relapse
    pub relapse_window_days: i64,

    /// Deferral added to a late declaration / account update on an opening period
    pub deferral_days_opening: i64,

    /// Deferral added on a directly-consecutive relapse
    pub deferral_days_consecutive: i64,

    /// Attestations dated on or after this day of month cover the whole month
    pub attestation_month_end_day: u32,

    /// Episode length from which 62-69 year olds follow the three-tier path
    pub senior_path_min_days: u32,

    /// Prior paid days beyond which nothing more is payable
    pub max_prior_days: u32,

    /// Lifetime cap once the claimant is 70 or older
    pub age_70_cap_days: u32,

    /// Minimum affiliation quarters when the condition pre-dates enrollment
    pub min_affiliation_quarters: u32,

    /// Date from which uncovered days are priced with the ceiling formula
    pub reform_cutoff: NaiveDate,

    /// Merge periods that resume on the next business day
    pub merge_prolongations: bool,

    /// Expand every rate segment into day-by-day lines
    pub detailed_output: bool,
}

impl Default for CalculationConfig {
    fn default() -> Self {
        let (y, m, d) = DEFAULT_REFORM_CUTOFF;
        Self {
            qualifying_days: 90,
            relapse_waiting_days: 14,
            relapse_min_duration: 15,
            relapse_decompte_days: 15,
            relapse_window_days: 365,
            deferral_days_opening: 30,
            deferral_days_consecutive: 31,
            attestation_month_end_day: 27,
            senior_path_min_days: 730,
            max_prior_days: 1095,
            age_70_cap_days: 365,
            min_affiliation_quarters: 8,
            reform_cutoff: NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MAX),
            merge_prolongations: true,
            detailed_output: false,
        }
    }
}

impl CalculationConfig {
    /// Defaults overridden by `IJ_*` environment variables
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        override_from_env("IJ_QUALIFYING_DAYS", &mut config.qualifying_days);
        override_from_env("IJ_RELAPSE_WAITING_DAYS", &mut config.relapse_waiting_days);
        override_from_env("IJ_RELAPSE_MIN_DURATION", &mut config.relapse_min_duration);
        override_from_env("IJ_RELAPSE_DECOMPTE_DAYS", &mut config.relapse_decompte_days);
        override_from_env("IJ_RELAPSE_WINDOW_DAYS", &mut config.relapse_window_days);
        override_from_env("IJ_DEFERRAL_DAYS_OPENING", &mut config.deferral_days_opening);
        override_from_env("IJ_DEFERRAL_DAYS_CONSECUTIVE", &mut config.deferral_days_consecutive);
        override_from_env("IJ_ATTESTATION_MONTH_END_DAY", &mut config.attestation_month_end_day);
        override_from_env("IJ_SENIOR_PATH_MIN_DAYS", &mut config.senior_path_min_days);
        override_from_env("IJ_MAX_PRIOR_DAYS", &mut config.max_prior_days);
        override_from_env("IJ_AGE_70_CAP_DAYS", &mut config.age_70_cap_days);
        override_from_env("IJ_MIN_AFFILIATION_QUARTERS", &mut config.min_affiliation_quarters);
        override_from_env("IJ_MERGE_PROLONGATIONS", &mut config.merge_prolongations);
        override_from_env("IJ_DETAILED_OUTPUT", &mut config.detailed_output);

        if let Ok(raw) = env::var("IJ_REFORM_CUTOFF") {
            match parse_date(&raw) {
                Some(date) => config.reform_cutoff = date,
                None => log::warn!("Ignoring IJ_REFORM_CUTOFF={:?}: not a date", raw),
            }
        }

        config
    }
}

fn override_from_env<T: FromStr>(name: &str, target: &mut T) {
    if let Ok(raw) = env::var(name) {
        match raw.trim().parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => log::warn!("Ignoring {}={:?}: unparseable value", name, raw),
        }
    }
}
