//! Error types for claim input and rate table loading

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while validating or computing a claim
///
/// Only malformed input is an error. Policy outcomes such as an unmet
/// threshold or an exhausted cap produce a valid zero result instead.
#[derive(Debug, Error)]
pub enum CalcError {
    #[error("Invalid date for {field}: {value:?}")]
    InvalidDate { field: String, value: String },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Stoppage period {index} starts on {start} after it ends on {end}")]
    PeriodOutOfOrder {
        index: usize,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Claim JSON could not be parsed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Claim file could not be read: {0}")]
    Io(#[from] std::io::Error),
}

impl CalcError {
    pub(crate) fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        CalcError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while loading a rate table
#[derive(Debug, Error)]
pub enum RateTableError {
    #[error("Rate table could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rate table CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Rate table row {row}: invalid date {value:?}")]
    InvalidDate { row: usize, value: String },

    #[error("Rate period {start}..{end} ends before it starts")]
    InvertedPeriod { start: NaiveDate, end: NaiveDate },

    #[error("Rate period starting {next_start} overlaps the period ending {previous_end}")]
    Overlap {
        previous_end: NaiveDate,
        next_start: NaiveDate,
    },

    #[error("Rate period starting {start} has a negative rate")]
    NegativeRate { start: NaiveDate },
}
