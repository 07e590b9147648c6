//! Incapacity Benefits - entitlement and daily-rate engine for disability benefits
//!
//! This library provides:
//! - Merging and classification of work stoppage periods (first claim,
//!   continuation, relapse, new condition)
//! - Entitlement dates under the qualifying threshold and deferral rules
//! - Payable windows bounded by attestations, prior payments, and caps
//! - Rate code selection and day-accurate pricing against a dated rate table
//! - Day-by-day and monthly exports

pub mod calendar;
pub mod claim;
pub mod config;
pub mod error;
pub mod rates;
pub mod entitlement;
pub mod amount;
pub mod calculator;
pub mod report;

// Re-export commonly used types
pub use amount::{CalculationResult, PaymentDetail, RateSegment, RateSource};
pub use calculator::{compute, BenefitCalculator};
pub use claim::{Claim, ClaimContext, LateDeclaration, Status, StoppagePeriod};
pub use config::CalculationConfig;
pub use entitlement::{compute_entitlement_dates, compute_payable_windows, ClassifiedPeriod, PeriodKind, ZeroDayReason};
pub use error::{CalcError, RateTableError};
pub use rates::{BenefitClass, RateCode, RateTable};
