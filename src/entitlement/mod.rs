//! Entitlement: period classification, entitlement dates, payable windows

mod engine;
mod window;

pub use engine::{compute_entitlement_dates, merge_prolongations, ClassifiedPeriod, EntitlementEngine, MergedPeriod, PeriodKind};
pub use window::{
    compute_payable_windows, AttestationSource, PayableWindowCalculator, PayableWindows, PaymentWindow, ZeroDayReason,
    AGE_CAP_AGE,
};
