//! Rate resolution, amount aggregation, and result types

mod aggregator;
mod resolver;
mod result;

pub use aggregator::{entitlement_window_ends, sub_period_for, AmountAggregator};
pub use resolver::{
    select_rate_code, tier_for, CodeInputs, DailyRate, Pricing, RateResolver, RateSource, ELDER_AGE, SENIOR_AGE,
};
pub use result::{CalculationResult, DailyLine, PaymentDetail, RateSegment, ResultSummary, WindowEnd};
