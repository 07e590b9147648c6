//! Rate tables, rate codes, benefit classes, and rate table loading

mod class;
mod code;
mod table;
pub mod loader;

pub use class::BenefitClass;
pub use code::{AffiliationTier, CodeFamily, RateCode};
pub use table::{RatePeriod, RateTable, RateTier};
pub use loader::{load_rate_table, load_rate_table_from_reader, DEFAULT_RATES_PATH};
