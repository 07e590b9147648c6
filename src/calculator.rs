//! Benefit calculator
//!
//! Holds the rate table and configuration once, then prices any number of
//! claims against them. The table is never mutated after construction, so a
//! single calculator can be shared across threads.

use rayon::prelude::*;
use std::path::Path;

use crate::amount::{AmountAggregator, CalculationResult};
use crate::claim::{validate_periods, Claim, ClaimContext, StoppagePeriod};
use crate::config::CalculationConfig;
use crate::entitlement::{ClassifiedPeriod, EntitlementEngine, PayableWindowCalculator, PayableWindows};
use crate::error::{CalcError, RateTableError};
use crate::rates::{load_rate_table, RateTable};

/// Pre-loaded calculator for single and batch claims
///
/// # Example
/// ```ignore
/// let calculator = BenefitCalculator::from_csv_path("data/rates.csv")?;
/// let result = calculator.compute(&claim.periods, &claim.context)?;
/// println!("{} days, {:.2}", result.total_days, result.total_amount);
/// ```
#[derive(Debug, Clone)]
pub struct BenefitCalculator {
    rates: RateTable,
    config: CalculationConfig,
}

impl BenefitCalculator {
    /// Calculator with the default rules
    pub fn new(rates: RateTable) -> Self {
        Self::with_config(rates, CalculationConfig::default())
    }

    pub fn with_config(rates: RateTable, config: CalculationConfig) -> Self {
        Self { rates, config }
    }

    /// Load the rate table from a CSV file
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, RateTableError> {
        Ok(Self::new(load_rate_table(path)?))
    }

    /// Price one claim
    pub fn compute(&self, periods: &[StoppagePeriod], ctx: &ClaimContext) -> Result<CalculationResult, CalcError> {
        run(periods, ctx, &self.rates, &self.config)
    }

    pub fn compute_claim(&self, claim: &Claim) -> Result<CalculationResult, CalcError> {
        self.compute(&claim.periods, &claim.context)
    }

    /// Price independent claims in parallel; results keep the input order
    pub fn compute_batch(&self, claims: &[Claim]) -> Vec<Result<CalculationResult, CalcError>> {
        claims.par_iter().map(|claim| self.compute_claim(claim)).collect()
    }

    /// Classified periods with their entitlement dates
    pub fn entitlement_dates(
        &self,
        periods: &[StoppagePeriod],
        prior_days: u32,
    ) -> Result<Vec<ClassifiedPeriod>, CalcError> {
        EntitlementEngine::new(&self.config).compute(periods, prior_days)
    }

    /// Payable windows for already classified periods
    pub fn payable_windows(&self, periods: &[ClassifiedPeriod], ctx: &ClaimContext) -> PayableWindows {
        PayableWindowCalculator::new(&self.config).compute(periods, ctx)
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn config(&self) -> &CalculationConfig {
        &self.config
    }
}

fn run(
    periods: &[StoppagePeriod],
    ctx: &ClaimContext,
    rates: &RateTable,
    config: &CalculationConfig,
) -> Result<CalculationResult, CalcError> {
    ctx.validate()?;
    validate_periods(periods)?;

    let classified = EntitlementEngine::new(config).compute(periods, ctx.prior_paid_days)?;
    let windows = PayableWindowCalculator::new(config).compute(&classified, ctx);
    Ok(AmountAggregator::new(rates, config).aggregate(classified, &windows, ctx))
}

/// Price one claim under the default rules
pub fn compute(periods: &[StoppagePeriod], ctx: &ClaimContext, rates: &RateTable) -> Result<CalculationResult, CalcError> {
    run(periods, ctx, rates, &CalculationConfig::default())
}
