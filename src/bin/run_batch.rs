//! Price a batch of claims from a JSON array
//!
//! Outputs one summary line per claim; claims are priced in parallel.

use anyhow::{Context, Result};
use clap::Parser;
use incapacity_benefits::{
    claim::parse_claims_json,
    rates::{load_rate_table, DEFAULT_RATES_PATH},
    BenefitCalculator, CalculationConfig,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "run_batch")]
#[command(about = "Price a JSON array of claims and write a summary CSV")]
struct Args {
    /// JSON file holding an array of claims
    claims: PathBuf,

    /// Rate table CSV
    #[arg(long, default_value = DEFAULT_RATES_PATH)]
    rates: PathBuf,

    /// Summary CSV
    #[arg(long, short = 'o', default_value = "batch_summary.csv")]
    output: PathBuf,
}

/// One line of the summary file
#[derive(Debug, Serialize)]
struct SummaryRow {
    claim_id: String,
    periods: usize,
    payable_periods: usize,
    first_entitlement: Option<String>,
    total_days: u32,
    total_amount: f64,
    error: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let start = Instant::now();

    let table = load_rate_table(&args.rates).with_context(|| format!("loading rate table {}", args.rates.display()))?;
    let calculator = BenefitCalculator::with_config(table, CalculationConfig::from_env());

    let json = std::fs::read_to_string(&args.claims).with_context(|| format!("reading {}", args.claims.display()))?;
    let claims = parse_claims_json(&json)?;
    println!("Loaded {} claims in {:?}", claims.len(), start.elapsed());

    let calc_start = Instant::now();
    let results = calculator.compute_batch(&claims);
    println!("Claims priced in {:?}", calc_start.elapsed());

    let mut writer = csv::Writer::from_path(&args.output).with_context(|| format!("creating {}", args.output.display()))?;
    let mut total_amount = 0.0;
    let mut failures = 0;

    for (index, (claim, outcome)) in claims.iter().zip(&results).enumerate() {
        let claim_id = claim.claim_id.clone().unwrap_or_else(|| format!("#{}", index + 1));
        let row = match outcome {
            Ok(result) => {
                let summary = result.summary();
                total_amount += summary.total_amount;
                SummaryRow {
                    claim_id,
                    periods: summary.periods,
                    payable_periods: summary.payable_periods,
                    first_entitlement: summary.first_entitlement.map(|d| d.to_string()),
                    total_days: summary.total_days,
                    total_amount: summary.total_amount,
                    error: None,
                }
            }
            Err(e) => {
                failures += 1;
                log::warn!("Claim {} rejected: {}", claim_id, e);
                SummaryRow {
                    claim_id,
                    periods: claim.periods.len(),
                    payable_periods: 0,
                    first_entitlement: None,
                    total_days: 0,
                    total_amount: 0.0,
                    error: Some(e.to_string()),
                }
            }
        };
        writer.serialize(row)?;
    }
    writer.flush()?;

    println!("Output written to {}", args.output.display());
    println!("\nBatch Summary:");
    println!("  Claims:       {}", claims.len());
    println!("  Rejected:     {}", failures);
    println!("  Total amount: {:.2}", total_amount);
    println!("\nTotal time: {:?}", start.elapsed());

    Ok(())
}
