//! Incapacity benefits CLI
//!
//! Prices a claim from a JSON file, determines a benefit class from income,
//! or shows the rates in force for a year.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use incapacity_benefits::{
    claim::load_claim,
    rates::{load_rate_table, BenefitClass, RateTier, DEFAULT_RATES_PATH},
    report::{daily_records, monthly_recap, write_daily_csv, write_monthly_csv},
    BenefitCalculator, CalculationConfig,
};
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "incapacity_benefits")]
#[command(about = "Entitlement dates and daily benefit amounts for work stoppages")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a claim read from a JSON file
    Compute {
        /// Claim JSON file
        claim: PathBuf,

        /// Rate table CSV (defaults to $RATES_PATH, then data/rates.csv)
        #[arg(long)]
        rates: Option<PathBuf>,

        /// Write one CSV line per paid day
        #[arg(long, value_name = "CSV")]
        daily: Option<PathBuf>,

        /// Write one CSV line per month
        #[arg(long, value_name = "CSV")]
        monthly: Option<PathBuf>,

        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },

    /// Benefit class from the income of two years before
    Class {
        #[arg(long)]
        income: f64,

        /// Social security ceiling for that year
        #[arg(long)]
        pass: f64,

        /// Income assessed by default (forces class A)
        #[arg(long)]
        assessed_by_default: bool,
    },

    /// Show the rates governing a calendar year
    Rates {
        year: i32,

        #[arg(long)]
        rates: Option<PathBuf>,
    },
}

fn rates_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os("RATES_PATH").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RATES_PATH))
}

fn compute(claim: PathBuf, rates: Option<PathBuf>, daily: Option<PathBuf>, monthly: Option<PathBuf>, pretty: bool) -> Result<()> {
    let rates = rates_path(rates);
    let table = load_rate_table(&rates).with_context(|| format!("loading rate table {}", rates.display()))?;
    let calculator = BenefitCalculator::with_config(table, CalculationConfig::from_env());

    let claim = load_claim(&claim).with_context(|| format!("loading claim {}", claim.display()))?;
    let result = calculator.compute_claim(&claim)?;

    if let Some(path) = daily {
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        write_daily_csv(file, &daily_records(&result))?;
        log::info!("Daily records written to {}", path.display());
    }
    if let Some(path) = monthly {
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        write_monthly_csv(file, &monthly_recap(&result))?;
        log::info!("Monthly recap written to {}", path.display());
    }

    let json = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", json);
    Ok(())
}

fn show_rates(year: i32, rates: Option<PathBuf>) -> Result<()> {
    let rates = rates_path(rates);
    let table = load_rate_table(&rates).with_context(|| format!("loading rate table {}", rates.display()))?;
    let Some(period) = table.period_for_year(year) else {
        bail!("no rate period for {} in {}", year, rates.display());
    };

    println!("Rates from {} to {}", period.start, period.end);
    println!("{:>5} {:>10} {:>10} {:>10}", "Class", "Tier 1", "Tier 2", "Tier 3");
    for class in [BenefitClass::A, BenefitClass::B, BenefitClass::C] {
        println!(
            "{:>5} {:>10.2} {:>10.2} {:>10.2}",
            class.as_str(),
            period.rate(class, RateTier::Full),
            period.rate(class, RateTier::Reduced),
            period.rate(class, RateTier::Intermediate),
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Commands::Compute {
            claim,
            rates,
            daily,
            monthly,
            pretty,
        } => compute(claim, rates, daily, monthly, pretty),
        Commands::Class {
            income,
            pass,
            assessed_by_default,
        } => {
            let class = BenefitClass::from_income(income, pass, assessed_by_default);
            println!("{}", class.as_str());
            Ok(())
        }
        Commands::Rates { year, rates } => show_rates(year, rates),
    }
}
