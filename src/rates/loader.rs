//! Load a rate table from CSV
//!
//! Expected columns: `start,end,a1,a2,a3,b1,b2,b3,c1,c2,c3`, one row per
//! rate period, dates as `YYYY-MM-DD` or `DD/MM/YYYY`.

use csv::Reader;
use std::path::Path;

use super::{RatePeriod, RateTable};
use crate::calendar::parse_date;
use crate::error::RateTableError;

/// Default location of the rate table used by the binaries
pub const DEFAULT_RATES_PATH: &str = "data/rates.csv";

/// Raw CSV row
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    start: String,
    end: String,
    a1: f64,
    a2: f64,
    a3: f64,
    b1: f64,
    b2: f64,
    b3: f64,
    c1: f64,
    c2: f64,
    c3: f64,
}

impl CsvRow {
    fn to_period(self, row: usize) -> Result<RatePeriod, RateTableError> {
        let start = parse_date(&self.start).ok_or_else(|| RateTableError::InvalidDate {
            row,
            value: self.start.clone(),
        })?;
        let end = parse_date(&self.end).ok_or_else(|| RateTableError::InvalidDate {
            row,
            value: self.end.clone(),
        })?;

        Ok(RatePeriod::new(
            start,
            end,
            [self.a1, self.a2, self.a3],
            [self.b1, self.b2, self.b3],
            [self.c1, self.c2, self.c3],
        ))
    }
}

/// Load a rate table from a CSV file
pub fn load_rate_table<P: AsRef<Path>>(path: P) -> Result<RateTable, RateTableError> {
    let reader = Reader::from_path(path)?;
    read_periods(reader)
}

/// Load a rate table from any reader (string buffer, request body, ...)
pub fn load_rate_table_from_reader<R: std::io::Read>(reader: R) -> Result<RateTable, RateTableError> {
    read_periods(Reader::from_reader(reader))
}

fn read_periods<R: std::io::Read>(mut reader: Reader<R>) -> Result<RateTable, RateTableError> {
    let mut periods = Vec::new();

    for (idx, result) in reader.deserialize().enumerate() {
        let row: CsvRow = result?;
        // Row numbers are reported 1-based, after the header line
        periods.push(row.to_period(idx + 1)?);
    }

    log::debug!("Loaded {} rate periods", periods.len());
    RateTable::new(periods)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::{BenefitClass, RateTier};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
start,end,a1,a2,a3,b1,b2,b3,c1,c2,c3
2024-01-01,2024-12-31,65.0,32.5,48.75,130.0,65.0,97.5,195.0,97.5,146.25
01/01/2023,31/12/2023,63.0,31.5,47.25,126.0,63.0,94.5,189.0,94.5,141.75
";

    #[test]
    fn test_load_from_reader() {
        let table = load_rate_table_from_reader(SAMPLE.as_bytes()).expect("Failed to load rates");
        assert_eq!(table.periods().len(), 2);

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let period = table.period_for(date).unwrap();
        assert_relative_eq!(period.rate(BenefitClass::C, RateTier::Full), 195.0);
        assert_relative_eq!(period.rate(BenefitClass::A, RateTier::Intermediate), 48.75);

        // Second row was parsed from French-format dates
        let earlier = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        assert!(table.period_for(earlier).is_some());
    }

    #[test]
    fn test_bad_date_reports_row() {
        let bad = "start,end,a1,a2,a3,b1,b2,b3,c1,c2,c3\n2024-13-01,2024-12-31,1,1,1,1,1,1,1,1,1\n";
        match load_rate_table_from_reader(bad.as_bytes()) {
            Err(RateTableError::InvalidDate { row, value }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "2024-13-01");
            }
            other => panic!("Expected InvalidDate, got {:?}", other),
        }
    }

    #[test]
    fn test_default_table_loads() {
        let table = load_rate_table(DEFAULT_RATES_PATH).expect("Failed to load data/rates.csv");
        assert!(table.period_for_year(2024).is_some());
    }

    #[test]
    fn test_non_numeric_rate_is_csv_error() {
        let bad = "start,end,a1,a2,a3,b1,b2,b3,c1,c2,c3\n2024-01-01,2024-12-31,x,1,1,1,1,1,1,1,1\n";
        assert!(matches!(
            load_rate_table_from_reader(bad.as_bytes()),
            Err(RateTableError::Csv(_))
        ));
    }
}
