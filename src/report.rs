//! Day-by-day and monthly exports of a calculation result

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

use crate::amount::CalculationResult;
use crate::calendar::{add_days, round_cents};

/// One paid day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub period_index: usize,
    pub date: NaiveDate,
    pub rate_code: Option<u8>,
    pub daily_rate: f64,
    pub amount: f64,
}

/// Days and amount paid in one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRecap {
    pub year: i32,
    pub month: u32,
    pub days: u32,
    pub amount: f64,
    pub segments: usize,
}

/// Expand every segment into one record per day
pub fn daily_records(result: &CalculationResult) -> Vec<DailyRecord> {
    result
        .details
        .iter()
        .flat_map(|detail| {
            detail.segments.iter().flat_map(move |segment| {
                (0..segment.days).map(move |offset| DailyRecord {
                    period_index: detail.period_index,
                    date: add_days(segment.start, offset as i64),
                    rate_code: segment.rate_code.map(|c| c.value()),
                    daily_rate: segment.daily_rate,
                    amount: round_cents(segment.daily_rate),
                })
            })
        })
        .collect()
}

/// Group segments by calendar month
pub fn monthly_recap(result: &CalculationResult) -> Vec<MonthlyRecap> {
    let mut months: BTreeMap<(i32, u32), MonthlyRecap> = BTreeMap::new();
    for segment in result.segments() {
        let key = (segment.start.year(), segment.start.month());
        let recap = months.entry(key).or_insert_with(|| MonthlyRecap {
            year: key.0,
            month: key.1,
            days: 0,
            amount: 0.0,
            segments: 0,
        });
        recap.days += segment.days;
        recap.amount = round_cents(recap.amount + segment.amount);
        recap.segments += 1;
    }
    months.into_values().collect()
}

fn write_csv<W: Write, T: Serialize>(writer: W, records: &[T]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_daily_csv<W: Write>(writer: W, records: &[DailyRecord]) -> Result<(), csv::Error> {
    write_csv(writer, records)
}

pub fn write_monthly_csv<W: Write>(writer: W, recap: &[MonthlyRecap]) -> Result<(), csv::Error> {
    write_csv(writer, recap)
}
