//! Calendar arithmetic shared by the entitlement and amount engines
//!
//! All day counts are inclusive of both ends unless stated otherwise.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Add (or subtract) a number of calendar days
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// Inclusive day count between two dates, 0 when `end` precedes `start`
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        0
    } else {
        ((end - start).num_days() + 1) as u32
    }
}

/// Signed number of days from `from` to `to`
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// First working day after `date`, skipping Saturday and Sunday
pub fn next_business_day(date: NaiveDate) -> NaiveDate {
    let next = add_days(date, 1);
    match next.weekday() {
        Weekday::Sat => add_days(next, 2),
        Weekday::Sun => add_days(next, 1),
        _ => next,
    }
}

/// Last day of the month containing `date`
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Calendar quarter (1-4) containing `date`
pub fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// Age in completed years on `date`
pub fn age_at(birth: NaiveDate, date: NaiveDate) -> u32 {
    if date <= birth {
        return 0;
    }
    let mut age = date.year() - birth.year();
    if (date.month(), date.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age.max(0) as u32
}

/// Birthday falling in `year`; 29 February maps to 1 March in common years
fn anniversary(birth: NaiveDate, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, birth.month(), birth.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
        .unwrap_or(NaiveDate::MAX)
}

/// First birthday strictly after `date`
pub fn next_birthday_after(birth: NaiveDate, date: NaiveDate) -> NaiveDate {
    let this_year = anniversary(birth, date.year());
    if this_year > date {
        this_year
    } else {
        anniversary(birth, date.year() + 1)
    }
}

/// Number of calendar quarters of affiliation on `date`
///
/// The quarter in which affiliation started counts, as does the quarter
/// containing `date`. Nothing is counted before the affiliation date.
pub fn affiliation_quarters(affiliation: NaiveDate, date: NaiveDate) -> u32 {
    if date < affiliation {
        return 0;
    }
    let years = (date.year() - affiliation.year()) as i64;
    let quarters = years * 4 + quarter_of(date) as i64 - quarter_of(affiliation) as i64 + 1;
    quarters.max(0) as u32
}

/// Parse an ISO `YYYY-MM-DD` or French `DD/MM/YYYY` date
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .ok()
}

/// Round a monetary amount to cents, half away from zero
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_days_inclusive() {
        assert_eq!(days_inclusive(d(2024, 1, 1), d(2024, 1, 1)), 1);
        assert_eq!(days_inclusive(d(2024, 1, 1), d(2024, 12, 31)), 366);
        assert_eq!(days_inclusive(d(2024, 1, 2), d(2024, 1, 1)), 0);
    }

    #[test]
    fn test_next_business_day_skips_weekend() {
        // 2024-03-08 is a Friday
        assert_eq!(next_business_day(d(2024, 3, 8)), d(2024, 3, 11));
        // Saturday and Sunday both roll to Monday
        assert_eq!(next_business_day(d(2024, 3, 9)), d(2024, 3, 11));
        assert_eq!(next_business_day(d(2024, 3, 10)), d(2024, 3, 11));
        // Midweek is the next day
        assert_eq!(next_business_day(d(2024, 3, 12)), d(2024, 3, 13));
    }

    #[test]
    fn test_month_end() {
        assert_eq!(month_end(d(2024, 2, 10)), d(2024, 2, 29));
        assert_eq!(month_end(d(2025, 2, 1)), d(2025, 2, 28));
        assert_eq!(month_end(d(2024, 12, 27)), d(2024, 12, 31));
    }

    #[test]
    fn test_age_at_birthday_boundary() {
        let birth = d(1958, 6, 3);
        assert_eq!(age_at(birth, d(2020, 6, 2)), 61);
        assert_eq!(age_at(birth, d(2020, 6, 3)), 62);
        assert_eq!(age_at(birth, d(2028, 6, 3)), 70);
    }

    #[test]
    fn test_leap_day_birthday() {
        let birth = d(1960, 2, 29);
        assert_eq!(next_birthday_after(birth, d(2023, 1, 15)), d(2023, 3, 1));
        assert_eq!(next_birthday_after(birth, d(2024, 1, 15)), d(2024, 2, 29));
        assert_eq!(age_at(birth, d(2023, 3, 1)), 63);
        assert_eq!(age_at(birth, d(2023, 2, 28)), 62);
    }

    #[test]
    fn test_next_birthday_is_strictly_after() {
        let birth = d(1958, 6, 3);
        assert_eq!(next_birthday_after(birth, d(2024, 6, 3)), d(2025, 6, 3));
        assert_eq!(next_birthday_after(birth, d(2024, 6, 2)), d(2024, 6, 3));
    }

    #[test]
    fn test_affiliation_quarters() {
        let affiliation = d(2020, 2, 15);
        assert_eq!(affiliation_quarters(affiliation, d(2020, 1, 31)), 0);
        assert_eq!(affiliation_quarters(affiliation, d(2020, 3, 31)), 1);
        assert_eq!(affiliation_quarters(affiliation, d(2020, 4, 1)), 2);
        assert_eq!(affiliation_quarters(affiliation, d(2022, 1, 1)), 9);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-11-23"), Some(d(2024, 11, 23)));
        assert_eq!(parse_date("23/11/2024"), Some(d(2024, 11, 23)));
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(0.125), 0.13);
        assert_eq!(round_cents(7.4567), 7.46);
    }
}
