use std::fmt::Display;

use chrono::{Datelike, Days, NaiveDate};
use clap::ValueEnum;

/// This is the standard way of converting a date to a string in daycloud. All
/// stored dates are zero-padded ISO, which makes lexicographic comparison valid
/// for range membership.
pub fn to_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Calendar-correct day arithmetic. Dates are plain calendar days, so there is no
/// timezone to drift through.
pub fn add_days(date: NaiveDate, n: i64) -> NaiveDate {
    if n >= 0 {
        date.checked_add_days(Days::new(n as u64))
    } else {
        date.checked_sub_days(Days::new(n.unsigned_abs()))
    }
    .expect("date arithmetic stays inside chrono's range")
}

/// Aggregation window used to sum sessions before visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RangeUnit {
    Day,
    Week,
    Month,
    Year,
}

impl Display for RangeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeUnit::Day => write!(f, "day"),
            RangeUnit::Week => write!(f, "week"),
            RangeUnit::Month => write!(f, "month"),
            RangeUnit::Year => write!(f, "year"),
        }
    }
}

/// First day of the window containing `reference`. Weeks start on Monday
/// regardless of locale; Sunday counts as the last day of the previous-started
/// week, i.e. offset -6 from its Monday.
pub fn range_start(reference: NaiveDate, unit: RangeUnit) -> NaiveDate {
    match unit {
        RangeUnit::Day => reference,
        RangeUnit::Week => {
            let offset = reference.weekday().num_days_from_monday() as i64;
            add_days(reference, -offset)
        }
        RangeUnit::Month => reference
            .with_day(1)
            .expect("day 1 exists in every month"),
        RangeUnit::Year => NaiveDate::from_ymd_opt(reference.year(), 1, 1)
            .expect("january 1st exists in every year"),
    }
}

/// Last day of the window containing `reference`, inclusive.
pub fn range_end(reference: NaiveDate, unit: RangeUnit) -> NaiveDate {
    match unit {
        RangeUnit::Day => reference,
        RangeUnit::Week => add_days(range_start(reference, RangeUnit::Week), 6),
        RangeUnit::Month => {
            let first = range_start(reference, RangeUnit::Month);
            let next_month = if first.month() == 12 {
                NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
            }
            .expect("first day of the following month exists");
            add_days(next_month, -1)
        }
        RangeUnit::Year => NaiveDate::from_ymd_opt(reference.year(), 12, 31)
            .expect("december 31st exists in every year"),
    }
}

/// Inclusive on both ends.
pub fn in_range(date: NaiveDate, reference: NaiveDate, unit: RangeUnit) -> bool {
    range_start(reference, unit) <= date && date <= range_end(reference, unit)
}
