//! Recurring subscriptions and their calendar arithmetic.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// How often a subscription recurs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Period {
    /// Every week on the given weekday.
    Weekly(Weekday),
    /// Every month on the given day of month. Days past the end of a
    /// month roll into the following month.
    Monthly(u32),
    /// Every year in the given month on the given day.
    Yearly { month: u32, day: u32 },
    /// Every fixed number of days.
    EveryDays(u32),
}

impl Period {
    /// First occurrence strictly after `cursor`.
    pub fn next_occurrence(self, cursor: NaiveDate) -> NaiveDate {
        match self {
            Period::Weekly(weekday) => {
                let start = cursor + Duration::days(1);
                let ahead = (weekday.num_days_from_sunday() as i64
                    - start.weekday().num_days_from_sunday() as i64)
                    .rem_euclid(7);
                start + Duration::days(ahead)
            }
            Period::Monthly(day) => {
                let candidate = normalize_ymd(cursor.year(), cursor.month(), day);
                if candidate > cursor {
                    candidate
                } else {
                    let (year, month) = next_month(cursor.year(), cursor.month());
                    normalize_ymd(year, month, day)
                }
            }
            Period::Yearly { month, day } => {
                let candidate = normalize_ymd(cursor.year(), month, day);
                if candidate > cursor {
                    candidate
                } else {
                    normalize_ymd(cursor.year() + 1, month, day)
                }
            }
            Period::EveryDays(days) => cursor + Duration::days(days.max(1) as i64),
        }
    }
}

/// A recurring entry stored in the global file.
///
/// `last_updated` is the inclusive cursor: every occurrence on or before
/// it has been materialized. The core only ever rewrites that cursor;
/// creating and removing subscriptions belongs to the frontend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub name: String,
    pub expense: bool,
    pub amount: f64,
    pub period: Period,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
    pub last_updated: NaiveDate,
    /// Name of the category each materialized entry should land in.
    pub category: String,
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next) = next_month(year, month);
    let first_next = NaiveDate::from_ymd_opt(next_year, next, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 28).unwrap());
    (first_next - Duration::days(1)).day()
}

/// Builds a date from a possibly-overflowing day of month, rolling the
/// excess into the following month the way `mktime` normalizes its input.
fn normalize_ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    let mut year = year;
    let mut month = month.clamp(1, 12);
    let mut day = day.max(1);
    loop {
        let len = days_in_month(year, month);
        if day <= len {
            break;
        }
        day -= len;
        let (y, m) = next_month(year, month);
        year = y;
        month = m;
    }
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
