//! Fixed-width field encoding shared by the global file and the shards.
//!
//! Scalars are little-endian. Strings occupy a fixed byte width, UTF-8,
//! NUL-padded, truncated at a character boundary on encode. Dates are 10
//! ASCII bytes `YYYY-MM-DD`; an all-NUL date field encodes `None`.

use chrono::{NaiveDate, Weekday};

use tally_core::CoreError;
use tally_domain::{Category, Period, Subscription, Transaction, DESC_LEN, NAME_LEN};

pub const DATE_LEN: usize = 10;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// name + budget + spent + extra.
pub const CATEGORY_RECORD_LEN: usize = NAME_LEN + 8 * 3;
/// expense + amount + category index + description + date.
pub const TXN_RECORD_LEN: usize = 1 + 8 + 4 + DESC_LEN + DATE_LEN;
/// name + expense + amount + period tag + period day + period month +
/// start + end + last_updated + category name.
pub const SUB_RECORD_LEN: usize = NAME_LEN + 1 + 8 + 1 + 4 + 4 + DATE_LEN * 3 + NAME_LEN;
/// Byte offset of `last_updated` within a subscription record.
pub const SUB_CURSOR_OFFSET: usize = NAME_LEN + 1 + 8 + 1 + 4 + 4 + DATE_LEN * 2;

const PERIOD_WEEKLY: u8 = 0;
const PERIOD_MONTHLY: u8 = 1;
const PERIOD_YEARLY: u8 = 2;
const PERIOD_EVERY_DAYS: u8 = 3;

fn put_str(buf: &mut [u8], value: &str) {
    let mut end = value.len().min(buf.len());
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    buf[..end].copy_from_slice(&value.as_bytes()[..end]);
}

fn get_str(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

fn put_f64(buf: &mut [u8], at: usize, value: f64) {
    buf[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn get_f64(buf: &[u8], at: usize) -> f64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[at..at + 8]);
    f64::from_le_bytes(raw)
}

fn put_i32(buf: &mut [u8], at: usize, value: i32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn get_i32(buf: &[u8], at: usize) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[at..at + 4]);
    i32::from_le_bytes(raw)
}

pub fn put_date(buf: &mut [u8], date: NaiveDate) {
    let text = date.format(DATE_FORMAT).to_string();
    buf[..DATE_LEN].copy_from_slice(&text.as_bytes()[..DATE_LEN]);
}

pub fn get_date(buf: &[u8]) -> Result<NaiveDate, CoreError> {
    let raw = std::str::from_utf8(&buf[..DATE_LEN])
        .map_err(|_| CoreError::Corrupt("date field is not UTF-8".into()))?;
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| CoreError::Corrupt(format!("bad date field `{raw}`")))
}

fn put_opt_date(buf: &mut [u8], date: Option<NaiveDate>) {
    if let Some(date) = date {
        put_date(buf, date);
    }
}

fn get_opt_date(buf: &[u8]) -> Result<Option<NaiveDate>, CoreError> {
    if buf[..DATE_LEN].iter().all(|&b| b == 0) {
        return Ok(None);
    }
    get_date(buf).map(Some)
}

fn get_bool(byte: u8) -> Result<bool, CoreError> {
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(CoreError::Corrupt(format!("bad flag byte {other}"))),
    }
}

pub fn encode_category(category: &Category) -> [u8; CATEGORY_RECORD_LEN] {
    let mut buf = [0u8; CATEGORY_RECORD_LEN];
    put_str(&mut buf[..NAME_LEN], &category.name);
    put_f64(&mut buf, NAME_LEN, category.budget);
    put_f64(&mut buf, NAME_LEN + 8, category.spent);
    put_f64(&mut buf, NAME_LEN + 16, category.extra);
    buf
}

pub fn decode_category(buf: &[u8; CATEGORY_RECORD_LEN]) -> Category {
    Category {
        name: get_str(&buf[..NAME_LEN]),
        budget: get_f64(buf, NAME_LEN),
        spent: get_f64(buf, NAME_LEN + 8),
        extra: get_f64(buf, NAME_LEN + 16),
    }
}

pub fn encode_transaction(txn: &Transaction) -> [u8; TXN_RECORD_LEN] {
    let mut buf = [0u8; TXN_RECORD_LEN];
    buf[0] = txn.expense as u8;
    put_f64(&mut buf, 1, txn.amount);
    let index = txn.category.map(|c| c as i32).unwrap_or(-1);
    put_i32(&mut buf, 9, index);
    put_str(&mut buf[13..13 + DESC_LEN], &txn.description);
    put_date(&mut buf[13 + DESC_LEN..], txn.date);
    buf
}

pub fn decode_transaction(buf: &[u8; TXN_RECORD_LEN]) -> Result<Transaction, CoreError> {
    let index = get_i32(buf, 9);
    Ok(Transaction {
        expense: get_bool(buf[0])?,
        amount: get_f64(buf, 1),
        category: (index >= 0).then_some(index as u32),
        description: get_str(&buf[13..13 + DESC_LEN]),
        date: get_date(&buf[13 + DESC_LEN..])?,
    })
}

fn encode_period(period: Period, buf: &mut [u8; SUB_RECORD_LEN]) {
    let at = NAME_LEN + 1 + 8;
    let (tag, day, month) = match period {
        Period::Weekly(weekday) => (PERIOD_WEEKLY, weekday.num_days_from_sunday(), 0),
        Period::Monthly(day) => (PERIOD_MONTHLY, day, 0),
        Period::Yearly { month, day } => (PERIOD_YEARLY, day, month),
        Period::EveryDays(days) => (PERIOD_EVERY_DAYS, days, 0),
    };
    buf[at] = tag;
    put_i32(buf, at + 1, day as i32);
    put_i32(buf, at + 5, month as i32);
}

fn decode_period(buf: &[u8; SUB_RECORD_LEN]) -> Result<Period, CoreError> {
    let at = NAME_LEN + 1 + 8;
    let day = get_i32(buf, at + 1);
    let month = get_i32(buf, at + 5);
    match buf[at] {
        PERIOD_WEEKLY => weekday_from_sunday_index(day).map(Period::Weekly),
        PERIOD_MONTHLY => Ok(Period::Monthly(day as u32)),
        PERIOD_YEARLY => Ok(Period::Yearly {
            month: month as u32,
            day: day as u32,
        }),
        PERIOD_EVERY_DAYS => Ok(Period::EveryDays(day as u32)),
        other => Err(CoreError::Corrupt(format!("bad period tag {other}"))),
    }
}

fn weekday_from_sunday_index(index: i32) -> Result<Weekday, CoreError> {
    Ok(match index {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        6 => Weekday::Sat,
        other => return Err(CoreError::Corrupt(format!("bad weekday {other}"))),
    })
}

pub fn encode_subscription(sub: &Subscription) -> [u8; SUB_RECORD_LEN] {
    let mut buf = [0u8; SUB_RECORD_LEN];
    put_str(&mut buf[..NAME_LEN], &sub.name);
    buf[NAME_LEN] = sub.expense as u8;
    put_f64(&mut buf, NAME_LEN + 1, sub.amount);
    encode_period(sub.period, &mut buf);
    let dates = NAME_LEN + 1 + 8 + 1 + 4 + 4;
    put_date(&mut buf[dates..], sub.start);
    put_opt_date(&mut buf[dates + DATE_LEN..], sub.end);
    put_date(&mut buf[SUB_CURSOR_OFFSET..], sub.last_updated);
    put_str(
        &mut buf[SUB_CURSOR_OFFSET + DATE_LEN..SUB_CURSOR_OFFSET + DATE_LEN + NAME_LEN],
        &sub.category,
    );
    buf
}

pub fn decode_subscription(buf: &[u8; SUB_RECORD_LEN]) -> Result<Subscription, CoreError> {
    let dates = NAME_LEN + 1 + 8 + 1 + 4 + 4;
    Ok(Subscription {
        name: get_str(&buf[..NAME_LEN]),
        expense: get_bool(buf[NAME_LEN])?,
        amount: get_f64(buf, NAME_LEN + 1),
        period: decode_period(buf)?,
        start: get_date(&buf[dates..])?,
        end: get_opt_date(&buf[dates + DATE_LEN..])?,
        last_updated: get_date(&buf[SUB_CURSOR_OFFSET..])?,
        category: get_str(
            &buf[SUB_CURSOR_OFFSET + DATE_LEN..SUB_CURSOR_OFFSET + DATE_LEN + NAME_LEN],
        ),
    })
}
