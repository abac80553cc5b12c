//! Temporal value extraction from upstream scalars.
//!
//! The feed mixes three encodings for the same instant: numeric epochs
//! (seconds or milliseconds), .NET-style `/Date(<millis>)/` strings and
//! ISO-8601 strings. Nothing here fails: unreadable input yields an empty
//! time or no date.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::payload::field;

/// Epoch magnitudes above this are milliseconds.
const MILLIS_THRESHOLD: f64 = 1_000_000_000_000.0;

/// Dates before this year are artifacts of missing fields (epoch zero,
/// `0001-01-01`), not real lesson dates.
const MIN_DATE_YEAR: i32 = 2000;

static VENDOR_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/Date\((-?\d+)(?:[+-]\d{4})?\)/").expect("vendor date regex"));
static CLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2}):(\d{2})").expect("clock regex"));
static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("iso date regex"));

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Interpret a numeric epoch in UTC.
fn from_epoch(value: f64) -> Option<NaiveDateTime> {
    if !value.is_finite() {
        return None;
    }
    let secs = if value.abs() > MILLIS_THRESHOLD { value / 1000.0 } else { value };
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999)).map(|dt| dt.naive_utc())
}

fn from_vendor(s: &str) -> Option<Option<NaiveDateTime>> {
    let caps = VENDOR_DATE_RE.captures(s)?;
    let millis: i64 = match caps[1].parse() {
        Ok(m) => m,
        Err(_) => return Some(None),
    };
    Some(DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc()))
}

/// ISO-8601 parse. Offsets are kept as wall-clock time, a bare date is midnight.
fn from_iso(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Clock time `HH:MM` from an upstream scalar, or `""`.
pub fn extract_time(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(n)) => n
            .as_f64()
            .and_then(from_epoch)
            .map(|dt| dt.format("%H:%M").to_string())
            .unwrap_or_default(),
        Some(Value::String(s)) => {
            if let Some(parsed) = from_vendor(s) {
                return parsed.map(|dt| dt.format("%H:%M").to_string()).unwrap_or_default();
            }
            if let Some(dt) = from_iso(s) {
                return dt.format("%H:%M").to_string();
            }
            CLOCK_RE
                .captures(s)
                .map(|caps| format!("{:0>2}:{}", &caps[1], &caps[2]))
                .unwrap_or_default()
        }
        _ => String::new(),
    }
}

/// Calendar date from an upstream scalar; `None` for unreadable input and
/// for anything before 2000.
pub fn extract_date(value: Option<&Value>) -> Option<NaiveDate> {
    let date = match value? {
        Value::Number(n) => from_epoch(n.as_f64()?)?.date(),
        Value::String(s) => match from_vendor(s) {
            Some(parsed) => parsed?.date(),
            None => match from_iso(s) {
                Some(dt) => dt.date(),
                None => {
                    let found = ISO_DATE_RE.find(s)?;
                    NaiveDate::parse_from_str(found.as_str(), "%Y-%m-%d").ok()?
                }
            },
        },
        _ => return None,
    };
    (date.year() >= MIN_DATE_YEAR).then_some(date)
}

/// Lesson date, looked up on the record first and then inside its `Time` block.
pub fn entry_date(item: &Value) -> Option<NaiveDate> {
    const RECORD_KEYS: [&str; 4] = ["Date", "DateTime", "DateFrom", "DateTo"];
    const TIME_KEYS: [&str; 3] = ["Date", "TimeFrom", "TimeTo"];

    RECORD_KEYS
        .iter()
        .find_map(|key| extract_date(field(item, key)))
        .or_else(|| {
            let block = field(item, "Time")?;
            TIME_KEYS.iter().find_map(|key| extract_date(field(block, key)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn same_clock_time_from_every_encoding() {
        // 2026-02-09 09:45:00 UTC
        let secs = 1_770_630_300i64;
        let encodings = [
            json!(secs),
            json!(secs * 1000),
            json!(format!("/Date({})/", secs * 1000)),
            json!("2026-02-09T09:45:00"),
            json!("2026-02-09T09:45:00Z"),
            json!("0001-01-01T09:45:00"),
        ];
        for v in &encodings {
            assert_eq!(extract_time(Some(v)), "09:45", "input {v}");
        }
    }

    #[test]
    fn time_fallbacks() {
        assert_eq!(extract_time(Some(&json!("начало в 9:05"))), "09:05");
        assert_eq!(extract_time(Some(&json!("/Date(-62135596800000)/"))), "00:00");
        assert_eq!(extract_time(Some(&json!("garbage"))), "");
        assert_eq!(extract_time(Some(&json!(null))), "");
        assert_eq!(extract_time(None), "");
    }

    #[test]
    fn dates_before_2000_are_absent() {
        assert_eq!(extract_date(Some(&json!(0))), None);
        assert_eq!(extract_date(Some(&json!("0001-01-01T00:00:00"))), None);
        assert_eq!(extract_date(Some(&json!("/Date(-62135596800000)/"))), None);
        assert_eq!(extract_date(Some(&json!("1999-12-31"))), None);
    }

    #[test]
    fn dates_from_every_encoding() {
        let want = Some(ymd(2026, 2, 9));
        assert_eq!(extract_date(Some(&json!(1_770_630_300i64))), want);
        assert_eq!(extract_date(Some(&json!(1_770_630_300_000i64))), want);
        assert_eq!(extract_date(Some(&json!("/Date(1770630300000+0300)/"))), want);
        assert_eq!(extract_date(Some(&json!("2026-02-09"))), want);
        assert_eq!(extract_date(Some(&json!("2026-02-09T23:10:00+03:00"))), want);
        assert_eq!(extract_date(Some(&json!("на 2026-02-09 (пн)"))), want);
        assert_eq!(extract_date(Some(&json!("2026-02-30"))), None);
    }

    #[test]
    fn entry_date_lookup_order() {
        let item = json!({
            "DateFrom": "2026-03-02",
            "Time": {"Date": "2026-03-09", "TimeFrom": "0001-01-01T09:00:00"}
        });
        assert_eq!(entry_date(&item), Some(ymd(2026, 3, 2)));

        let item = json!({
            "Date": "0001-01-01T00:00:00",
            "Time": {"TimeFrom": "2026-03-09T09:00:00"}
        });
        assert_eq!(entry_date(&item), Some(ymd(2026, 3, 9)));

        let item = json!({"Time": {"TimeFrom": "0001-01-01T09:00:00"}});
        assert_eq!(entry_date(&item), None);
    }
}
