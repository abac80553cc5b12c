//! Time utilities: institution-local "today" and academic-week arithmetic.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::error::{Result, ScheduleError};

/// Parse an IANA timezone name like "Europe/Moscow".
pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.trim()
        .parse()
        .map_err(|_| ScheduleError::Config(format!("invalid timezone: {tz}")))
}

/// Calendar date of `now` in the institution's timezone.
pub fn local_today(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Parse the academic term start. Dots are accepted as separators
/// ("2026.02.02").
pub fn parse_term_start(raw: &str) -> Result<NaiveDate> {
    let value = raw.trim().replace('.', "-");
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|e| {
        ScheduleError::Config(format!(
            "term start must be YYYY-MM-DD, got '{raw}': {e}"
        ))
    })
}

/// Monday of the week containing `date`.
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Whole weeks from the Monday of `from`'s week to the Monday of `to`'s week.
/// Negative when `to` precedes `from`.
pub fn weeks_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (week_monday(to) - week_monday(from)).num_days().div_euclid(7)
}

/// Short day-month label, e.g. "09.02".
pub fn day_month(date: NaiveDate) -> String {
    date.format("%d.%m").to_string()
}
