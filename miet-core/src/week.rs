//! Week-index resolution: which cycle index is "current" today.
//!
//! Several signals compete and the first one that yields a value wins:
//!
//! 1. operator override (`MIET_WEEK_OVERRIDE`)
//! 2. the week label the upstream reports about itself
//! 3. whole weeks since the configured term start
//! 4. any numeric week field in the upstream metadata
//! 5. ISO week of the year
//!
//! Each link is a separate function returning `Option` so it can be tested on
//! its own. The winner is offset by the configured linear shift and wrapped
//! into the cycle. Callers resolving "today" then apply [`density_index`].

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::cycle::CycleMeta;
use crate::error::Result;
use crate::lesson::Lesson;
use crate::payload::{RawPayload, WEEK_NUMBER_FIELDS};
use crate::time::{parse_term_start, weeks_between};

static FIRST_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("number regex"));

const NUMERATOR_MARKER: &str = "числ";
const DENOMINATOR_MARKER: &str = "знам";

pub const DEFAULT_TERM_START: &str = "2026-02-02";

/// Operator-controlled inputs to week resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeekSettings {
    /// Linear shift added to every resolved index.
    pub shift: i64,
    /// Forces the current week, e.g. "2 знаменатель" or "3".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_label: Option<String>,
    /// Academic term start, `YYYY-MM-DD`. Parsed lazily so a bad value only
    /// fails the resolutions that need it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_start: Option<String>,
}

impl Default for WeekSettings {
    fn default() -> Self {
        Self {
            shift: 0,
            override_label: None,
            term_start: Some(DEFAULT_TERM_START.to_string()),
        }
    }
}

/// Which signal decided the week index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekSource {
    Override,
    UpstreamLabel,
    Calendar,
    Metadata,
    IsoWeek,
    Density,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekResolution {
    pub index: usize,
    pub source: WeekSource,
}

/// Parse an operator override into a raw index.
///
/// A bare number N selects week N (1-based) when it fits the cycle. Otherwise
/// the numerator/denominator markers pick among the canonical labels, with a
/// "2" selecting the second half of a four-week cycle.
pub fn override_index(label: &str, cycle: usize) -> Option<i64> {
    let value = label.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }
    let cycle = cycle.max(1);

    if let Ok(n) = value.parse::<i64>() {
        if (1..=cycle as i64).contains(&n) {
            return Some(n - 1);
        }
    }

    let second_half = value.contains('2') && cycle >= 4;
    if value.contains(NUMERATOR_MARKER) {
        return Some(if second_half { 2 } else { 0 });
    }
    if value.contains(DENOMINATOR_MARKER) {
        return Some(if second_half {
            3
        } else if cycle >= 2 {
            1
        } else {
            0
        });
    }
    None
}

/// Normalize an upstream week label into a cycle index.
///
/// The first integer in the text is a raw week tag (aligned with the cycle
/// shift); without one, the numerator/denominator markers decide.
pub fn normalize_week_text(value: &str, meta: &CycleMeta) -> Option<i64> {
    if let Some(m) = FIRST_NUMBER_RE.find(value) {
        let n: i64 = m.as_str().parse().ok()?;
        return (n > 0).then(|| meta.index_of(n) as i64);
    }

    let lowered = value.to_lowercase();
    if meta.cycle >= 2 && lowered.contains(NUMERATOR_MARKER) {
        return Some(0);
    }
    if meta.cycle >= 2 && lowered.contains(DENOMINATOR_MARKER) {
        return Some(1);
    }
    None
}

/// Same as [`normalize_week_text`] for a raw JSON value.
pub fn normalize_week_value(value: &Value, meta: &CycleMeta) -> Option<i64> {
    match value {
        Value::Number(n) => {
            let n = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            (n > 0).then(|| meta.index_of(n) as i64)
        }
        Value::String(s) => normalize_week_text(s, meta),
        _ => None,
    }
}

fn upstream_label_index(payload: &RawPayload, meta: &CycleMeta) -> Option<i64> {
    let label = payload.week_label();
    if label.is_empty() {
        return None;
    }
    normalize_week_text(&label, meta)
}

/// Whole weeks since the term start, `None` when no term start is configured.
fn calendar_index(settings: &WeekSettings, today: NaiveDate) -> Result<Option<i64>> {
    let Some(raw) = settings.term_start.as_deref() else {
        return Ok(None);
    };
    let start = parse_term_start(raw)?;
    Ok(Some(weeks_between(start, today)))
}

fn metadata_index(payload: &RawPayload, meta: &CycleMeta) -> Option<i64> {
    WEEK_NUMBER_FIELDS
        .iter()
        .find_map(|key| normalize_week_value(payload.get(key)?, meta))
}

fn iso_week_index(today: NaiveDate) -> i64 {
    today.iso_week().week() as i64 - 1
}

/// Resolve the current week index from configuration and upstream signals.
///
/// Fails only when the configured term start is malformed.
pub fn resolve_week_index(
    meta: &CycleMeta,
    settings: &WeekSettings,
    today: NaiveDate,
    payload: &RawPayload,
) -> Result<WeekResolution> {
    let mut found = settings
        .override_label
        .as_deref()
        .and_then(|label| override_index(label, meta.cycle))
        .map(|i| (WeekSource::Override, i))
        .or_else(|| upstream_label_index(payload, meta).map(|i| (WeekSource::UpstreamLabel, i)));

    if found.is_none() {
        found = calendar_index(settings, today)?.map(|i| (WeekSource::Calendar, i));
    }

    let (source, raw) = found
        .or_else(|| metadata_index(payload, meta).map(|i| (WeekSource::Metadata, i)))
        .unwrap_or_else(|| (WeekSource::IsoWeek, iso_week_index(today)));

    let index = meta.wrap(meta.wrap(raw) as i64 + meta.wrap(settings.shift) as i64);
    debug!(?source, raw, index, cycle = meta.cycle, "resolved week index");
    Ok(WeekResolution { index, source })
}

/// Index favoured by lesson density on `weekday`: the one index with the
/// strictly highest positive count of tagged lessons, if unique.
pub fn density_index(entries: &[Lesson], meta: &CycleMeta, weekday: i64) -> Option<usize> {
    if meta.cycle <= 1 {
        return None;
    }

    let mut counts = vec![0usize; meta.cycle];
    for e in entries.iter().filter(|e| e.day == Some(weekday)) {
        if let Some(i) = e.cycle_index(meta) {
            counts[i] += 1;
        }
    }

    let max = counts.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return None;
    }
    let mut winners = counts.iter().enumerate().filter(|(_, c)| **c == max);
    match (winners.next(), winners.next()) {
        (Some((i, _)), None) => Some(i),
        _ => None,
    }
}

/// Week index for "today": the resolver chain, corrected by lesson density on
/// today's weekday when the density vote is unambiguous.
pub fn today_week_index(
    entries: &[Lesson],
    meta: &CycleMeta,
    settings: &WeekSettings,
    today: NaiveDate,
    payload: &RawPayload,
) -> Result<WeekResolution> {
    let resolved = resolve_week_index(meta, settings, today, payload)?;
    let weekday = today.weekday().number_from_monday() as i64;

    match density_index(entries, meta, weekday) {
        Some(index) if index != resolved.index => {
            debug!(from = resolved.index, to = index, weekday, "lesson density overrides week index");
            Ok(WeekResolution { index, source: WeekSource::Density })
        }
        _ => Ok(resolved),
    }
}

/// 1-based academic week number, shifted by `week_offset`, never below 1.
/// Falls back to the ISO week when no term start is configured.
pub fn linear_week_number(settings: &WeekSettings, today: NaiveDate, week_offset: i64) -> Result<i64> {
    let base = match settings.term_start.as_deref() {
        Some(raw) => weeks_between(parse_term_start(raw)?, today) + 1,
        None => today.iso_week().week() as i64,
    };
    Ok(base.saturating_add(week_offset).max(1))
}
