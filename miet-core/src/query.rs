//! Day/week queries over a cached schedule snapshot.
//!
//! Two modes, decided per snapshot:
//! - dated: lessons carry their own dates; filter by calendar date.
//! - cyclic: lessons carry weekday + raw week tag; filter by weekday and the
//!   effective week index.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::cycle::{detect_cycle, CycleMeta};
use crate::denylist::Denylist;
use crate::error::{Result, ScheduleError};
use crate::lesson::{Lesson, LessonView};
use crate::normalize::parse_entries;
use crate::payload::RawPayload;
use crate::time::day_month;
use crate::week::{linear_week_number, today_week_index, WeekSettings};

/// Monday..Saturday; Sunday is not part of the teaching week.
const TEACHING_DAYS: std::ops::RangeInclusive<i64> = 1..=6;

/// Normalized schedule for one group. Built once per cache fill, shared
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleSnapshot {
    pub entries: Vec<Lesson>,
    pub meta: CycleMeta,
    pub has_dates: bool,
    pub raw: RawPayload,
}

impl ScheduleSnapshot {
    pub fn from_entries(entries: Vec<Lesson>, raw: RawPayload) -> Self {
        let meta = detect_cycle(&entries);
        let has_dates = entries.iter().any(|e| e.date.is_some());
        Self { entries, meta, has_dates, raw }
    }

    /// Normalize a raw payload into a snapshot.
    pub fn build(raw: RawPayload, denylist: &Denylist) -> Result<Self> {
        let entries = parse_entries(&raw, denylist)?;
        Ok(Self::from_entries(entries, raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayView {
    /// Label for the real current week (upstream text when it has one).
    pub week_label_now: String,
    /// Label for the week being viewed.
    pub week_label_view: String,
    pub week_index: usize,
    pub week_number: i64,
    pub week_cycle: usize,
    pub today_label: String,
    pub lessons: Vec<LessonView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayView {
    pub label: String,
    pub lessons: Vec<LessonView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekView {
    pub week_label_now: String,
    pub week_label_view: String,
    pub week_index: usize,
    pub week_number: i64,
    pub week_cycle: usize,
    pub days: Vec<DayView>,
}

/// Russian weekday name; `0` and `7` both mean Sunday.
pub fn day_name(day: i64) -> &'static str {
    match day {
        1 => "Понедельник",
        2 => "Вторник",
        3 => "Среда",
        4 => "Четверг",
        5 => "Пятница",
        6 => "Суббота",
        0 | 7 => "Воскресенье",
        _ => "",
    }
}

/// "Понедельник, 09.02" or just "Понедельник".
pub fn day_label(day: i64, date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => format!("{}, {}", day_name(day), day_month(d)),
        None => day_name(day).to_string(),
    }
}

fn iso_weekday(date: NaiveDate) -> i64 {
    date.weekday().number_from_monday() as i64
}

fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|d| date.checked_add_signed(d))
}

fn offset_out_of_range(week_offset: i64) -> ScheduleError {
    ScheduleError::InvalidInput(format!("week offset {week_offset} is out of range"))
}

/// `today` moved by whole weeks.
fn shift_weeks(today: NaiveDate, week_offset: i64) -> Result<NaiveDate> {
    week_offset
        .checked_mul(7)
        .and_then(|days| add_days(today, days))
        .ok_or_else(|| offset_out_of_range(week_offset))
}

/// Monday..Sunday of the week `week_offset` weeks away from `today`.
fn week_dates(today: NaiveDate, week_offset: i64) -> Result<[NaiveDate; 7]> {
    let reference = shift_weeks(today, week_offset)?;
    let monday = add_days(reference, 1 - iso_weekday(reference)).ok_or_else(|| offset_out_of_range(week_offset))?;
    let mut dates = [monday; 7];
    for (i, slot) in dates.iter_mut().enumerate().skip(1) {
        *slot = add_days(monday, i as i64).ok_or_else(|| offset_out_of_range(week_offset))?;
    }
    Ok(dates)
}

fn render<'a>(lessons: impl Iterator<Item = &'a Lesson>) -> Vec<LessonView> {
    let mut picked: Vec<&Lesson> = lessons.collect();
    picked.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
    picked.into_iter().map(LessonView::from).collect()
}

/// Effective cyclic index: today's index (with density correction) moved by
/// the week offset.
fn effective_index(
    snapshot: &ScheduleSnapshot,
    settings: &WeekSettings,
    today: NaiveDate,
    week_offset: i64,
) -> Result<usize> {
    let base = today_week_index(&snapshot.entries, &snapshot.meta, settings, today, &snapshot.raw)?;
    let meta = &snapshot.meta;
    Ok(meta.wrap(base.index as i64 + meta.wrap(week_offset) as i64))
}

fn now_label(snapshot: &ScheduleSnapshot, index: usize) -> String {
    let upstream = snapshot.raw.week_label();
    if upstream.is_empty() {
        snapshot.meta.label(index).to_string()
    } else {
        upstream
    }
}

/// Lessons for "today", `week_offset` weeks away.
pub fn resolve_today(
    snapshot: &ScheduleSnapshot,
    settings: &WeekSettings,
    today: NaiveDate,
    week_offset: i64,
) -> Result<TodayView> {
    let week_number = linear_week_number(settings, today, week_offset)?;
    let meta = &snapshot.meta;

    if snapshot.has_dates {
        let target = shift_weeks(today, week_offset)?;
        return Ok(TodayView {
            week_label_now: String::new(),
            week_label_view: day_month(target),
            week_index: 0,
            week_number,
            week_cycle: meta.cycle,
            today_label: day_label(iso_weekday(target), Some(target)),
            lessons: render(snapshot.entries.iter().filter(|e| e.date == Some(target))),
        });
    }

    let index = effective_index(snapshot, settings, today, week_offset)?;
    let weekday = iso_weekday(today);
    let lessons = snapshot
        .entries
        .iter()
        .filter(|e| e.day == Some(weekday) && e.runs_in(meta, index));

    Ok(TodayView {
        week_label_now: now_label(snapshot, index),
        week_label_view: meta.label(index).to_string(),
        week_index: index,
        week_number,
        week_cycle: meta.cycle,
        today_label: day_label(weekday, Some(today)),
        lessons: render(lessons),
    })
}

/// Lessons for the teaching week `week_offset` weeks away, Monday..Saturday.
pub fn resolve_week(
    snapshot: &ScheduleSnapshot,
    settings: &WeekSettings,
    today: NaiveDate,
    week_offset: i64,
) -> Result<WeekView> {
    let week_number = linear_week_number(settings, today, week_offset)?;
    let meta = &snapshot.meta;
    let dates = week_dates(today, week_offset)?;
    let date_of = |day: i64| dates[(day - 1) as usize];

    if snapshot.has_dates {
        let (monday, sunday) = (dates[0], dates[6]);
        let in_week: Vec<&Lesson> = snapshot
            .entries
            .iter()
            .filter(|e| e.date.is_some_and(|d| monday <= d && d <= sunday))
            .collect();

        let days = TEACHING_DAYS
            .map(|day| {
                let date = date_of(day);
                DayView {
                    label: day_label(day, Some(date)),
                    lessons: render(in_week.iter().copied().filter(|e| e.date == Some(date))),
                }
            })
            .collect();

        return Ok(WeekView {
            week_label_now: String::new(),
            week_label_view: format!("{}–{}", day_month(monday), day_month(date_of(7))),
            week_index: 0,
            week_number,
            week_cycle: meta.cycle,
            days,
        });
    }

    let index = effective_index(snapshot, settings, today, week_offset)?;
    let days = TEACHING_DAYS
        .map(|day| DayView {
            label: day_label(day, Some(date_of(day))),
            lessons: render(
                snapshot
                    .entries
                    .iter()
                    .filter(|e| e.day == Some(day) && e.runs_in(meta, index)),
            ),
        })
        .collect();

    Ok(WeekView {
        week_label_now: now_label(snapshot, index),
        week_label_view: meta.label(index).to_string(),
        week_index: index,
        week_number,
        week_cycle: meta.cycle,
        days,
    })
}
