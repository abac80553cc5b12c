//! Lesson model: one upstream timetable record after normalization.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cycle::CycleMeta;

/// Room marker the upstream uses for remote lessons.
pub const VIRTUAL_ROOM_MARKER: &str = "Виртуальная аудитория";

/// Display label substituted for virtual rooms.
pub const ONLINE_LABEL: &str = "Онлайн";

/// Normalized lesson.
///
/// Note: `day` is kept as the upstream sends it (1 = Monday .. 6 = Saturday),
/// which is the same numbering as `chrono::Weekday::number_from_monday`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub day: Option<i64>,
    /// Raw upstream week tag, before cycle alignment.
    pub week: Option<i64>,
    /// Period label, e.g. "1", "2". Compared as a string.
    pub slot: String,
    pub start: String,
    pub end: String,
    pub subject: String,
    pub lesson_type: String,
    pub teacher: String,
    pub room: String,
    pub date: Option<NaiveDate>,
}

impl Lesson {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            day: None,
            week: None,
            slot: String::new(),
            start: String::new(),
            end: String::new(),
            subject: subject.into(),
            lesson_type: String::new(),
            teacher: String::new(),
            room: String::new(),
            date: None,
        }
    }

    pub fn on_day(mut self, day: i64) -> Self {
        self.day = Some(day);
        self
    }

    pub fn in_week(mut self, week: i64) -> Self {
        self.week = Some(week);
        self
    }

    pub fn at_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = slot.into();
        self
    }

    pub fn with_times(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start = start.into();
        self.end = end.into();
        self
    }

    pub fn in_room(mut self, room: impl Into<String>) -> Self {
        self.room = room.into();
        self
    }

    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Zero-based cycle index, `None` for lessons without a week tag
    /// (those run every week).
    pub fn cycle_index(&self, meta: &CycleMeta) -> Option<usize> {
        self.week.map(|w| meta.index_of(w))
    }

    /// Whether this lesson runs in the week with the given cycle index.
    pub fn runs_in(&self, meta: &CycleMeta, index: usize) -> bool {
        self.cycle_index(meta).is_none_or(|i| i == index)
    }

    /// Sort key: slot then start time, both as plain strings.
    pub fn order_key(&self) -> (&str, &str) {
        (&self.slot, &self.start)
    }
}

/// Presentation shape of a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonView {
    pub lesson: String,
    /// `start`, or `start\nend` when the end is known.
    pub time: String,
    pub subject: String,
    #[serde(rename = "type")]
    pub lesson_type: String,
    pub teacher: String,
    pub room: String,
}

impl From<&Lesson> for LessonView {
    fn from(l: &Lesson) -> Self {
        let time = if l.end.is_empty() {
            l.start.clone()
        } else {
            format!("{}\n{}", l.start, l.end)
        };
        let room = if l.room.contains(VIRTUAL_ROOM_MARKER) {
            ONLINE_LABEL.to_string()
        } else {
            l.room.clone()
        };
        Self {
            lesson: l.slot.clone(),
            time,
            subject: l.subject.clone(),
            lesson_type: l.lesson_type.clone(),
            teacher: l.teacher.clone(),
            room,
        }
    }
}
