//! Raw upstream record → [`Lesson`].
//!
//! Expected record shape (all fields optional):
//!   { "Day": 1, "DayNumber": 0,
//!     "Time": { "Time": "1 пара", "TimeFrom": "...", "TimeTo": "..." },
//!     "Class": { "Name": "Физика [Лек]", "TeacherFull": "..." },
//!     "Room": { "Name": "3204" } }

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::denylist::Denylist;
use crate::error::Result;
use crate::lesson::Lesson;
use crate::payload::{as_int, field, path, text, RawPayload};
use crate::subject::split_subject;
use crate::temporal::{entry_date, extract_time};

static SLOT_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*пара\s*$").expect("slot suffix regex"));

/// Normalize a single record. Never fails; missing fields become empty/absent.
pub fn normalize_entry(item: &Value) -> Lesson {
    let time_block = field(item, "Time");
    let slot_raw = text(time_block.and_then(|t| field(t, "Time")));
    let (subject, lesson_type) = split_subject(&text(path(item, &["Class", "Name"])));

    Lesson {
        day: as_int(field(item, "Day")),
        week: as_int(field(item, "DayNumber")),
        slot: SLOT_SUFFIX_RE.replace(slot_raw.trim(), "").into_owned(),
        start: extract_time(time_block.and_then(|t| field(t, "TimeFrom"))),
        end: extract_time(time_block.and_then(|t| field(t, "TimeTo"))),
        subject,
        lesson_type,
        teacher: text(path(item, &["Class", "TeacherFull"])),
        room: text(path(item, &["Room", "Name"])),
        date: entry_date(item),
    }
}

/// Normalize every record under `Data`, dropping denylisted entries.
pub fn parse_entries(payload: &RawPayload, denylist: &Denylist) -> Result<Vec<Lesson>> {
    let items = payload.entries()?;
    let mut out = Vec::with_capacity(items.len());

    for item in items {
        let lesson = normalize_entry(item);
        if denylist.is_denied(&lesson) {
            debug!(subject = %lesson.subject, room = %lesson.room, "dropping denylisted entry");
            continue;
        }
        out.push(lesson);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn full_record() {
        let item = json!({
            "Day": 2,
            "DayNumber": "1",
            "Time": {"Time": "3 пара", "TimeFrom": "0001-01-01T12:00:00", "TimeTo": "0001-01-01T13:20:00"},
            "Class": {"Name": "Базы данных [Лаб]", "TeacherFull": "Иванов Иван Иванович"},
            "Room": {"Name": "3204"}
        });
        let l = normalize_entry(&item);
        assert_eq!(l.day, Some(2));
        assert_eq!(l.week, Some(1));
        assert_eq!(l.slot, "3");
        assert_eq!((l.start.as_str(), l.end.as_str()), ("12:00", "13:20"));
        assert_eq!(l.subject, "Базы данных");
        assert_eq!(l.lesson_type, "Лаб");
        assert_eq!(l.teacher, "Иванов Иван Иванович");
        assert_eq!(l.room, "3204");
        assert_eq!(l.date, None);
    }

    #[test]
    fn sparse_record() {
        let l = normalize_entry(&json!({"Class": null, "Time": {"Time": " 5 ПАРА "}}));
        assert_eq!(l.day, None);
        assert_eq!(l.week, None);
        assert_eq!(l.slot, "5");
        assert_eq!(l.subject, "");
        assert_eq!(l.start, "");
    }

    #[test]
    fn dated_record() {
        let l = normalize_entry(&json!({"Date": "2026-02-09T00:00:00", "Day": 1}));
        assert_eq!(l.date, NaiveDate::from_ymd_opt(2026, 2, 9));
    }

    #[test]
    fn denylisted_entries_dropped() {
        let payload = RawPayload::new(json!({"Data": [
            {"Day": 1, "Class": {"Name": "Физика"}, "Room": {"Name": "1204"}},
            {"Day": 1, "Class": {"Name": "Финансовая грамотность в условиях цифровой экономики [Лек]"},
             "Room": {"Name": "Виртуальная аудитория 1"}},
        ]}));
        let entries = parse_entries(&payload, &Denylist::default()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].subject, "Физика");

        let entries = parse_entries(&payload, &Denylist::empty()).unwrap();
        assert_eq!(entries.len(), 2);
    }
}
