//! miet-core: schedule normalization and week-cycle resolution for the MIET timetable feed

pub mod cache;
pub mod cycle;
pub mod denylist;
pub mod error;
pub mod lesson;
pub mod normalize;
pub mod payload;
pub mod query;
pub mod subject;
pub mod temporal;
pub mod time;
pub mod week;

pub use cache::TtlCache;
pub use cycle::{detect_cycle, CycleMeta};
pub use denylist::{DenyRule, Denylist};
pub use error::{Result, ScheduleError};
pub use lesson::{Lesson, LessonView};
pub use normalize::{normalize_entry, parse_entries};
pub use payload::RawPayload;
pub use query::{resolve_today, resolve_week, DayView, ScheduleSnapshot, TodayView, WeekView};
pub use subject::split_subject;
pub use temporal::{entry_date, extract_date, extract_time};
pub use week::{
    density_index, linear_week_number, override_index, resolve_week_index, today_week_index,
    WeekResolution, WeekSettings, WeekSource,
};
