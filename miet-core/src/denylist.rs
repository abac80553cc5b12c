//! Data-quality overrides for known mis-tagged upstream entries.
//!
//! These are corrections for one institution's current term. They are plain
//! data so a deployment can replace or clear them once the feed is fixed.

use serde::{Deserialize, Serialize};

use crate::lesson::Lesson;

const FINANCE_COURSE: &str = "Финансовая грамотность в условиях цифровой экономики";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum DenyRule {
    /// Subject and room both contain the given markers.
    SubjectInRoom { subject: String, room: String },
    /// Weekday matches exactly, slot and subject contain the given markers.
    SubjectAtSlot { day: i64, slot: String, subject: String },
}

impl DenyRule {
    pub fn matches(&self, lesson: &Lesson) -> bool {
        match self {
            DenyRule::SubjectInRoom { subject, room } => {
                lesson.subject.contains(subject.as_str()) && lesson.room.contains(room.as_str())
            }
            DenyRule::SubjectAtSlot { day, slot, subject } => {
                lesson.day == Some(*day)
                    && lesson.slot.contains(slot.as_str())
                    && lesson.subject.contains(subject.as_str())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Denylist(Vec<DenyRule>);

impl Denylist {
    pub fn new(rules: Vec<DenyRule>) -> Self {
        Self(rules)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn rules(&self) -> &[DenyRule] {
        &self.0
    }

    pub fn is_denied(&self, lesson: &Lesson) -> bool {
        self.0.iter().any(|rule| rule.matches(lesson))
    }
}

impl Default for Denylist {
    /// The finance course is mis-tagged into a virtual room and duplicated
    /// into Saturday's 8th period.
    fn default() -> Self {
        Self(vec![
            DenyRule::SubjectInRoom {
                subject: FINANCE_COURSE.to_string(),
                room: "Виртуальная аудитория 1".to_string(),
            },
            DenyRule::SubjectAtSlot {
                day: 6,
                slot: "8".to_string(),
                subject: FINANCE_COURSE.to_string(),
            },
        ])
    }
}
