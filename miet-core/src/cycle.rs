//! Week-cycle detection.
//!
//! The upstream tags each lesson with a raw week number (`DayNumber`). The
//! set of distinct tags tells us how many alternating weeks the institution
//! runs and how to align the tags to a zero-based index.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::lesson::Lesson;

pub const FOUR_WEEK_LABELS: [&str; 4] = ["1 числитель", "1 знаменатель", "2 числитель", "2 знаменатель"];
pub const TWO_WEEK_LABELS: [&str; 2] = ["числитель", "знаменатель"];
pub const SINGLE_WEEK_LABEL: &str = "Неделя";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleMeta {
    /// Number of alternating weeks, always >= 1.
    pub cycle: usize,
    /// Added to a raw week tag before reducing modulo `cycle`.
    pub shift: i64,
    /// One display label per cycle index.
    pub labels: Vec<String>,
}

impl CycleMeta {
    /// Zero-based index for a raw upstream week tag.
    pub fn index_of(&self, raw_week: i64) -> usize {
        let cycle = self.cycle as i64;
        (raw_week.rem_euclid(cycle) + self.shift.rem_euclid(cycle)).rem_euclid(cycle) as usize
    }

    /// Reduce any signed week count into `0..cycle`.
    pub fn wrap(&self, value: i64) -> usize {
        value.rem_euclid(self.cycle as i64) as usize
    }

    pub fn label(&self, index: usize) -> &str {
        self.labels.get(index).map(String::as_str).unwrap_or_default()
    }
}

impl Default for CycleMeta {
    fn default() -> Self {
        Self {
            cycle: 1,
            shift: 0,
            labels: vec![SINGLE_WEEK_LABEL.to_string()],
        }
    }
}

/// Infer the cycle from the distinct raw week tags present in `entries`.
///
/// The shift is only inferred when the tags form a contiguous run starting at
/// their minimum; otherwise they are taken as already zero-based.
pub fn detect_cycle(entries: &[Lesson]) -> CycleMeta {
    let weeks: BTreeSet<i64> = entries.iter().filter_map(|e| e.week).collect();
    let Some(&min) = weeks.first() else {
        return CycleMeta::default();
    };

    let cycle = weeks.len();
    let shift = min
        .checked_add(cycle as i64)
        .filter(|&end| weeks.iter().copied().eq(min..end))
        .and_then(|_| min.checked_neg())
        .unwrap_or(0);

    let labels = match cycle {
        4 => FOUR_WEEK_LABELS.iter().map(|s| s.to_string()).collect(),
        2 => TWO_WEEK_LABELS.iter().map(|s| s.to_string()).collect(),
        n => (1..=n).map(|i| format!("{SINGLE_WEEK_LABEL} {i}")).collect(),
    };

    CycleMeta { cycle, shift, labels }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weeks(tags: &[i64]) -> Vec<Lesson> {
        tags.iter().map(|&w| Lesson::new("x").in_week(w)).collect()
    }

    #[test]
    fn no_week_tags() {
        let meta = detect_cycle(&[Lesson::new("x")]);
        assert_eq!(meta, CycleMeta::default());
        assert_eq!(meta.labels, vec!["Неделя"]);
    }

    #[test]
    fn four_week_cycle_from_three() {
        let meta = detect_cycle(&weeks(&[3, 4, 5, 6, 4, 3]));
        assert_eq!(meta.cycle, 4);
        assert_eq!(meta.shift, -3);
        let idx: Vec<usize> = (3..=6).map(|w| meta.index_of(w)).collect();
        assert_eq!(idx, vec![0, 1, 2, 3]);
        assert_eq!(meta.label(3), "2 знаменатель");
    }

    #[test]
    fn two_week_cycle_from_one() {
        let meta = detect_cycle(&weeks(&[1, 2, 2]));
        assert_eq!(meta.cycle, 2);
        assert_eq!(meta.shift, -1);
        assert_eq!(meta.labels, vec!["числитель", "знаменатель"]);
    }

    #[test]
    fn zero_based_tags_need_no_shift() {
        let meta = detect_cycle(&weeks(&[0, 1, 2, 3]));
        assert_eq!((meta.cycle, meta.shift), (4, 0));
    }

    #[test]
    fn non_contiguous_keeps_zero_shift() {
        let meta = detect_cycle(&weeks(&[2, 4]));
        assert_eq!((meta.cycle, meta.shift), (2, 0));
        assert_eq!(meta.index_of(2), 0);
        assert_eq!(meta.index_of(4), 0);
    }

    #[test]
    fn uncommon_cycle_gets_synthetic_labels() {
        let meta = detect_cycle(&weeks(&[1, 2, 3]));
        assert_eq!(meta.cycle, 3);
        assert_eq!(meta.labels, vec!["Неделя 1", "Неделя 2", "Неделя 3"]);
    }

    #[test]
    fn extreme_tags_do_not_overflow() {
        let meta = detect_cycle(&weeks(&[i64::MAX - 1, i64::MAX]));
        assert_eq!((meta.cycle, meta.shift), (2, 0));
        assert!(meta.index_of(i64::MAX) < 2);

        let meta = detect_cycle(&weeks(&[i64::MIN, i64::MIN + 1]));
        assert_eq!((meta.cycle, meta.shift), (2, 0));
        assert!(meta.index_of(i64::MIN) < 2);

        let meta = detect_cycle(&weeks(&[1, i64::MAX]));
        assert_eq!(meta.index_of(1), 1);
    }

    #[test]
    fn detection_is_idempotent() {
        let entries = weeks(&[5, 3, 4, 6]);
        assert_eq!(detect_cycle(&entries), detect_cycle(&entries));
    }
}
