//! Schema-free view over the upstream JSON document.
//!
//! The feed is not versioned and fields come and go between terms, so every
//! accessor here answers `None` instead of failing. The only structural
//! requirement is the top-level `Data` list (see [`RawPayload::entries`]).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ScheduleError};

/// Fields the upstream has been seen (or is expected) to use for the
/// current week label, in lookup order.
pub const WEEK_LABEL_FIELDS: &[&str] = &[
    "WeekName",
    "WeekLabel",
    "WeekText",
    "CurrentWeekText",
    "WeekNow",
    "Week",
    "WeekNumber",
    "WeekNum",
    "CurrentWeek",
    "WeekIndex",
    "WeekNumberNow",
    "CurrentWeekNumber",
    "WeekNumberCurrent",
];

/// Numeric-looking week fields scanned as a last resort.
pub const WEEK_NUMBER_FIELDS: &[&str] = &[
    "Week",
    "WeekNumber",
    "WeekNum",
    "CurrentWeek",
    "WeekIndex",
    "WeekNumberNow",
    "CurrentWeekNumber",
    "WeekNumberCurrent",
];

/// Raw upstream payload, kept verbatim for metadata lookups.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPayload(Value);

impl RawPayload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Top-level field, `None` when missing, null, or the payload is not an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        field(&self.0, key)
    }

    /// The timetable records under `Data`.
    pub fn entries(&self) -> Result<&[Value]> {
        self.get("Data")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                ScheduleError::UpstreamData("payload has no `Data` entry list".to_string())
            })
    }

    /// First non-null week label field, rendered as trimmed text.
    ///
    /// The first present field decides, even when its text ends up empty.
    pub fn week_label(&self) -> String {
        WEEK_LABEL_FIELDS
            .iter()
            .find_map(|key| self.get(key))
            .map(|v| text(Some(v)).trim().to_string())
            .unwrap_or_default()
    }
}

impl From<Value> for RawPayload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Object field lookup treating null as absent.
pub fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.as_object()?.get(key).filter(|v| !v.is_null())
}

/// Nested lookup: `path(item, &["Class", "Name"])`.
pub fn path<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().try_fold(value, |cur, key| field(cur, key))
}

/// Lenient integer conversion: integers, truncated floats and integer strings.
pub fn as_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Display text for a scalar; empty for null, arrays and objects.
pub fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_data_is_upstream_error() {
        let payload = RawPayload::new(json!({"Times": []}));
        assert!(matches!(payload.entries(), Err(ScheduleError::UpstreamData(_))));
    }

    #[test]
    fn nested_path_skips_nulls() {
        let item = json!({"Class": {"Name": "Физика", "TeacherFull": null}});
        assert_eq!(text(path(&item, &["Class", "Name"])), "Физика");
        assert_eq!(path(&item, &["Class", "TeacherFull"]), None);
        assert_eq!(path(&item, &["Room", "Name"]), None);
    }

    #[test]
    fn lenient_ints() {
        assert_eq!(as_int(Some(&json!(3))), Some(3));
        assert_eq!(as_int(Some(&json!(3.9))), Some(3));
        assert_eq!(as_int(Some(&json!(" 4 "))), Some(4));
        assert_eq!(as_int(Some(&json!("x"))), None);
        assert_eq!(as_int(None), None);
    }

    #[test]
    fn week_label_takes_first_present_field() {
        let payload = RawPayload::new(json!({"WeekNumber": 2, "WeekName": " 1 знаменатель "}));
        assert_eq!(payload.week_label(), "1 знаменатель");

        let payload = RawPayload::new(json!({"WeekName": null, "CurrentWeek": 3}));
        assert_eq!(payload.week_label(), "3");

        assert_eq!(RawPayload::new(json!({"Data": []})).week_label(), "");
    }
}
