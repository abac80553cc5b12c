//! Split `"Алгебра [Лек]"`-style subjects into display name and lesson type.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(.+?)\]").expect("tag regex"));

/// Returns `(subject, lesson_type)`. Every bracketed tag is removed from the
/// subject; the type is the last tag's contents.
pub fn split_subject(raw: &str) -> (String, String) {
    if raw.is_empty() {
        return (String::new(), String::new());
    }

    let lesson_type = TAG_RE
        .captures_iter(raw)
        .last()
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_default();

    let stripped = TAG_RE.replace_all(raw, " ");
    let subject = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    (subject, lesson_type)
}
