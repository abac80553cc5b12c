//! Upstream body decoding and cookie-challenge handling.
//!
//! The endpoint sometimes answers the first POST with a small HTML/JS page
//! that sets a `wl=` cookie instead of JSON. Replaying the request with that
//! cookie yields the real payload.

use miet_core::RawPayload;
use once_cell::sync::Lazy;
use regex::Regex;

static COOKIE_WITH_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"wl=[^;]+;path=/").expect("cookie regex"));
static COOKIE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"wl=[^;]+").expect("cookie regex"));

/// Strip a UTF-8 BOM and surrounding whitespace, then parse JSON.
pub fn decode_payload(body: &str) -> serde_json::Result<RawPayload> {
    let trimmed = body.trim_start_matches('\u{feff}').trim();
    serde_json::from_str(trimmed).map(RawPayload::new)
}

/// The `wl=` challenge cookie, from `Set-Cookie` headers first, then the body.
/// Always returned with a `;path=/` suffix.
pub fn extract_cookie(body: &str, set_cookies: &[String]) -> Option<String> {
    if let Some(header) = set_cookies.iter().find(|v| v.contains("wl=")) {
        let first = header.split(';').next().unwrap_or(header);
        return Some(format!("{first};path=/"));
    }
    if let Some(m) = COOKIE_WITH_PATH_RE.find(body) {
        return Some(m.as_str().to_string());
    }
    COOKIE_RE.find(body).map(|m| format!("{};path=/", m.as_str()))
}
