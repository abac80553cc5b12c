//! Error taxonomy for schedule resolution.
//!
//! Value-level parse failures never show up here: a malformed time or date
//! degrades to an empty/absent value so one bad record cannot block a whole
//! schedule. Only structural problems propagate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScheduleError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// A configuration value (term start, timezone, ...) is malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The upstream payload or request lacks something structural.
    #[error("Upstream data error: {0}")]
    UpstreamData(String),

    /// Invalid request parameter (e.g. a week offset outside the calendar).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
