use miet_core::ScheduleError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    /// Transport failure or non-success HTTP status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Body was not JSON even after the cookie retry.
    #[error("Failed to decode schedule JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// Body was not JSON and carried no cookie challenge to answer.
    #[error("Unexpected upstream response: no JSON and no `wl` cookie challenge")]
    UnexpectedResponse,

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}
