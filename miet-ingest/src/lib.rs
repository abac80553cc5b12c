//! miet-ingest: upstream fetch for the MIET schedule feed and cached per-group access.

pub mod decode;
pub mod error;
pub mod service;
pub mod types;
pub mod upstream;

pub use decode::{decode_payload, extract_cookie};
pub use error::{IngestError, Result};
pub use service::{ScheduleService, DEFAULT_CACHE_TTL};
pub use types::{UpstreamConfig, UpstreamResponse};
pub use upstream::{ScheduleSource, UpstreamClient};
