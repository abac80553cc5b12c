use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const SCHEDULE_PAGE_URL: &str = "https://www.miet.ru/schedule/";
pub const SCHEDULE_DATA_URL: &str = "https://miet.ru/schedule/data";

/// Connection settings for the upstream schedule endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub data_url: String,
    pub page_url: String,
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            data_url: SCHEDULE_DATA_URL.to_string(),
            page_url: SCHEDULE_PAGE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// One raw HTTP exchange, before decoding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpstreamResponse {
    pub body: String,
    /// Every `Set-Cookie` header value, in order.
    pub set_cookies: Vec<String>,
}
