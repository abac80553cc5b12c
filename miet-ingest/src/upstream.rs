//! Upstream fetch: POST the group name, get the raw schedule JSON.

use std::future::Future;

use miet_core::RawPayload;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE, ORIGIN, REFERER, SET_COOKIE, USER_AGENT};
use tracing::{debug, warn};

use crate::decode::{decode_payload, extract_cookie};
use crate::error::{IngestError, Result};
use crate::types::{UpstreamConfig, UpstreamResponse};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Anything that can produce the raw payload for a group.
pub trait ScheduleSource: Send + Sync {
    fn fetch(&self, group: &str) -> impl Future<Output = Result<RawPayload>> + Send;
}

/// HTTP client for the MIET schedule endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    fn headers(&self, cookie: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ORIGIN, HeaderValue::from_static("https://miet.ru"));
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        if let Ok(referer) = HeaderValue::from_str(&self.config.page_url) {
            headers.insert(REFERER, referer);
        }
        if let Some(value) = cookie.and_then(|c| HeaderValue::from_str(c).ok()) {
            headers.insert(COOKIE, value);
        }
        headers
    }

    async fn post(&self, group: &str, cookie: Option<&str>) -> Result<UpstreamResponse> {
        let resp = self
            .http
            .post(&self.config.data_url)
            .headers(self.headers(cookie))
            .form(&[("group", group)])
            .send()
            .await?
            .error_for_status()?;

        let set_cookies = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let bytes = resp.bytes().await?;

        Ok(UpstreamResponse {
            body: String::from_utf8_lossy(&bytes).into_owned(),
            set_cookies,
        })
    }
}

impl ScheduleSource for UpstreamClient {
    async fn fetch(&self, group: &str) -> Result<RawPayload> {
        debug!(group, url = %self.config.data_url, "requesting schedule");
        let first = self.post(group, None).await?;
        if let Ok(payload) = decode_payload(&first.body) {
            return Ok(payload);
        }

        let cookie = extract_cookie(&first.body, &first.set_cookies)
            .ok_or(IngestError::UnexpectedResponse)?;
        warn!(group, "upstream answered with a cookie challenge, retrying");

        let second = self.post(group, Some(&cookie)).await?;
        Ok(decode_payload(&second.body)?)
    }
}
