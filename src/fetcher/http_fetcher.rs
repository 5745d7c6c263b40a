use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    RETRY_AFTER,
};
use reqwest::{Client, StatusCode};

use crate::app::{Result, TributaryError};
use crate::domain::{FetchOutcome, FreshnessEntry};
use crate::fetcher::headers::{http_date, next_after_max_age, retry_after};
use crate::fetcher::Fetcher;
use crate::store::BodyCache;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = concat!("tributary/", env!("CARGO_PKG_VERSION"));
pub const ACCEPT_FEEDS: &str =
    "application/rss+xml, application/atom+xml, application/xml, application/json, text/xml";

/// Conditional GET client. Successful bodies land in the [`BodyCache`].
///
/// Compressed responses (`br`, `gzip`) are decoded by the client itself,
/// which also advertises both in `Accept-Encoding`.
pub struct HttpFetcher {
    client: Client,
    cache: Arc<BodyCache>,
}

impl HttpFetcher {
    pub fn new(cache: Arc<BodyCache>) -> Result<Self> {
        Self::with_options(cache, DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)
    }

    pub fn with_options(cache: Arc<BodyCache>, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client, cache })
    }

    fn request_headers(entry: &FreshnessEntry) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_FEEDS));

        if !entry.validation_token.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&entry.validation_token) {
                headers.insert(IF_NONE_MATCH, value);
            }
        }

        if entry.has_been_fetched() {
            if let Ok(value) = HeaderValue::from_str(&http_date(entry.last_fetch)) {
                headers.insert(IF_MODIFIED_SINCE, value);
            }
        }

        headers
    }
}

fn header<'a>(headers: &'a HeaderMap, name: reqwest::header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn poll(&self, entry: &FreshnessEntry, now: DateTime<Utc>) -> Result<FetchOutcome> {
        if entry.is_backing_off(now) {
            tracing::debug!(url = %entry.url, fetch_after = %entry.fetch_after, "Skipping feed in backoff window");
            return Ok(FetchOutcome::skipped());
        }

        let response = self
            .client
            .get(&entry.url)
            .headers(Self::request_headers(entry))
            .send()
            .await
            .map_err(TributaryError::from_request)?;

        let status = response.status();
        let headers = response.headers();

        match status {
            StatusCode::NOT_MODIFIED => {
                tracing::debug!(url = %entry.url, "Feed not modified");
                Ok(FetchOutcome::unchanged(next_after_max_age(
                    header(headers, CACHE_CONTROL),
                    now,
                )))
            }
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
                let next = retry_after(header(headers, RETRY_AFTER), now);
                tracing::warn!(url = %entry.url, %status, retry_at = %next, "Feed asked us to back off");
                Ok(FetchOutcome::unchanged(next))
            }
            StatusCode::OK => {
                let validation_token = header(headers, ETAG).unwrap_or_default().to_string();
                let next = next_after_max_age(header(headers, CACHE_CONTROL), now);
                let body = response.bytes().await.map_err(TributaryError::from_request)?;
                self.cache.write(&entry.url, &body).await?;
                tracing::debug!(url = %entry.url, bytes = body.len(), "Feed body updated");
                Ok(FetchOutcome {
                    changed: true,
                    validation_token,
                    next_fetch_after: Some(next),
                })
            }
            other => Err(TributaryError::UnexpectedStatus(other.as_u16())),
        }
    }
}
