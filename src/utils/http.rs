// src/utils/http.rs

//! HTTP client utilities.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use scraper::Html;

use crate::error::{AppError, Result};
use crate::models::HttpConfig;

/// A fully read HTTP response.
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    /// Header names are lowercase
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the body as an HTML document.
    pub fn html(&self) -> Html {
        Html::parse_document(&self.text())
    }
}

/// Network access used by the fetch strategies.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET a URL; fails on transport errors and non-2xx statuses.
    async fn get(&self, url: &str) -> Result<FetchResponse>;

    /// HEAD a URL following redirects and return where it ended up.
    async fn resolve(&self, url: &str) -> Result<String>;
}

/// `reqwest`-backed fetcher.
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a configured asynchronous HTTP client.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::network(url, e))?;

        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::network(url, e))?
            .to_vec();

        Ok(FetchResponse {
            url: final_url,
            status,
            headers,
            body,
        })
    }

    async fn resolve(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| AppError::network(url, e))?;
        Ok(response.url().to_string())
    }
}

/// Bounded exponential backoff for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &HttpConfig) -> Self {
        Self {
            max_attempts: config.feed_retries.max(1),
            base_delay: Duration::from_millis(config.feed_backoff_ms),
        }
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&HttpConfig::default())
    }
}

/// GET with retries on transient failures.
pub async fn get_with_retry(
    fetcher: &dyn Fetcher,
    url: &str,
    policy: &RetryPolicy,
) -> Result<FetchResponse> {
    let mut attempt = 0;
    loop {
        match fetcher.get(url).await {
            Ok(response) => return Ok(response),
            Err(e) if e.is_transient() && attempt + 1 < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                log::debug!(
                    "Attempt {} for {} failed ({}); retrying in {:?}",
                    attempt + 1,
                    url,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
