//! Page fetching over HTTP.
//!
//! This module defines the fetch collaborator contract used by the
//! pipeline: a single GET returning the status code, reason phrase, and
//! body. [`HttpFetcher`] is the reqwest-backed implementation; tests
//! substitute stub implementations of [`PageFetcher`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::{LegibleError, Result};

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Connection timeout in seconds.
    pub connect_timeout: u64,
    /// Read timeout in seconds.
    pub read_timeout: u64,
    /// Fixed identifying User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: 10,
            read_timeout: 30,
            user_agent: "Mozilla/5.0 (compatible; LegibleBot/1.0)".to_string(),
        }
    }
}

/// A fetched HTTP response, reduced to what the pipeline consumes.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase for the status code.
    pub reason: String,
    /// Response body decoded as text.
    pub body: String,
}

/// The fetch seam of the pipeline.
///
/// One GET per call, no internal retries. Implementations surface
/// transport failures as errors and leave status-code policy to the
/// caller.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, config: &FetchConfig) -> Result<FetchedPage>;
}

/// reqwest-backed [`PageFetcher`].
///
/// TLS follows the URL scheme; redirects follow the client's standard
/// policy, and the returned status is the final response's.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher;

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, config: &FetchConfig) -> Result<FetchedPage> {
        fetch_page(url, config).await
    }
}

/// Fetches a page with a single GET request.
///
/// Timeouts map to [`LegibleError::Timeout`]; other transport failures
/// wrap the underlying client error.
pub async fn fetch_page(url: &Url, config: &FetchConfig) -> Result<FetchedPage> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .read_timeout(Duration::from_secs(config.read_timeout))
        .build()
        .map_err(LegibleError::HttpError)?;

    let response = client
        .get(url.clone())
        .header("User-Agent", &config.user_agent)
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                LegibleError::Timeout { timeout: config.read_timeout }
            } else {
                LegibleError::HttpError(e)
            }
        })?;

    let status = response.status();
    let reason = status.canonical_reason().unwrap_or("Unknown Status").to_string();
    let body = response.text().await?;

    Ok(FetchedPage { status: status.as_u16(), reason, body })
}
