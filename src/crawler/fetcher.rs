//! Page fetcher
//!
//! This module retrieves listing and detail pages for the crawl engine:
//! - Building the HTTP client with the crawler's user agent
//! - Static GET requests through `reqwest`
//! - Browser-rendered requests through the shared [`BrowserPool`]
//! - Per-host politeness and explicit retry with backoff for both modes
//! - Classifying failures as retryable or permanent

use crate::config::{Config, UserAgentConfig};
use crate::crawler::browser::BrowserPool;
use crate::crawler::politeness::Politeness;
use crate::crawler::retry::RetryPolicy;
use crate::url::extract_host;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// CSS selector that must be present before a rendered page is read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyCondition(String);

impl ReadyCondition {
    pub fn new(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// How a page has to be retrieved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderingMode {
    /// Plain HTTP GET
    Static,

    /// Loaded in a browser tab, optionally waiting for a ready marker
    BrowserRendered { ready: Option<ReadyCondition> },
}

impl RenderingMode {
    pub fn browser(selector: &str) -> Self {
        Self::BrowserRendered {
            ready: Some(ReadyCondition::new(selector)),
        }
    }
}

/// One page to retrieve
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub render: RenderingMode,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, render: RenderingMode) -> Self {
        Self {
            url: url.into(),
            render,
        }
    }
}

/// A successfully retrieved page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was requested
    pub url: String,
    /// The URL after redirects
    pub final_url: String,
    pub body: String,
}

impl FetchedPage {
    /// A page that was served from the URL it was requested at
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            body: body.into(),
        }
    }
}

/// Why a single attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("ready condition '{selector}' not met in time")]
    RenderTimeout { selector: String },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("browser rendering is disabled")]
    BrowserUnavailable,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl AttemptError {
    /// Whether another attempt may succeed
    ///
    /// | Condition | Retry |
    /// |-----------|-------|
    /// | HTTP 408, 425, 429, 5xx | yes |
    /// | Other HTTP status | no |
    /// | Transport error, timeout | yes |
    /// | Ready condition timeout, browser error | yes |
    /// | Browser disabled, invalid URL | no |
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status(code) => is_retryable_status(*code),
            Self::Transport(_) | Self::Timeout => true,
            Self::RenderTimeout { .. } | Self::Browser(_) => true,
            Self::BrowserUnavailable | Self::InvalidUrl(_) => false,
        }
    }
}

fn is_retryable_status(code: u16) -> bool {
    matches!(code, 408 | 425 | 429) || (500..600).contains(&code)
}

/// A fetch that exhausted its retry budget or failed permanently
#[derive(Debug, Clone, Error)]
#[error("Failed to fetch {url} after {attempts} attempt(s): {last_error}")]
pub struct FetchFailed {
    pub url: String,
    pub attempts: u32,
    pub last_error: AttemptError,
}

/// Retrieves pages for the crawl engine
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchFailed>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchFailed> {
        (**self).fetch(request).await
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Whole-request timeout
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use paper_harvest::config::UserAgentConfig;
/// use paper_harvest::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "PaperHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// The production fetcher: static HTTP plus optional browser rendering
///
/// Cloning is cheap and clones share the politeness limiter and browser pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    politeness: Arc<Politeness>,
    retry: RetryPolicy,
    browser: Option<Arc<BrowserPool>>,
}

impl Fetcher {
    pub fn new(client: Client, politeness: Arc<Politeness>, retry: RetryPolicy) -> Self {
        Self {
            client,
            politeness,
            retry,
            browser: None,
        }
    }

    pub fn with_browser(mut self, pool: Arc<BrowserPool>) -> Self {
        self.browser = Some(pool);
        self
    }

    /// Builds a fetcher with its own limiter and (if enabled) browser pool
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(config.fetch.request_timeout);
        let client = build_http_client(&config.user_agent, timeout)?;
        let politeness = Arc::new(Politeness::new(Duration::from_millis(
            config.crawler.minimum_request_interval,
        )));
        let fetcher = Self::new(client, politeness, RetryPolicy::from_config(&config.fetch));

        Ok(if config.browser.enabled {
            let pool = BrowserPool::new(
                config.browser.clone(),
                config.user_agent.header_value(),
                timeout,
            );
            fetcher.with_browser(Arc::new(pool))
        } else {
            fetcher
        })
    }

    async fn attempt(&self, url: &Url, render: &RenderingMode) -> Result<FetchedPage, AttemptError> {
        match render {
            RenderingMode::Static => self.fetch_static(url).await,
            RenderingMode::BrowserRendered { ready } => {
                let pool = self.browser.as_ref().ok_or(AttemptError::BrowserUnavailable)?;
                let body = pool.render(url.as_str(), ready.as_ref()).await?;
                Ok(FetchedPage {
                    url: url.to_string(),
                    final_url: url.to_string(),
                    body,
                })
            }
        }
    }

    async fn fetch_static(&self, url: &Url) -> Result<FetchedPage, AttemptError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(classify_reqwest_error)?;

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            body,
        })
    }
}

fn classify_reqwest_error(error: reqwest::Error) -> AttemptError {
    if error.is_timeout() {
        AttemptError::Timeout
    } else if let Some(status) = error.status() {
        AttemptError::Status(status.as_u16())
    } else {
        AttemptError::Transport(error.to_string())
    }
}

#[async_trait]
impl PageFetcher for Fetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchFailed> {
        let url = Url::parse(&request.url).map_err(|e| FetchFailed {
            url: request.url.clone(),
            attempts: 0,
            last_error: AttemptError::InvalidUrl(e.to_string()),
        })?;
        let host = extract_host(&url).unwrap_or_default();

        let mut attempts = 0;
        loop {
            attempts += 1;
            let granted = self.politeness.acquire(&host).await;
            tracing::trace!(url = %request.url, host = %host, granted, attempts, "Requesting page");

            let error = match self.attempt(&url, &request.render).await {
                Ok(page) => {
                    tracing::debug!(url = %request.url, attempts, "Fetched page");
                    return Ok(page);
                }
                Err(error) => error,
            };

            if !error.is_retryable() || !self.retry.should_retry(attempts) {
                tracing::warn!(url = %request.url, attempts, error = %error, "Giving up on page");
                return Err(FetchFailed {
                    url: request.url.clone(),
                    attempts,
                    last_error: error,
                });
            }

            let delay = self.retry.calculate_backoff(attempts);
            tracing::debug!(
                url = %request.url,
                attempts,
                error = %error,
                delay_ms = delay.as_millis() as u64,
                "Retrying page"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
