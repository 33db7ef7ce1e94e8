use serde::Deserialize;

/// Main configuration structure for Paper-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawl engine behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of detail pages fetched at once within one crawl
    #[serde(rename = "detail-concurrency")]
    pub detail_concurrency: u32,

    /// Upper bound on listing pages visited in one crawl
    #[serde(rename = "max-listing-pages", default = "default_max_listing_pages")]
    pub max_listing_pages: u32,

    /// Minimum time between requests to the same host (milliseconds)
    #[serde(rename = "minimum-request-interval")]
    pub minimum_request_interval: u64,
}

/// Retry and timeout policy for single page fetches
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Total attempts per fetch, including the first one
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(rename = "initial-backoff", default = "default_initial_backoff")]
    pub initial_backoff: u64,

    /// Ceiling for the retry delay (milliseconds)
    #[serde(rename = "max-backoff", default = "default_max_backoff")]
    pub max_backoff: u64,

    #[serde(rename = "backoff-multiplier", default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            max_attempts: default_max_attempts(),
            initial_backoff: default_initial_backoff(),
            max_backoff: default_max_backoff(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Headless browser configuration for JavaScript-rendered venues
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Whether browser rendering is available at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum browser tabs open at once, shared by all crawls
    #[serde(rename = "pool-size", default = "default_pool_size")]
    pub pool_size: u32,

    /// How long to wait for a page's ready marker (seconds)
    #[serde(rename = "ready-timeout", default = "default_ready_timeout")]
    pub ready_timeout: u64,

    #[serde(default = "default_true")]
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pool_size: default_pool_size(),
            ready_timeout: default_ready_timeout(),
            headless: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite corpus database
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory for JSON partition exports
    #[serde(rename = "export-dir", default = "default_export_dir")]
    pub export_dir: String,
}

fn default_max_listing_pages() -> u32 {
    200
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    1000
}

fn default_max_backoff() -> u64 {
    10_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_pool_size() -> u32 {
    2
}

fn default_ready_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_export_dir() -> String {
    "./data".to_string()
}
