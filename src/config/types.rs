use serde::Deserialize;
use std::time::Duration;

/// Default listing endpoint (public guest job search API)
pub const DEFAULT_LISTING_URL: &str =
    "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search";

/// Default detail endpoint; the posting id is appended as a path segment
pub const DEFAULT_DETAIL_URL: &str = "https://www.linkedin.com/jobs-guest/jobs/api/jobPosting";

/// Browser-like user agent; the guest API rejects obvious bots
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";

/// Main configuration structure for Posting-Harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// The discovery space: keywords × locations × pages
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Search keywords, combined with every location
    pub keywords: Vec<String>,

    /// Search locations, combined with every keyword
    pub locations: Vec<String>,

    /// Number of listing pages to walk per keyword/location pair
    #[serde(default = "default_pages")]
    pub pages: u32,

    /// Entries per listing page; the `start` offset advances by this much
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,
}

/// Detail fetch policy
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Maximum number of detail requests in flight at once
    #[serde(rename = "max-concurrent-requests", default = "default_concurrency")]
    pub max_concurrent_requests: u32,

    /// Attempt budget per posting, including the first attempt
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay (milliseconds), doubled on every retry
    #[serde(rename = "base-backoff-ms", default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Upper bound of the uniform random jitter added to each backoff (milliseconds)
    #[serde(rename = "max-jitter-ms", default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,

    /// Per-attempt deadline covering connect and full body read (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Remote endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// Listing search endpoint
    #[serde(rename = "listing-url", default = "default_listing_url")]
    pub listing_url: String,

    /// Detail page endpoint
    #[serde(rename = "detail-url", default = "default_detail_url")]
    pub detail_url: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV file with the harvested postings
    #[serde(rename = "csv-path", default = "default_csv_path")]
    pub csv_path: String,
}

impl FetchConfig {
    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    pub fn max_jitter(&self) -> Duration {
        Duration::from_millis(self.max_jitter_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_concurrency(),
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            max_jitter_ms: default_max_jitter_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            detail_url: default_detail_url(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
        }
    }
}

fn default_pages() -> u32 {
    10
}

fn default_page_size() -> u32 {
    10
}

fn default_concurrency() -> u32 {
    3
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_backoff_ms() -> u64 {
    1_000
}

fn default_max_jitter_ms() -> u64 {
    1_000
}

fn default_request_timeout_ms() -> u64 {
    200_000
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_listing_url() -> String {
    DEFAULT_LISTING_URL.to_string()
}

fn default_detail_url() -> String {
    DEFAULT_DETAIL_URL.to_string()
}

fn default_csv_path() -> String {
    "./data/scraped_postings.csv".to_string()
}
