//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the HTTP client with the configured user agent
//! - Single GETs bounded by a per-attempt deadline
//! - Detail page retrieval with retry, exponential backoff, and jitter
//! - Response classification into retryable and terminal failures

use crate::config::FetchConfig;
use crate::crawler::gate::ConcurrencyGate;
use crate::crawler::parser::extract_posting;
use crate::crawler::types::{CandidateId, FetchFailure, FetchOutcome};
use crate::state::FetchState;
use crate::url::detail_url;
use crate::HarvestError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// The client-level timeout mirrors the per-attempt deadline so a stalled
/// body read cannot outlive it.
///
/// # Example
///
/// ```no_run
/// use posting_harvester::config::FetchConfig;
/// use posting_harvester::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.request_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one page body, requiring HTTP 200
///
/// The deadline covers connecting, sending, and reading the full body.
///
/// # Returns
///
/// * `Ok(String)` - The response body
/// * `Err(HarvestError::Status)` - Any status other than 200
/// * `Err(HarvestError::Timeout)` - Deadline exceeded
/// * `Err(HarvestError::Http)` - Transport-level failure
pub async fn get_page(client: &Client, url: &Url, deadline: Duration) -> Result<String, HarvestError> {
    match tokio::time::timeout(deadline, send_and_read(client, url)).await {
        Ok(result) => result,
        Err(_) => Err(HarvestError::Timeout {
            url: url.to_string(),
        }),
    }
}

async fn send_and_read(client: &Client, url: &Url) -> Result<String, HarvestError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| transport_error(url, e))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(HarvestError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| transport_error(url, e))
}

fn transport_error(url: &Url, source: reqwest::Error) -> HarvestError {
    if source.is_timeout() {
        HarvestError::Timeout {
            url: url.to_string(),
        }
    } else {
        HarvestError::Http {
            url: url.to_string(),
            source,
        }
    }
}

/// Retry budget and backoff schedule for detail fetches
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per candidate, including the first
    pub max_attempts: u32,

    /// Delay before the first retry; doubled for each later one
    pub base_delay: Duration,

    /// Upper bound of the uniform jitter added to every delay
    pub max_jitter: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: config.base_backoff(),
            max_jitter: config.max_jitter(),
        }
    }

    /// Non-jittered backoff after the given zero-based attempt: `base * 2^attempt`
    pub fn base_backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Full backoff delay: `base * 2^attempt + uniform(0, max_jitter)`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_backoff(attempt) + self.jitter()
    }

    fn jitter(&self) -> Duration {
        if self.max_jitter.is_zero() {
            return Duration::ZERO;
        }
        self.max_jitter.mul_f64(rand::random::<f64>())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Classification of one attempt's result
#[derive(Debug)]
enum AttemptResult {
    /// HTTP 200 with the page body
    Document(String),

    /// Rate limited, timed out, or transport failure
    Retryable(String),

    /// Any other status; not worth another attempt
    Terminal(u16),
}

impl From<Result<String, HarvestError>> for AttemptResult {
    fn from(result: Result<String, HarvestError>) -> Self {
        match result {
            Ok(body) => Self::Document(body),
            Err(HarvestError::Status { status, .. })
                if status == StatusCode::TOO_MANY_REQUESTS.as_u16() =>
            {
                Self::Retryable(format!("HTTP {}", status))
            }
            Err(HarvestError::Status { status, .. }) => Self::Terminal(status),
            Err(HarvestError::Timeout { .. }) => Self::Retryable("request timeout".to_string()),
            Err(e) => Self::Retryable(e.to_string()),
        }
    }
}

/// Tracks a candidate's position in the fetch state machine
struct FetchProgress<'a> {
    id: &'a CandidateId,
    state: FetchState,
}

impl<'a> FetchProgress<'a> {
    fn new(id: &'a CandidateId) -> Self {
        Self {
            id,
            state: FetchState::Pending,
        }
    }

    fn advance(&mut self, next: FetchState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid fetch transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!("Candidate {}: {} -> {}", self.id, self.state, next);
        self.state = next;
    }
}

/// Retrieves detail pages for single candidates
///
/// Cheap to clone; every clone shares the same client and gate.
#[derive(Debug, Clone)]
pub struct DetailFetcher {
    client: Client,
    gate: ConcurrencyGate,
    policy: RetryPolicy,
    detail_base: Url,
    timeout: Duration,
}

impl DetailFetcher {
    pub fn new(
        client: Client,
        gate: ConcurrencyGate,
        policy: RetryPolicy,
        detail_base: Url,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            gate,
            policy,
            detail_base,
            timeout,
        }
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Fetches one candidate's detail page to a terminal outcome
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 200, title present | Success |
    /// | HTTP 200, no title | Empty, no retry |
    /// | HTTP 429 | Backoff, retry while budget remains |
    /// | Timeout / transport error | Backoff, retry while budget remains |
    /// | Any other status | Failed immediately |
    ///
    /// The gate slot is held only while a request is in flight; it is
    /// released before every backoff sleep and reacquired for the next
    /// attempt.
    pub async fn fetch(&self, id: CandidateId) -> FetchOutcome {
        let url = match detail_url(&self.detail_base, &id) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot build detail URL for {}: {}", id, e);
                return FetchOutcome::Failed(FetchFailure::InvalidUrl(e.to_string()));
            }
        };

        let mut progress = FetchProgress::new(&id);
        let mut last_error = String::new();

        for attempt in 0..self.policy.max_attempts {
            progress.advance(FetchState::Attempting);

            let result: AttemptResult = {
                let Some(_permit) = self.gate.acquire().await else {
                    progress.advance(FetchState::ExhaustedRetries);
                    return FetchOutcome::Failed(FetchFailure::GateClosed);
                };
                tracing::debug!(
                    "{} - attempt {}/{}",
                    url,
                    attempt + 1,
                    self.policy.max_attempts
                );
                get_page(&self.client, &url, self.timeout).await.into()
            };

            match result {
                AttemptResult::Document(body) => {
                    return match extract_posting(&body) {
                        Some(mut posting) => {
                            progress.advance(FetchState::Succeeded);
                            posting.job_posting_link = url.to_string();
                            tracing::info!("{} - Successfully scraped posting", url);
                            FetchOutcome::Success(posting)
                        }
                        None => {
                            progress.advance(FetchState::EmptyResult);
                            tracing::warn!("{} - No usable content on page", url);
                            FetchOutcome::Empty
                        }
                    };
                }
                AttemptResult::Terminal(status) => {
                    progress.advance(FetchState::ExhaustedRetries);
                    tracing::warn!("{} - HTTP {}, not retrying", url, status);
                    return FetchOutcome::Failed(FetchFailure::Status(status));
                }
                AttemptResult::Retryable(reason) => {
                    if attempt + 1 < self.policy.max_attempts {
                        progress.advance(FetchState::RetryWait);
                        let delay = self.policy.backoff_delay(attempt);
                        tracing::warn!(
                            "{} - attempt {} failed ({}), retrying in {:?}",
                            url,
                            attempt + 1,
                            reason,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = reason;
                }
            }
        }

        progress.advance(FetchState::ExhaustedRetries);
        tracing::warn!(
            "{} - giving up after {} attempts: {}",
            url,
            self.policy.max_attempts,
            last_error
        );
        FetchOutcome::Failed(FetchFailure::Exhausted {
            attempts: self.policy.max_attempts,
            last_error,
        })
    }
}
