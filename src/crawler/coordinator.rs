//! Harvest coordinator - main orchestration logic
//!
//! This module ties the two stages together:
//! - Validating configuration before any network activity
//! - Running listing discovery sequentially
//! - Fanning detail fetches out under the shared concurrency gate
//! - Waiting for every fetch to settle and keeping only the successes

use crate::config::{validate, Config};
use crate::crawler::discovery::{DiscoveryReport, ListingDiscovery};
use crate::crawler::fetcher::{build_http_client, DetailFetcher, RetryPolicy};
use crate::crawler::gate::ConcurrencyGate;
use crate::crawler::types::{
    search_terms, CandidateSet, FetchFailure, FetchOutcome, Posting, SearchTerm,
};
use crate::output::RunStatistics;
use crate::url::parse_endpoint;
use crate::HarvestError;
use chrono::Utc;
use tokio::task::JoinSet;

/// Counts of fetch outcomes for one fan-out
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchTally {
    pub succeeded: usize,
    pub empty: usize,
    pub failed: usize,
}

impl FetchTally {
    fn record(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Success(_) => self.succeeded += 1,
            FetchOutcome::Empty => self.empty += 1,
            FetchOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.empty + self.failed
    }
}

/// Everything a finished harvest produced
#[derive(Debug)]
pub struct HarvestReport {
    /// Successfully extracted postings, in no particular order
    pub postings: Vec<Posting>,

    /// Counters for the whole run
    pub stats: RunStatistics,
}

/// Main harvest coordinator structure
pub struct Coordinator {
    terms: Vec<SearchTerm>,
    discovery: ListingDiscovery,
    fetcher: DetailFetcher,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Validates the configuration and builds the shared HTTP client and
    /// gate. Nothing touches the network here.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - Invalid configuration or client setup failure
    pub fn new(config: &Config) -> Result<Self, HarvestError> {
        validate(config)?;

        let listing_base = parse_endpoint(&config.endpoints.listing_url)?;
        let detail_base = parse_endpoint(&config.endpoints.detail_url)?;
        let client = build_http_client(&config.fetch)?;
        let timeout = config.fetch.request_timeout();

        let discovery = ListingDiscovery::new(
            client.clone(),
            listing_base,
            config.search.pages,
            config.search.page_size,
            timeout,
        );

        let gate = ConcurrencyGate::new(config.fetch.max_concurrent_requests as usize);
        let fetcher = DetailFetcher::new(
            client,
            gate,
            RetryPolicy::from_config(&config.fetch),
            detail_base,
            timeout,
        );

        Ok(Self {
            terms: search_terms(&config.search.keywords, &config.search.locations),
            discovery,
            fetcher,
        })
    }

    /// The keyword × location pairs this coordinator will walk
    pub fn search_terms(&self) -> &[SearchTerm] {
        &self.terms
    }

    /// The gate shared by every detail fetch
    pub fn gate(&self) -> &ConcurrencyGate {
        self.fetcher.gate()
    }

    /// Runs discovery followed by the detail fan-out
    ///
    /// Individual page and candidate failures never abort the run; they
    /// show up only in the returned statistics.
    pub async fn run(&self) -> HarvestReport {
        let started_at = Utc::now();
        tracing::info!(
            "Starting harvest: {} search terms, gate limit {}",
            self.terms.len(),
            self.gate().limit()
        );

        let DiscoveryReport {
            candidates,
            pages_fetched,
            pages_failed,
        } = self.discovery.discover(&self.terms).await;
        let candidate_count = candidates.len();

        tracing::info!("Scraping {} individual job postings", candidate_count);
        let (postings, tally) = self.fetch_all(candidates).await;

        let stats = RunStatistics {
            started_at,
            finished_at: Utc::now(),
            search_terms: self.terms.len(),
            listing_pages_fetched: pages_fetched,
            listing_pages_failed: pages_failed,
            candidates: candidate_count,
            succeeded: tally.succeeded,
            empty: tally.empty,
            failed: tally.failed,
            peak_in_flight: self.gate().peak(),
        };
        stats.log_summary();

        HarvestReport { postings, stats }
    }

    /// Fetches every candidate concurrently and keeps the successes
    ///
    /// One task per candidate is spawned onto a `JoinSet`; all of them
    /// compete for the same gate. The coordinator is the only writer of the
    /// result collection, receiving outcomes as tasks finish.
    pub async fn fetch_all(&self, candidates: CandidateSet) -> (Vec<Posting>, FetchTally) {
        let mut tasks = JoinSet::new();
        for id in candidates {
            let fetcher = self.fetcher.clone();
            tasks.spawn(async move { fetcher.fetch(id).await });
        }

        let mut postings = Vec::new();
        let mut tally = FetchTally::default();

        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.unwrap_or_else(|e| {
                tracing::error!("Fetch task did not complete: {}", e);
                FetchOutcome::Failed(FetchFailure::TaskAborted(e.to_string()))
            });

            tally.record(&outcome);
            if let Some(posting) = outcome.into_posting() {
                postings.push(posting);
            }
        }

        tracing::info!(
            "Detail fetch finished: {} succeeded, {} empty, {} failed",
            tally.succeeded,
            tally.empty,
            tally.failed
        );

        (postings, tally)
    }
}

/// Runs a complete harvest from a validated configuration
///
/// # Example
///
/// ```no_run
/// use posting_harvester::config::load_config;
/// use posting_harvester::crawler::run_harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let report = run_harvest(&config).await?;
/// println!("{} postings", report.postings.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: &Config) -> Result<HarvestReport, HarvestError> {
    let coordinator = Coordinator::new(config)?;
    Ok(coordinator.run().await)
}
