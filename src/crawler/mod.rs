//! Crawler module for listing discovery and detail fetching
//!
//! This module contains the core harvesting logic, including:
//! - Sequential listing discovery with deduplication
//! - Detail fetching with retry, backoff, and per-attempt deadlines
//! - A shared concurrency gate bounding in-flight requests
//! - Overall harvest coordination

mod coordinator;
mod discovery;
mod fetcher;
mod gate;
mod parser;
mod types;

pub use coordinator::{run_harvest, Coordinator, FetchTally, HarvestReport};
pub use discovery::{DiscoveryReport, ListingDiscovery};
pub use fetcher::{build_http_client, get_page, DetailFetcher, RetryPolicy};
pub use gate::{ConcurrencyGate, GatePermit};
pub use parser::{extract_candidate_ids, extract_posting};
pub use types::{
    search_terms, CandidateId, CandidateSet, FetchFailure, FetchOutcome, Posting, SearchTerm,
};
