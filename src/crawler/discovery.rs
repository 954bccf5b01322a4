//! Listing discovery stage
//!
//! Walks every search term and page offset one request at a time and folds
//! the identifiers it finds into a single deduplicated set. A page that
//! fails is logged and skipped; discovery itself never fails.

use crate::crawler::fetcher::get_page;
use crate::crawler::parser::extract_candidate_ids;
use crate::crawler::types::{CandidateId, CandidateSet, SearchTerm};
use crate::url::listing_url;
use crate::HarvestError;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Result of walking the whole discovery space
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Unique identifiers across all pages
    pub candidates: CandidateSet,

    /// Listing pages fetched and parsed
    pub pages_fetched: usize,

    /// Listing pages that failed and contributed nothing
    pub pages_failed: usize,
}

/// Sequential walker over listing pages
#[derive(Debug, Clone)]
pub struct ListingDiscovery {
    client: Client,
    listing_base: Url,
    pages: u32,
    page_size: u32,
    timeout: Duration,
}

impl ListingDiscovery {
    pub fn new(
        client: Client,
        listing_base: Url,
        pages: u32,
        page_size: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            listing_base,
            pages,
            page_size,
            timeout,
        }
    }

    /// Page offsets walked for every search term: `0, size, 2*size, ...`
    ///
    /// Stops early rather than wrapping if an offset would not fit in a `u32`.
    pub fn offsets(&self) -> impl Iterator<Item = u32> {
        let page_size = self.page_size;
        (0..self.pages).map_while(move |page| page.checked_mul(page_size))
    }

    /// Walks every search term × page offset in order
    ///
    /// # Arguments
    ///
    /// * `terms` - The search terms, in the order they should be walked
    ///
    /// # Returns
    ///
    /// The deduplicated candidate set plus page counters. Failed pages are
    /// counted, never propagated.
    pub async fn discover(&self, terms: &[SearchTerm]) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        for term in terms {
            tracing::info!("Scraping job listings for {}", term);

            for offset in self.offsets() {
                match self.fetch_listing_page(term, offset).await {
                    Ok(found) => {
                        report.pages_fetched += 1;
                        let added = report.candidates.extend_found(found);
                        tracing::debug!(
                            "{} offset {}: {} new identifiers ({} total)",
                            term,
                            offset,
                            added,
                            report.candidates.len()
                        );
                    }
                    Err(e) => {
                        report.pages_failed += 1;
                        tracing::warn!("Listing page {} offset {} failed: {}", term, offset, e);
                    }
                }
            }
        }

        tracing::info!(
            "Discovery finished: {} unique postings from {} pages ({} failed)",
            report.candidates.len(),
            report.pages_fetched,
            report.pages_failed
        );

        report
    }

    /// Fetches one listing page and extracts one optional id per entry
    pub async fn fetch_listing_page(
        &self,
        term: &SearchTerm,
        offset: u32,
    ) -> Result<Vec<Option<CandidateId>>, HarvestError> {
        let url = listing_url(&self.listing_base, term, offset);
        let body = get_page(&self.client, &url, self.timeout).await?;
        let found = extract_candidate_ids(&body);

        tracing::info!(
            "{} - Found postings: {}. Expected {}",
            url,
            found.len(),
            self.page_size
        );

        Ok(found)
    }
}
