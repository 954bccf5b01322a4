//! URL building for the two fixed endpoints
//!
//! Listing pages are addressed by query parameters, detail pages by a path
//! segment appended to the detail endpoint.

use crate::crawler::{CandidateId, SearchTerm};
use crate::HarvestError;
use url::Url;

/// Parses an endpoint that later gets query parameters or path segments appended
pub fn parse_endpoint(value: &str) -> Result<Url, HarvestError> {
    let url = Url::parse(value)?;
    if url.cannot_be_a_base() {
        return Err(HarvestError::InvalidEndpoint(value.to_string()));
    }
    Ok(url)
}

/// Builds the listing page URL for one search term and page offset
///
/// # Example
///
/// ```
/// use posting_harvester::crawler::SearchTerm;
/// use posting_harvester::url::listing_url;
/// use url::Url;
///
/// let base = Url::parse("https://jobs.example.com/search").unwrap();
/// let url = listing_url(&base, &SearchTerm::new("Rust", "Remote"), 20);
/// assert_eq!(
///     url.as_str(),
///     "https://jobs.example.com/search?keywords=Rust&location=Remote&start=20"
/// );
/// ```
pub fn listing_url(base: &Url, term: &SearchTerm, offset: u32) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("keywords", &term.keyword)
        .append_pair("location", &term.location)
        .append_pair("start", &offset.to_string());
    url
}

/// Builds the detail page URL for a candidate
pub fn detail_url(base: &Url, id: &CandidateId) -> Result<Url, HarvestError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| HarvestError::InvalidEndpoint(base.to_string()))?
        .pop_if_empty()
        .push(id.as_str());
    Ok(url)
}
