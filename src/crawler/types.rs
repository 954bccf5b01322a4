//! Core data types shared by the discovery and fetch stages

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// One keyword/location pair of the discovery space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    pub keyword: String,
    pub location: String,
}

impl SearchTerm {
    pub fn new(keyword: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            location: location.into(),
        }
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.keyword, self.location)
    }
}

/// Builds the full discovery space as the keyword-major cartesian product
///
/// # Example
///
/// ```
/// use posting_harvester::crawler::search_terms;
///
/// let keywords = vec!["Rust".to_string(), "Go".to_string()];
/// let locations = vec!["Remote".to_string(), "Zagreb".to_string()];
/// let terms = search_terms(&keywords, &locations);
///
/// assert_eq!(terms.len(), 4);
/// assert_eq!(terms[1].keyword, "Rust");
/// assert_eq!(terms[1].location, "Zagreb");
/// ```
pub fn search_terms(keywords: &[String], locations: &[String]) -> Vec<SearchTerm> {
    keywords
        .iter()
        .flat_map(|keyword| {
            locations
                .iter()
                .map(move |location| SearchTerm::new(keyword.clone(), location.clone()))
        })
        .collect()
}

/// Identifier of a posting, addressing its detail page
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateId(String);

impl CandidateId {
    /// Wraps a raw identifier; blank input yields `None`
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deduplicated set of identifiers gathered across every listing page
///
/// Entries without an identifier arrive as `None` and are dropped, so the
/// set never holds a "not found" marker.
#[derive(Debug, Default, Clone)]
pub struct CandidateSet {
    ids: HashSet<CandidateId>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts every present identifier, returning how many were new
    pub fn extend_found<I>(&mut self, found: I) -> usize
    where
        I: IntoIterator<Item = Option<CandidateId>>,
    {
        found
            .into_iter()
            .flatten()
            .filter(|id| self.ids.insert(id.clone()))
            .count()
    }

    pub fn contains(&self, id: &CandidateId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateId> {
        self.ids.iter()
    }
}

impl IntoIterator for CandidateSet {
    type Item = CandidateId;
    type IntoIter = std::collections::hash_set::IntoIter<CandidateId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}

impl FromIterator<CandidateId> for CandidateSet {
    fn from_iter<T: IntoIterator<Item = CandidateId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// A harvested job posting, one CSV row
///
/// Missing text fields are empty strings, never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Posting {
    pub title: String,
    pub location: String,
    pub org_name: String,
    pub org_link: String,
    pub description: String,
    pub job_posting_link: String,
}

impl Posting {
    /// Column order of the tabular output
    pub const COLUMNS: [&'static str; 6] = [
        "title",
        "location",
        "org_name",
        "org_link",
        "description",
        "job_posting_link",
    ];
}

/// Why a candidate produced no posting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Non-success, non-429 status; never retried
    Status(u16),

    /// Attempt budget used up on rate limits, timeouts, or transport errors
    Exhausted { attempts: u32, last_error: String },

    /// The detail URL could not be built from the identifier
    InvalidUrl(String),

    /// The concurrency gate was closed before a slot became free
    GateClosed,

    /// The fetch task panicked or was aborted
    TaskAborted(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Exhausted {
                attempts,
                last_error,
            } => write!(f, "gave up after {} attempts: {}", attempts, last_error),
            Self::InvalidUrl(reason) => write!(f, "invalid detail URL: {}", reason),
            Self::GateClosed => f.write_str("concurrency gate closed"),
            Self::TaskAborted(reason) => write!(f, "fetch task aborted: {}", reason),
        }
    }
}

/// Final result of one candidate's detail fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Posting extracted, annotated with its detail URL
    Success(Posting),

    /// Page fetched but nothing usable on it
    Empty,

    /// No page, or an unusable status
    Failed(FetchFailure),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn into_posting(self) -> Option<Posting> {
        match self {
            Self::Success(posting) => Some(posting),
            _ => None,
        }
    }
}
