//! Fetch state definitions for tracking one candidate's detail retrieval
//!
//! Transitions:
//!
//! ```text
//! Pending ──► Attempting ──► Succeeded
//!                 ▲  │ ────► EmptyResult
//!                 │  │ ────► ExhaustedRetries
//!                 │  ▼
//!              RetryWait ──► ExhaustedRetries
//! ```
use std::fmt;

/// Represents the current state of a candidate's detail fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchState {
    // ===== Active States =====
    /// Candidate is queued and has not yet attempted a request
    Pending,

    /// A request is in flight (holding a gate slot)
    Attempting,

    /// Waiting out a backoff delay before the next attempt (no gate slot held)
    RetryWait,

    // ===== Terminal States =====
    /// Detail page fetched and a posting extracted
    Succeeded,

    /// Detail page fetched but no usable content on it
    EmptyResult,

    /// Attempt budget spent, or a non-retryable status was returned
    ExhaustedRetries,
}

impl FetchState {
    /// Returns true if this is a terminal state (no further attempts)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::EmptyResult | Self::ExhaustedRetries
        )
    }

    /// Returns true if the fetch may still issue requests
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if the transition `self -> next` is allowed
    pub fn can_transition_to(&self, next: FetchState) -> bool {
        use FetchState::*;

        matches!(
            (*self, next),
            (Pending, Attempting)
                | (Attempting, Succeeded)
                | (Attempting, EmptyResult)
                | (Attempting, RetryWait)
                | (Attempting, ExhaustedRetries)
                | (RetryWait, Attempting)
                | (RetryWait, ExhaustedRetries)
        )
    }

    /// Short lowercase label used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Attempting => "attempting",
            Self::RetryWait => "retry_wait",
            Self::Succeeded => "succeeded",
            Self::EmptyResult => "empty_result",
            Self::ExhaustedRetries => "exhausted_retries",
        }
    }

    /// Returns all possible fetch states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Attempting,
            Self::RetryWait,
            Self::Succeeded,
            Self::EmptyResult,
            Self::ExhaustedRetries,
        ]
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
