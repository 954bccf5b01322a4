//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `FetchState`: Tracks one candidate's detail fetch (pending, attempting,
//!   waiting out a backoff, or one of the terminal states)

mod fetch_state;

pub use fetch_state::FetchState;
