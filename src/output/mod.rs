//! Output module for persisting harvest results
//!
//! This module handles:
//! - Writing postings as CSV for downstream consumers
//! - Recording and reporting run statistics

mod csv_output;
pub mod stats;

pub use csv_output::{write_postings, write_postings_csv};
pub use stats::{print_statistics, RunStatistics};
