//! Run statistics
//!
//! Counters collected over one harvest, logged at the end of every run and
//! optionally printed for the command line.

use chrono::{DateTime, Utc};

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct RunStatistics {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the last fetch settled
    pub finished_at: DateTime<Utc>,

    /// Number of keyword × location pairs walked
    pub search_terms: usize,

    /// Listing pages fetched and parsed
    pub listing_pages_fetched: usize,

    /// Listing pages that failed
    pub listing_pages_failed: usize,

    /// Unique identifiers handed to the fetch stage
    pub candidates: usize,

    /// Detail pages that produced a posting
    pub succeeded: usize,

    /// Detail pages fetched without usable content
    pub empty: usize,

    /// Detail fetches that failed
    pub failed: usize,

    /// Highest number of detail requests in flight at once
    pub peak_in_flight: usize,
}

impl RunStatistics {
    /// Wall-clock duration of the run in seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Percentage of candidates that produced a posting
    pub fn success_rate(&self) -> f64 {
        if self.candidates == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / self.candidates as f64) * 100.0
    }

    /// Emits the end-of-run summary through `tracing`
    pub fn log_summary(&self) {
        tracing::info!(
            "Harvest finished in {}s: {} postings from {} candidates ({} empty, {} failed)",
            self.duration_seconds(),
            self.succeeded,
            self.candidates,
            self.empty,
            self.failed
        );

        if self.listing_pages_failed > 0 {
            tracing::warn!(
                "{} of {} listing pages failed",
                self.listing_pages_failed,
                self.listing_pages_fetched + self.listing_pages_failed
            );
        }
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Run:");
    println!("  Started: {}", stats.started_at.to_rfc3339());
    println!("  Finished: {}", stats.finished_at.to_rfc3339());
    println!("  Duration: {}s", stats.duration_seconds());
    println!();

    println!("Discovery:");
    println!("  Search terms: {}", stats.search_terms);
    println!("  Listing pages fetched: {}", stats.listing_pages_fetched);
    println!("  Listing pages failed: {}", stats.listing_pages_failed);
    println!("  Unique postings found: {}", stats.candidates);
    println!();

    println!("Detail Pages:");
    println!("  Succeeded: {}", stats.succeeded);
    println!("  Empty: {}", stats.empty);
    println!("  Failed: {}", stats.failed);
    println!("  Peak in flight: {}", stats.peak_in_flight);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} postings scraped)",
        stats.success_rate(),
        stats.succeeded,
        stats.candidates
    );
}
