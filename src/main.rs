//! Posting-Harvester main entry point
//!
//! This is the command-line interface for the Posting-Harvester job posting collector.

use anyhow::Context;
use clap::Parser;
use posting_harvester::config::{load_config_with_hash, Config};
use posting_harvester::crawler::{search_terms, Coordinator};
use posting_harvester::output::{print_statistics, write_postings_csv};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Posting-Harvester: a rate-limit aware job posting collector
///
/// Walks the listing service for every keyword and location, then fetches
/// each unique posting's detail page with bounded parallelism and writes
/// the results as CSV.
#[derive(Parser, Debug)]
#[command(name = "posting-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A rate-limit aware job posting collector", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the discovery space without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Write the CSV here instead of the configured path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let output_path = cli
        .output
        .unwrap_or_else(|| PathBuf::from(&config.output.csv_path));
    handle_harvest(&config, output_path, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("posting_harvester=info,warn"),
            1 => EnvFilter::new("posting_harvester=debug,info"),
            2 => EnvFilter::new("posting_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what would be fetched
fn handle_dry_run(config: &Config) {
    println!("=== Posting-Harvester Dry Run ===\n");

    let terms = search_terms(&config.search.keywords, &config.search.locations);

    println!("Search Space:");
    println!("  Keywords: {}", config.search.keywords.join(", "));
    println!("  Locations: {}", config.search.locations.join(", "));
    println!(
        "  Pages per term: {} ({} entries each)",
        config.search.pages, config.search.page_size
    );

    println!("\nFetch Policy:");
    println!(
        "  Max concurrent requests: {}",
        config.fetch.max_concurrent_requests
    );
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!("  Base backoff: {}ms", config.fetch.base_backoff_ms);
    println!("  Max jitter: {}ms", config.fetch.max_jitter_ms);
    println!("  Request timeout: {}ms", config.fetch.request_timeout_ms);

    println!("\nEndpoints:");
    println!("  Listing: {}", config.endpoints.listing_url);
    println!("  Detail: {}", config.endpoints.detail_url);

    println!("\nSearch Terms ({}):", terms.len());
    for term in &terms {
        println!("  - {}", term);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would fetch {} listing pages",
        terms.len() * config.search.pages as usize
    );
}

/// Handles the main harvest operation
async fn handle_harvest(config: &Config, output_path: PathBuf, quiet: bool) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config).context("invalid harvest configuration")?;

    let report = tokio::select! {
        report = coordinator.run() => report,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, abandoning harvest");
            coordinator.gate().close();
            anyhow::bail!("harvest interrupted");
        }
    };

    write_postings_csv(&report.postings, &output_path)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    if !quiet {
        print_statistics(&report.stats);
    }

    Ok(())
}
