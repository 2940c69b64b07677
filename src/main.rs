//! Polite-Crawl main entry point
//!
//! This is the command-line interface for the Polite-Crawl crawl scheduler.

use anyhow::Context;
use clap::Parser;
use polite_crawl::config::{load_config_with_hash, Config, RateLimiterConfig};
use polite_crawl::crawler::Coordinator;
use polite_crawl::output::print_report;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Polite-Crawl: a bounded-concurrency, polite crawl scheduler
///
/// Polite-Crawl crawls a site breadth-first from its seed URLs while
/// respecting robots.txt, a configurable rate limiter and a page budget,
/// and prints the pages it reached, the ones it could not, and the files
/// it found along the way.
#[derive(Parser, Debug)]
#[command(name = "polite-crawl")]
#[command(version)]
#[command(about = "A polite, bounded-concurrency crawl scheduler", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("polite_crawl=info,warn"),
            1 => EnvFilter::new("polite_crawl=debug,info"),
            2 => EnvFilter::new("polite_crawl=trace,debug"),
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

fn describe_rate_limiter(config: &RateLimiterConfig) -> String {
    match config {
        RateLimiterConfig::None => "none".to_string(),
        RateLimiterConfig::TokenBucket { capacity, window } => {
            format!("token bucket, {} per {}s", capacity, window)
        }
        RateLimiterConfig::SlidingWindow {
            max_requests,
            window,
        } => format!("sliding window, {} per {}s", max_requests, window),
        RateLimiterConfig::LeakyBucket { rate } => format!("leaky bucket, {} per second", rate),
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Polite-Crawl Dry Run ===\n");

    println!("Seeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed);
    }

    println!("\nCrawler Configuration:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Concurrency limit: {}", config.crawler.concurrency_limit);
    println!(
        "  Delay between batches: {}s",
        config.crawler.delay_between_batches
    );
    println!("  Same domain only: {}", config.crawler.same_domain_only);

    println!("\nRetry:");
    println!("  Max retries: {}", config.retry.max_retries);
    println!("  Backoff base: {}", config.retry.retry_delay_base);
    println!(
        "  Timeout: {}s (+{}s per timeout)",
        config.retry.initial_timeout, config.retry.timeout_increment
    );

    println!(
        "\nRate limiter: {}",
        describe_rate_limiter(&config.rate_limiter)
    );

    println!("\nUser Agents ({}):", config.user_agent.agents.len());
    for agent in &config.user_agent.agents {
        println!("  - {}", agent);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config).context("Failed to start crawl")?;
    let report = coordinator.run().await;

    print_report(&report);
    Ok(())
}
