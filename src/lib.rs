//! Polite-Crawl: a bounded-concurrency, polite crawl scheduler
//!
//! This crate decides which URL to fetch next, how many fetches run at once,
//! how failures are retried and how request pacing is enforced. Link
//! extraction, robots.txt evaluation and the HTTP transport sit behind traits
//! so they can be swapped or faked.

pub mod config;
pub mod crawler;
pub mod output;
pub mod ratelimit;
pub mod robots;
pub mod url;

use thiserror::Error;

/// Main error type for Polite-Crawl setup operations
///
/// Once a crawl is running, per-URL problems are resolved as terminal
/// outcomes inside the fetch executor and never surface here.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("No crawlable seed URL: {0}")]
    EmptyFrontier(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Polite-Crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, FetchOutcome, Frontier};
pub use output::{CrawlReport, CrawlStats};
pub use ratelimit::RateLimiter;
pub use robots::PolitenessGate;
pub use url::{extract_domain, normalize_url, registrable_domain};
