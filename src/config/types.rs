use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Polite-Crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Seed URLs the crawl starts from
    pub seeds: Vec<String>,

    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default, rename = "rate-limiter")]
    pub rate_limiter: RateLimiterConfig,

    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of URLs visited (successful or failed) per crawl
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Pause between consecutive batches (seconds)
    #[serde(rename = "delay-between-batches", default = "default_batch_delay")]
    pub delay_between_batches: f64,

    /// Maximum number of fetches in flight at once (1 = sequential)
    #[serde(rename = "concurrency-limit")]
    pub concurrency_limit: usize,

    /// Only follow links on the seed's registrable domain
    #[serde(rename = "same-domain-only", default = "default_true")]
    pub same_domain_only: bool,
}

impl CrawlerConfig {
    pub fn batch_delay(&self) -> Duration {
        secs_to_duration(self.delay_between_batches)
    }
}

/// Converts a configured number of seconds into a `Duration`
///
/// Values too large to represent saturate at `Duration::MAX`; negative
/// values and NaN become zero.
pub fn secs_to_duration(secs: f64) -> Duration {
    match Duration::try_from_secs_f64(secs) {
        Ok(duration) => duration,
        Err(_) if secs > 0.0 => Duration::MAX,
        Err(_) => Duration::ZERO,
    }
}

/// Retry and timeout policy for a single logical fetch
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Number of retries after the initial attempt
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base of the exponential backoff (seconds), must be > 1.0
    #[serde(rename = "retry-delay-base")]
    pub retry_delay_base: f64,

    /// Timeout of the first attempt (seconds)
    #[serde(rename = "initial-timeout")]
    pub initial_timeout: f64,

    /// Seconds added to the timeout after each timed-out attempt
    #[serde(rename = "timeout-increment")]
    pub timeout_increment: f64,

    /// Fixed delay before retrying with a rotated identity (seconds)
    #[serde(rename = "identity-retry-delay")]
    pub identity_retry_delay: f64,

    /// Fixed delay before retrying a timed-out request (seconds)
    #[serde(rename = "timeout-retry-delay")]
    pub timeout_retry_delay: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_base: 2.0,
            initial_timeout: 10.0,
            timeout_increment: 5.0,
            identity_retry_delay: 1.0,
            timeout_retry_delay: 1.0,
        }
    }
}

/// Rate limiter selection and its algorithm-specific parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(tag = "algorithm", rename_all = "kebab-case")]
pub enum RateLimiterConfig {
    /// No pacing beyond the concurrency limit
    #[default]
    None,

    /// Up to `capacity` requests per `window` seconds, bursts allowed
    TokenBucket { capacity: u32, window: f64 },

    /// At most `max_requests` admissions in any trailing `window` seconds
    SlidingWindow {
        #[serde(rename = "max-requests")]
        max_requests: u32,
        window: f64,
    },

    /// Constant spacing of `1 / rate` seconds between admissions
    LeakyBucket { rate: f64 },
}

/// User agent identities the fetch executor may present
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Identity pool; the first entry is the primary identity
    pub agents: Vec<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            agents: vec![
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36".to_string(),
            ],
        }
    }
}

fn default_batch_delay() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}
