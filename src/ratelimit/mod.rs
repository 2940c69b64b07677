//! Request pacing for fetch attempts
//!
//! Every fetch attempt calls [`RateLimiter::acquire`] before touching the
//! network. Three interchangeable algorithms implement the contract:
//!
//! - [`TokenBucket`]: bursts up to `capacity`, refilled continuously over `window`
//! - [`SlidingWindow`]: at most `max_requests` admissions in any trailing `window`
//! - [`LeakyBucket`]: constant spacing of `1 / rate` between admissions
//!
//! All of them measure time with `tokio::time::Instant`, which is monotonic,
//! and keep their state behind an async mutex so exactly one caller consumes
//! a given permit.

mod leaky_bucket;
mod sliding_window;
mod token_bucket;

pub use leaky_bucket::LeakyBucket;
pub use sliding_window::SlidingWindow;
pub use token_bucket::TokenBucket;

use crate::config::{secs_to_duration, RateLimiterConfig};
use async_trait::async_trait;
use std::sync::Arc;

/// Capability shared by every pacing algorithm
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Suspends the caller until it may proceed, then returns
    ///
    /// Never fails on its own account.
    async fn acquire(&self);

    /// Short algorithm name used in logs
    fn name(&self) -> &'static str;
}

/// Limiter that admits every caller immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct Unlimited;

#[async_trait]
impl RateLimiter for Unlimited {
    async fn acquire(&self) {}

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Builds the configured rate limiter
///
/// # Example
///
/// ```
/// use polite_crawl::config::RateLimiterConfig;
/// use polite_crawl::ratelimit::build_rate_limiter;
///
/// let limiter = build_rate_limiter(&RateLimiterConfig::LeakyBucket { rate: 2.0 });
/// assert_eq!(limiter.name(), "leaky-bucket");
/// ```
pub fn build_rate_limiter(config: &RateLimiterConfig) -> Arc<dyn RateLimiter> {
    match config {
        RateLimiterConfig::None => Arc::new(Unlimited),
        RateLimiterConfig::TokenBucket { capacity, window } => {
            Arc::new(TokenBucket::new(*capacity, secs_to_duration(*window)))
        }
        RateLimiterConfig::SlidingWindow {
            max_requests,
            window,
        } => Arc::new(SlidingWindow::new(*max_requests, secs_to_duration(*window))),
        RateLimiterConfig::LeakyBucket { rate } => Arc::new(LeakyBucket::new(*rate)),
    }
}
