//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The deduplicated, budget-bounded frontier
//! - HTTP fetching behind the `PageFetcher` trait
//! - HTML link extraction behind the `LinkExtractor` trait
//! - The per-URL retry state machine
//! - Overall crawl coordination in concurrent batches

mod coordinator;
mod executor;
mod fetcher;
mod frontier;
mod identity;
mod parser;

#[cfg(test)]
mod testing;

pub use coordinator::{run_crawl, Coordinator};
pub use executor::{
    classify, FetchExecutor, FetchOutcome, FetchState, RetryContext, RetryKind, RetryPolicy,
    SkipReason, Verdict,
};
pub use fetcher::{
    build_http_client, FetchFailure, FetchResponse, HttpFetcher, PageFetcher, MAX_REDIRECTS,
};
pub use frontier::{Frontier, FrontierSnapshot, VisitStatus};
pub use identity::{IdentityPool, FALLBACK_AGENT};
pub use parser::{HtmlLinkExtractor, LinkExtractor};
