//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the batch loop that drives a crawl:
//! - Seeding the frontier and pre-loading robots.txt for the seeds
//! - Sizing each batch against the concurrency limit and the page budget
//! - Dispatching a batch concurrently and waiting for every fetch to resolve
//! - Recording outcomes and pausing between batches
//! - Producing the final report

use crate::config::{Config, CrawlerConfig};
use crate::crawler::{
    build_http_client, FetchExecutor, FetchOutcome, Frontier, HtmlLinkExtractor, HttpFetcher,
    IdentityPool, LinkExtractor, PageFetcher, RetryPolicy,
};
use crate::output::CrawlReport;
use crate::ratelimit::build_rate_limiter;
use crate::robots::{DirectiveSource, HttpDirectiveSource, PolitenessGate};
use crate::url::{normalize_url, LinkScope};
use crate::{CrawlError, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator {
    settings: CrawlerConfig,
    seeds: Vec<Url>,
    frontier: Arc<Frontier>,
    gate: Arc<PolitenessGate>,
    executor: Arc<FetchExecutor>,
    limiter_name: &'static str,
}

impl Coordinator {
    /// Creates a coordinator backed by the HTTP fetcher, the HTTP robots.txt
    /// source and the HTML link extractor
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CrawlError)` - The HTTP client could not be built or no seed is usable
    pub fn new(config: Config) -> Result<Self> {
        let client = build_http_client()?;
        let fetcher = Arc::new(HttpFetcher::new(client.clone()));
        let source = Arc::new(HttpDirectiveSource::new(client));

        Self::with_parts(config, fetcher, source, Arc::new(HtmlLinkExtractor::new()))
    }

    /// Creates a coordinator around caller-supplied collaborators
    ///
    /// Seeds that fail normalization are logged and skipped; if none remain
    /// the crawl cannot start.
    pub fn with_parts(
        config: Config,
        fetcher: Arc<dyn PageFetcher>,
        source: Arc<dyn DirectiveSource>,
        extractor: Arc<dyn LinkExtractor>,
    ) -> Result<Self> {
        let seeds: Vec<Url> = config
            .seeds
            .iter()
            .filter_map(|seed| match normalize_url(seed) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("Ignoring seed {}: {}", seed, e);
                    None
                }
            })
            .collect();

        if seeds.is_empty() {
            return Err(CrawlError::EmptyFrontier(config.seeds.join(", ")));
        }

        let frontier = Arc::new(Frontier::new(config.crawler.max_pages));
        for seed in &seeds {
            frontier.enqueue(seed.clone());
        }

        let identities = IdentityPool::new(config.user_agent.agents.clone());
        let gate = Arc::new(PolitenessGate::new(source, identities.primary()));
        let limiter = build_rate_limiter(&config.rate_limiter);
        let limiter_name = limiter.name();

        let executor = FetchExecutor::new(
            fetcher,
            Arc::clone(&gate),
            limiter,
            Arc::clone(&frontier),
            extractor,
        )
        .with_policy(RetryPolicy::from(&config.retry))
        .with_identities(identities)
        .with_scope(LinkScope::for_seeds(&seeds, config.crawler.same_domain_only));

        Ok(Self {
            settings: config.crawler,
            seeds,
            frontier,
            gate,
            executor: Arc::new(executor),
            limiter_name,
        })
    }

    pub fn frontier(&self) -> &Arc<Frontier> {
        &self.frontier
    }

    pub fn gate(&self) -> &Arc<PolitenessGate> {
        &self.gate
    }

    /// Runs the batch loop until the frontier is empty or the budget is spent
    ///
    /// Each iteration:
    /// 1. Sizes the batch as `min(concurrency, queued, remaining budget)`
    /// 2. Dequeues it, marking every URL visited
    /// 3. Spawns one task per URL and waits for all of them
    /// 4. Records each outcome; a task that panicked counts as failed
    /// 5. Sleeps the inter-batch delay unless the crawl is done
    pub async fn run(&self) -> CrawlReport {
        let started_at = Utc::now();
        tracing::info!(
            "Starting crawl: {} seed(s), max {} pages, concurrency {}, rate limiter {}",
            self.seeds.len(),
            self.settings.max_pages,
            self.settings.concurrency_limit,
            self.limiter_name
        );

        for seed in &self.seeds {
            self.gate.load(seed).await;
        }

        let mut batches = 0;
        loop {
            let batch_size = self
                .settings
                .concurrency_limit
                .min(self.frontier.len())
                .min(self.frontier.remaining_budget());

            let batch = self.frontier.dequeue_batch(batch_size);
            if batch.is_empty() {
                break;
            }
            batches += 1;

            tracing::info!(
                "Batch {}: dispatching {} URL(s) ({} queued, {} of budget left)",
                batches,
                batch.len(),
                self.frontier.len(),
                self.frontier.remaining_budget()
            );

            let handles: Vec<(Url, JoinHandle<FetchOutcome>)> = batch
                .into_iter()
                .map(|url| {
                    let executor = Arc::clone(&self.executor);
                    let task_url = url.clone();
                    tracing::debug!("Dispatching {}", url);
                    (url, tokio::spawn(async move { executor.execute(task_url).await }))
                })
                .collect();

            for (url, handle) in handles {
                match handle.await {
                    Ok(outcome) => self.frontier.record_outcome(&url, outcome.is_success()),
                    Err(e) => {
                        tracing::error!("Fetch task for {} did not complete: {}", url, e);
                        self.frontier.record_outcome(&url, false);
                    }
                }
            }

            if self.frontier.is_empty() || self.frontier.remaining_budget() == 0 {
                break;
            }

            let delay = self.settings.batch_delay();
            if !delay.is_zero() {
                tracing::trace!("Waiting {:?} before the next batch", delay);
                tokio::time::sleep(delay).await;
            }
        }

        let report =
            CrawlReport::from_snapshot(self.frontier.snapshot(), batches, started_at, Utc::now());

        tracing::info!(
            "Crawl completed: {} visited ({} succeeded, {} failed), {} files, {} still queued",
            report.stats.visited_count,
            report.stats.succeeded_count,
            report.stats.failed_count,
            report.stats.files_found,
            report.stats.queue_size_remaining
        );

        report
    }
}

/// Builds a coordinator from `config` and runs it to completion
///
/// # Example
///
/// ```no_run
/// use polite_crawl::config::load_config;
/// use polite_crawl::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let report = run_crawl(config).await?;
/// println!("{} pages visited", report.stats.visited_count);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlReport> {
    let coordinator = Coordinator::new(config)?;
    Ok(coordinator.run().await)
}
