//! Fetch executor: one logical fetch with retries, backoff and identity rotation
//!
//! Each dequeued URL runs through an explicit state machine held in a
//! [`RetryContext`]:
//!
//! ```text
//! Pending -> Fetching -> { Success, RetryScheduled, Exhausted, FatalSkip }
//!                 ^              |
//!                 +--- backoff --+
//! ```
//!
//! Every attempt first waits on the shared rate limiter. The outcome of each
//! attempt is classified by [`classify`]; retry decisions and delays come from
//! [`RetryPolicy`]. No outcome escapes as an error: the coordinator only ever
//! sees a terminal [`FetchOutcome`].

use crate::config::{secs_to_duration, RetryConfig, UserAgentConfig};
use crate::crawler::{FetchFailure, FetchResponse, Frontier, IdentityPool, LinkExtractor, PageFetcher};
use crate::ratelimit::RateLimiter;
use crate::robots::PolitenessGate;
use crate::url::{classify_link, normalize_url, LinkClassification, LinkScope};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Where a logical fetch is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Pending,
    Fetching,
    RetryScheduled,
    Success,
    Exhausted,
    FatalSkip,
}

/// Failures worth another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryKind {
    /// 401 / 403, retried under a different identity
    Identity,
    /// 429
    RateLimited,
    /// 500 / 503
    ServerError,
    Timeout,
    Connection,
}

impl fmt::Display for RetryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Identity => "access denied",
            Self::RateLimited => "rate limited",
            Self::ServerError => "server error",
            Self::Timeout => "timeout",
            Self::Connection => "connection failure",
        };
        f.write_str(label)
    }
}

/// Why a URL was dropped without retrying
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Disallowed,
    NotFound,
    UnexpectedStatus(u16),
    /// A 3xx without a usable Location, or a second 3xx after following one
    UnresolvedRedirect,
    /// The redirect target is already queued or visited
    DuplicateRedirect,
    Transport(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disallowed => f.write_str("disallowed by robots.txt"),
            Self::NotFound => f.write_str("not found"),
            Self::UnexpectedStatus(status) => write!(f, "unexpected status {}", status),
            Self::UnresolvedRedirect => f.write_str("unresolved redirect"),
            Self::DuplicateRedirect => f.write_str("redirect target already scheduled"),
            Self::Transport(e) => write!(f, "unexpected transport error: {}", e),
        }
    }
}

/// Terminal result of one logical fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success {
        url: Url,
        final_url: Url,
        attempts: u32,
        links_enqueued: usize,
        files_found: usize,
    },
    Exhausted {
        url: Url,
        attempts: u32,
        last_failure: RetryKind,
    },
    FatalSkip {
        url: Url,
        attempts: u32,
        reason: SkipReason,
    },
}

impl FetchOutcome {
    pub fn url(&self) -> &Url {
        match self {
            Self::Success { url, .. } | Self::Exhausted { url, .. } | Self::FatalSkip { url, .. } => {
                url
            }
        }
    }

    /// Network attempts made, redirect follow-ups not counted
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::FatalSkip { attempts, .. } => *attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// How one attempt's result should be handled
#[derive(Debug)]
pub enum Verdict {
    Success(FetchResponse),
    Follow(Url),
    Retry(RetryKind),
    Skip(SkipReason),
}

/// Maps one attempt's result onto the retry taxonomy
pub fn classify(result: Result<FetchResponse, FetchFailure>) -> Verdict {
    match result {
        Ok(response) if response.is_success() => Verdict::Success(response),
        Ok(response) if response.is_redirect() => match response.location {
            Some(location) => Verdict::Follow(location),
            None => Verdict::Skip(SkipReason::UnresolvedRedirect),
        },
        Ok(response) => match response.status {
            404 => Verdict::Skip(SkipReason::NotFound),
            401 | 403 => Verdict::Retry(RetryKind::Identity),
            429 => Verdict::Retry(RetryKind::RateLimited),
            500 | 503 => Verdict::Retry(RetryKind::ServerError),
            other => Verdict::Skip(SkipReason::UnexpectedStatus(other)),
        },
        Err(FetchFailure::Timeout) => Verdict::Retry(RetryKind::Timeout),
        Err(FetchFailure::Connect(_)) => Verdict::Retry(RetryKind::Connection),
        Err(FetchFailure::Other(e)) => Verdict::Skip(SkipReason::Transport(e)),
    }
}

/// Retry limits and delays
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay_base: f64,
    pub initial_timeout: Duration,
    pub timeout_increment: Duration,
    pub identity_retry_delay: Duration,
    pub timeout_retry_delay: Duration,
    /// Fixed seed for jitter and identity choice; entropy when unset
    pub rng_seed: Option<u64>,
}

impl RetryPolicy {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// `retry_delay_base ^ attempt` seconds
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        secs_to_duration(self.retry_delay_base.powi(exponent))
    }

    /// Delay before the next attempt, or `None` once `attempt` reached the limit
    ///
    /// `attempt` counts from 0 for the first try.
    pub fn next_delay<R: Rng + ?Sized>(
        &self,
        kind: RetryKind,
        attempt: u32,
        rng: &mut R,
    ) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }

        let delay = match kind {
            RetryKind::Identity => self.identity_retry_delay,
            RetryKind::Timeout => self.timeout_retry_delay,
            RetryKind::RateLimited => {
                let jitter = Duration::from_secs_f64(rng.gen_range(0.0..1.0));
                self.backoff(attempt).saturating_add(jitter)
            }
            RetryKind::ServerError | RetryKind::Connection => self.backoff(attempt),
        };
        Some(delay)
    }

    fn rng(&self) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay_base: config.retry_delay_base,
            initial_timeout: secs_to_duration(config.initial_timeout),
            timeout_increment: secs_to_duration(config.timeout_increment),
            identity_retry_delay: secs_to_duration(config.identity_retry_delay),
            timeout_retry_delay: secs_to_duration(config.timeout_retry_delay),
            rng_seed: None,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

/// Mutable state of one logical fetch
#[derive(Debug)]
pub struct RetryContext {
    pub url: Url,
    /// Zero-based attempt counter
    pub attempt: u32,
    /// Timeout applied to the next attempt
    pub timeout: Duration,
    /// Index into the identity pool used for the next attempt
    pub identity: usize,
    pub state: FetchState,
    /// Delays slept so far, in order
    pub backoffs: Vec<Duration>,
    rng: StdRng,
}

impl RetryContext {
    pub fn new(url: Url, policy: &RetryPolicy) -> Self {
        Self {
            url,
            attempt: 0,
            timeout: policy.initial_timeout,
            identity: 0,
            state: FetchState::Pending,
            backoffs: Vec::new(),
            rng: policy.rng(),
        }
    }
}

/// Runs logical fetches against the shared gate, limiter and frontier
pub struct FetchExecutor {
    fetcher: Arc<dyn PageFetcher>,
    gate: Arc<PolitenessGate>,
    limiter: Arc<dyn RateLimiter>,
    frontier: Arc<Frontier>,
    extractor: Arc<dyn LinkExtractor>,
    identities: IdentityPool,
    policy: RetryPolicy,
    scope: LinkScope,
}

impl FetchExecutor {
    /// Creates an executor with the default retry policy and identity pool
    /// and no crawl boundary
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        gate: Arc<PolitenessGate>,
        limiter: Arc<dyn RateLimiter>,
        frontier: Arc<Frontier>,
        extractor: Arc<dyn LinkExtractor>,
    ) -> Self {
        Self {
            fetcher,
            gate,
            limiter,
            frontier,
            extractor,
            identities: IdentityPool::new(UserAgentConfig::default().agents),
            policy: RetryPolicy::default(),
            scope: LinkScope::unrestricted(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_identities(mut self, identities: IdentityPool) -> Self {
        self.identities = identities;
        self
    }

    pub fn with_scope(mut self, scope: LinkScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Resolves one URL to a terminal outcome
    pub async fn execute(&self, url: Url) -> FetchOutcome {
        let mut ctx = RetryContext::new(url, &self.policy);
        self.run(&mut ctx).await
    }

    /// Drives `ctx` to a terminal state
    ///
    /// The directive check happens once, with the primary identity, before
    /// the first attempt. Identity rotation does not re-check it.
    pub async fn run(&self, ctx: &mut RetryContext) -> FetchOutcome {
        if !self.gate.check(&ctx.url, self.identities.primary()).await {
            tracing::debug!("Disallowed by robots.txt: {}", ctx.url);
            return self.skip(ctx, SkipReason::Disallowed);
        }

        loop {
            ctx.state = FetchState::Fetching;
            tracing::debug!("Fetching {} (attempt {})", ctx.url, ctx.attempt.saturating_add(1));

            match self.attempt(ctx).await {
                Verdict::Success(response) => {
                    ctx.state = FetchState::Success;
                    let (links_enqueued, files_found) = self.forward_links(&response);
                    tracing::info!(
                        "Fetched {} ({} new links, {} files)",
                        ctx.url,
                        links_enqueued,
                        files_found
                    );
                    return FetchOutcome::Success {
                        url: ctx.url.clone(),
                        final_url: response.final_url,
                        attempts: ctx.attempt.saturating_add(1),
                        links_enqueued,
                        files_found,
                    };
                }
                Verdict::Follow(_) => return self.skip(ctx, SkipReason::UnresolvedRedirect),
                Verdict::Skip(reason) => return self.skip(ctx, reason),
                Verdict::Retry(kind) => {
                    let Some(delay) = self.policy.next_delay(kind, ctx.attempt, &mut ctx.rng) else {
                        ctx.state = FetchState::Exhausted;
                        tracing::warn!(
                            "Giving up on {} after {} attempts (last: {})",
                            ctx.url,
                            ctx.attempt.saturating_add(1),
                            kind
                        );
                        return FetchOutcome::Exhausted {
                            url: ctx.url.clone(),
                            attempts: ctx.attempt.saturating_add(1),
                            last_failure: kind,
                        };
                    };

                    match kind {
                        RetryKind::Identity => {
                            ctx.identity = self.identities.rotate(ctx.identity, &mut ctx.rng);
                        }
                        RetryKind::Timeout => {
                            ctx.timeout = ctx.timeout.saturating_add(self.policy.timeout_increment);
                        }
                        _ => {}
                    }

                    ctx.state = FetchState::RetryScheduled;
                    ctx.backoffs.push(delay);
                    tracing::warn!(
                        "{} for {} (attempt {}/{}), retrying in {:.2}s",
                        kind,
                        ctx.url,
                        ctx.attempt.saturating_add(1),
                        self.policy.max_retries.saturating_add(1),
                        delay.as_secs_f64()
                    );

                    ctx.attempt += 1;
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// One network attempt, following at most one unresolved redirect
    async fn attempt(&self, ctx: &RetryContext) -> Verdict {
        let agent = self.identities.get(ctx.identity);

        self.limiter.acquire().await;
        let verdict = classify(self.fetcher.fetch(&ctx.url, agent, ctx.timeout).await);

        let Verdict::Follow(target) = verdict else {
            return verdict;
        };

        let scheduled = normalize_url(target.as_str())
            .map_or(false, |normalized| self.frontier.contains(&normalized));
        if scheduled {
            tracing::debug!("Redirect target already scheduled: {}", target);
            return Verdict::Skip(SkipReason::DuplicateRedirect);
        }

        if !self.gate.check(&target, self.identities.primary()).await {
            tracing::debug!("Redirect target disallowed by robots.txt: {}", target);
            return Verdict::Skip(SkipReason::Disallowed);
        }

        tracing::debug!("Following redirect {} -> {}", ctx.url, target);
        self.limiter.acquire().await;
        match classify(self.fetcher.fetch(&target, agent, ctx.timeout).await) {
            Verdict::Follow(_) => Verdict::Skip(SkipReason::UnresolvedRedirect),
            other => other,
        }
    }

    fn skip(&self, ctx: &mut RetryContext, reason: SkipReason) -> FetchOutcome {
        ctx.state = FetchState::FatalSkip;
        match &reason {
            SkipReason::Disallowed | SkipReason::NotFound | SkipReason::DuplicateRedirect => {
                tracing::info!("Skipping {}: {}", ctx.url, reason)
            }
            _ => tracing::warn!("Skipping {}: {}", ctx.url, reason),
        }

        let attempts = match reason {
            SkipReason::Disallowed => 0,
            _ => ctx.attempt.saturating_add(1),
        };
        FetchOutcome::FatalSkip {
            url: ctx.url.clone(),
            attempts,
            reason,
        }
    }

    /// Hands the document to the extractor and routes each candidate link
    ///
    /// Returns `(links enqueued, files recorded)`.
    fn forward_links(&self, response: &FetchResponse) -> (usize, usize) {
        let mut enqueued = 0;
        let mut files = 0;

        for link in self.extractor.extract(&response.body, &response.final_url) {
            let url = match normalize_url(&link) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Dropping link {}: {}", link, e);
                    continue;
                }
            };

            match classify_link(&url, &self.scope) {
                LinkClassification::Document => {
                    if self.frontier.enqueue(url) {
                        enqueued += 1;
                    }
                }
                LinkClassification::File => {
                    if self.frontier.record_file(&url) {
                        files += 1;
                    }
                }
                LinkClassification::OffSite => {
                    tracing::trace!("Off-site link dropped: {}", url);
                }
            }
        }

        (enqueued, files)
    }
}
