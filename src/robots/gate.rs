//! Per-domain directive cache answering "may this URL be fetched?"

use crate::robots::{DirectiveSource, DomainDirectives};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use url::Url;

type DirectiveCell = Arc<OnceCell<Arc<DomainDirectives>>>;

/// Politeness gate with a lazily filled, crawl-lifetime directive cache
///
/// Each domain's document is loaded at most once: concurrent first queries
/// for the same domain wait on a single load. Load failures are cached as a
/// permissive directive set and logged as a warning; they never fail a crawl.
pub struct PolitenessGate {
    source: Arc<dyn DirectiveSource>,
    fetch_agent: String,
    domains: Mutex<HashMap<String, DirectiveCell>>,
}

impl PolitenessGate {
    /// Creates a gate
    ///
    /// # Arguments
    ///
    /// * `source` - Supplies raw directive documents
    /// * `fetch_agent` - User agent presented when fetching the documents
    pub fn new(source: Arc<dyn DirectiveSource>, fetch_agent: impl Into<String>) -> Self {
        Self {
            source,
            fetch_agent: fetch_agent.into(),
            domains: Mutex::new(HashMap::new()),
        }
    }

    /// Loads (once) and returns the directives for the domain of `url`
    pub async fn load(&self, url: &Url) -> Arc<DomainDirectives> {
        let Some(key) = directive_key(url) else {
            return Arc::new(DomainDirectives::allow_all());
        };

        let cell = {
            let mut domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(domains.entry(key.clone()).or_default())
        };

        let directives = cell
            .get_or_init(|| async {
                match self.source.fetch(url, &self.fetch_agent).await {
                    Ok(content) => {
                        let directives = DomainDirectives::from_content(&content);
                        match directives.crawl_delay(&self.fetch_agent) {
                            Some(delay) => tracing::info!(
                                "Loaded robots.txt for {} (crawl-delay {}s)",
                                key,
                                delay
                            ),
                            None => tracing::info!("Loaded robots.txt for {}", key),
                        }
                        Arc::new(directives)
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Could not load robots.txt for {}: {}. Proceeding without restrictions",
                            key,
                            e
                        );
                        Arc::new(DomainDirectives::allow_all())
                    }
                }
            })
            .await;

        Arc::clone(directives)
    }

    /// Answers from the cache whether `url` may be fetched by `user_agent`
    ///
    /// A domain that has not been loaded yet is treated like one whose
    /// directives could not be loaded: allowed.
    pub fn allowed(&self, url: &Url, user_agent: &str) -> bool {
        self.cached(url)
            .map_or(true, |directives| directives.allowed(url.as_str(), user_agent))
    }

    /// Loads the domain's directives if needed, then answers like [`allowed`](Self::allowed)
    pub async fn check(&self, url: &Url, user_agent: &str) -> bool {
        self.load(url).await.allowed(url.as_str(), user_agent)
    }

    /// Cached directives for the domain of `url`, if already loaded
    pub fn cached(&self, url: &Url) -> Option<Arc<DomainDirectives>> {
        let key = directive_key(url)?;
        let domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
        domains.get(&key)?.get().cloned()
    }

    /// Number of domains with loaded directives
    pub fn loaded_domains(&self) -> usize {
        let domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
        domains.values().filter(|cell| cell.initialized()).count()
    }
}

/// Cache key for a URL's origin: scheme, lowercase host and any non-default port
pub fn directive_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}
