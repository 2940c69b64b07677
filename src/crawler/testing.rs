//! In-memory doubles for crawler unit tests

use crate::crawler::{FetchFailure, FetchResponse, LinkExtractor, PageFetcher};
use crate::robots::{DirectiveError, DirectiveSource};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

pub fn ok(target: &str) -> Result<FetchResponse, FetchFailure> {
    Ok(FetchResponse {
        status: 200,
        final_url: url(target),
        location: None,
        body: String::new(),
    })
}

pub fn status(target: &str, code: u16) -> Result<FetchResponse, FetchFailure> {
    Ok(FetchResponse {
        status: code,
        final_url: url(target),
        location: None,
        body: String::new(),
    })
}

pub fn redirect(target: &str, location: Option<&str>) -> Result<FetchResponse, FetchFailure> {
    Ok(FetchResponse {
        status: 302,
        final_url: url(target),
        location: location.map(url),
        body: String::new(),
    })
}

/// One recorded call to [`ScriptedFetcher`]
#[derive(Debug, Clone)]
pub struct Call {
    pub url: String,
    pub agent: String,
    pub timeout: Duration,
}

/// Replays a per-URL script of results; the last entry repeats forever
///
/// URLs without a script answer 200 with an empty body.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Result<FetchResponse, FetchFailure>>>>,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, target: &str, results: Vec<Result<FetchResponse, FetchFailure>>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(url(target).to_string(), results.into());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of concurrent fetches observed
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls_to(&self, target: &str) -> usize {
        let target = url(target).to_string();
        self.calls().iter().filter(|c| c.url == target).count()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        target: &Url,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<FetchResponse, FetchFailure> {
        self.calls.lock().unwrap().push(Call {
            url: target.to_string(),
            agent: user_agent.to_string(),
            timeout,
        });

        let next = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(target.as_str()) {
                Some(script) if script.len() > 1 => script.pop_front(),
                Some(script) => script.front().cloned(),
                None => None,
            }
        };

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        next.unwrap_or_else(|| ok(target.as_str()))
    }
}

/// Link graph keyed by page URL; the document body is ignored
#[derive(Default)]
pub struct GraphExtractor {
    edges: HashMap<String, Vec<String>>,
}

impl GraphExtractor {
    pub fn new(edges: &[(&str, &[&str])]) -> Arc<Self> {
        Arc::new(Self {
            edges: edges
                .iter()
                .map(|(from, to)| {
                    (
                        url(from).to_string(),
                        to.iter().map(|s| s.to_string()).collect(),
                    )
                })
                .collect(),
        })
    }
}

impl LinkExtractor for GraphExtractor {
    fn extract(&self, _body: &str, base: &Url) -> Vec<String> {
        self.edges.get(base.as_str()).cloned().unwrap_or_default()
    }
}

/// Serves the same robots.txt body for every domain, or fails every load
pub struct StaticSource {
    body: Option<&'static str>,
}

impl StaticSource {
    pub fn allow_all() -> Arc<Self> {
        Arc::new(Self {
            body: Some("User-agent: *\nAllow: /"),
        })
    }

    pub fn with_body(body: &'static str) -> Arc<Self> {
        Arc::new(Self { body: Some(body) })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { body: None })
    }
}

#[async_trait]
impl DirectiveSource for StaticSource {
    async fn fetch(&self, _origin: &Url, _agent: &str) -> Result<String, DirectiveError> {
        self.body
            .map(str::to_string)
            .ok_or_else(|| DirectiveError::Transport("unreachable".to_string()))
    }
}
