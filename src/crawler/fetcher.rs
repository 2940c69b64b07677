//! HTTP fetcher implementation
//!
//! This module performs the single network round trip behind each fetch
//! attempt. It does not retry or classify statuses; that is the executor's
//! job. It only reports what came back:
//! - the final status and URL after the client's own redirect handling
//! - any `Location` header left on a 3xx response
//! - the body, for 2xx responses
//! - a transport failure, split into timeout / connection / other

use async_trait::async_trait;
use reqwest::{header, redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Redirect hops the HTTP client follows on its own
pub const MAX_REDIRECTS: usize = 10;

/// What came back from one request
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// URL the response was served from
    pub final_url: Url,
    /// Resolved `Location` header, kept only on 3xx responses
    pub location: Option<Url>,
    /// Document body, empty unless the status is 2xx
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

/// Transport-level failure of one request
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for FetchFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchFailure::Timeout
        } else if e.is_connect() {
            FetchFailure::Connect(e.to_string())
        } else {
            FetchFailure::Other(e.to_string())
        }
    }
}

/// Performs one network fetch
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` presenting `user_agent`, giving up after `timeout`
    async fn fetch(
        &self,
        url: &Url,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<FetchResponse, FetchFailure>;
}

/// Builds the HTTP client shared by the fetcher and the directive source
///
/// The user agent is not baked into the client; every request carries the
/// identity chosen for that attempt.
///
/// # Example
///
/// ```no_run
/// use polite_crawl::crawler::build_http_client;
///
/// let client = build_http_client().unwrap();
/// ```
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageFetcher`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &Url,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<FetchResponse, FetchFailure> {
        let response = self
            .client
            .get(url.clone())
            .header(header::USER_AGENT, user_agent)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        let final_url = response.url().clone();

        let location = if status.is_redirection() {
            response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| final_url.join(v).ok())
        } else {
            None
        };

        let body = if status.is_success() {
            response.text().await?
        } else {
            String::new()
        };

        Ok(FetchResponse {
            status: status.as_u16(),
            final_url,
            location,
            body,
        })
    }
}
