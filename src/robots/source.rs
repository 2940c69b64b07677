//! Where directive documents come from

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Why a directive document could not be loaded
#[derive(Debug, Error)]
pub enum DirectiveError {
    #[error("robots.txt returned HTTP {0}")]
    Status(u16),

    #[error("robots.txt request failed: {0}")]
    Transport(String),
}

/// Supplies the raw robots.txt text for a site
#[async_trait]
pub trait DirectiveSource: Send + Sync {
    /// Fetches the directive document for the site `origin` belongs to
    async fn fetch(&self, origin: &Url, user_agent: &str) -> Result<String, DirectiveError>;
}

/// Fetches `/robots.txt` over HTTP
#[derive(Debug, Clone)]
pub struct HttpDirectiveSource {
    client: Client,
    timeout: Duration,
}

impl HttpDirectiveSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Location of the robots.txt document for the site `url` belongs to
pub fn robots_url(url: &Url) -> Result<Url, url::ParseError> {
    url.join("/robots.txt")
}

#[async_trait]
impl DirectiveSource for HttpDirectiveSource {
    async fn fetch(&self, origin: &Url, user_agent: &str) -> Result<String, DirectiveError> {
        let target = robots_url(origin).map_err(|e| DirectiveError::Transport(e.to_string()))?;

        let response = self
            .client
            .get(target)
            .header(reqwest::header::USER_AGENT, user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DirectiveError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectiveError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| DirectiveError::Transport(e.to_string()))
    }
}
