//! HTML link extraction
//!
//! Fetched documents are handed to a [`LinkExtractor`], which turns them into
//! candidate absolute URLs. The default [`HtmlLinkExtractor`] reads anchors
//! with `scraper`; callers can plug their own extractor into the coordinator.

use scraper::{Html, Selector};
use url::Url;

/// Produces candidate absolute URLs from a fetched document
pub trait LinkExtractor: Send + Sync {
    /// Returns absolute http(s) URLs found in `body`, resolved against `base`
    fn extract(&self, body: &str, base: &Url) -> Vec<String>;
}

/// Extracts `<a href>` targets from HTML documents
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document, `rel="nofollow"` included
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
/// - Anything that does not resolve to http or https
///
/// # Example
///
/// ```
/// use polite_crawl::crawler::{HtmlLinkExtractor, LinkExtractor};
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a></body></html>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// let links = HtmlLinkExtractor::new().extract(html, &base);
/// assert_eq!(links, vec!["https://example.com/page".to_string()]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl HtmlLinkExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, body: &str, base: &Url) -> Vec<String> {
        let Ok(anchors) = Selector::parse("a[href]") else {
            return Vec::new();
        };
        let document = Html::parse_document(body);

        document
            .select(&anchors)
            .filter(|element| element.value().attr("download").is_none())
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| resolve_link(href, base))
            .collect()
    }
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}
