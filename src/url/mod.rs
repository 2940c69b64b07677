//! URL handling module for Polite-Crawl
//!
//! This module provides URL normalization, domain extraction and the
//! classification of candidate links into crawlable documents, non-document
//! files and off-site URLs.

mod domain;
mod normalize;

use ::url::Url;
use std::collections::HashSet;

// Re-export main functions
pub use domain::{extract_domain, registrable_domain};
pub use normalize::normalize_url;

/// File extensions that mark a URL as a non-document resource
pub const NON_DOCUMENT_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".ico", ".zip", ".tar", ".gz", ".rar", ".7z",
    ".mp3", ".mp4", ".avi", ".mov", ".wmv", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx",
    ".xml", ".json", ".csv", ".txt", ".css", ".js", ".woff", ".woff2", ".ttf", ".eot",
];

/// Link classification types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkClassification {
    /// Same-site document - goes to the frontier
    Document,
    /// Same-site non-document file - recorded, never fetched
    File,
    /// Outside the crawl boundary - dropped
    OffSite,
}

impl LinkClassification {
    /// Returns true if the link should be enqueued
    pub fn should_crawl(&self) -> bool {
        matches!(self, Self::Document)
    }
}

/// Returns true if the URL path ends with a non-document extension
///
/// The check is case-insensitive and ignores the query string.
pub fn is_non_document(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    NON_DOCUMENT_EXTENSIONS
        .iter()
        .any(|extension| path.ends_with(extension))
}

/// Crawl boundary for discovered links
#[derive(Debug, Clone, Default)]
pub struct LinkScope {
    sites: HashSet<String>,
    same_domain_only: bool,
}

impl LinkScope {
    /// Scope limited to the registrable domains of `seeds`
    pub fn for_seeds<'a>(seeds: impl IntoIterator<Item = &'a Url>, same_domain_only: bool) -> Self {
        let sites = seeds
            .into_iter()
            .filter_map(extract_domain)
            .map(|host| registrable_domain(&host))
            .collect();
        Self {
            sites,
            same_domain_only,
        }
    }

    /// Scope that accepts every host
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &Url) -> bool {
        if !self.same_domain_only {
            return true;
        }
        extract_domain(url).map_or(false, |host| self.sites.contains(&registrable_domain(&host)))
    }
}

/// Classifies a normalized candidate link against the crawl boundary
///
/// Classification order:
/// 1. Off-site (outside the scope's registrable domains)
/// 2. Non-document file
/// 3. Document
///
/// # Examples
///
/// ```
/// use polite_crawl::url::{classify_link, normalize_url, LinkClassification, LinkScope};
///
/// let seed = normalize_url("https://example.com/").unwrap();
/// let scope = LinkScope::for_seeds([&seed], true);
///
/// let url = normalize_url("https://blog.example.com/report.PDF").unwrap();
/// assert_eq!(classify_link(&url, &scope), LinkClassification::File);
///
/// let url = normalize_url("https://other.org/").unwrap();
/// assert_eq!(classify_link(&url, &scope), LinkClassification::OffSite);
/// ```
pub fn classify_link(url: &Url, scope: &LinkScope) -> LinkClassification {
    if !scope.contains(url) {
        return LinkClassification::OffSite;
    }

    if is_non_document(url) {
        return LinkClassification::File;
    }

    LinkClassification::Document
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        normalize_url(s).unwrap()
    }

    fn scope(same_domain_only: bool) -> LinkScope {
        LinkScope::for_seeds([&url("https://www.example.com/")], same_domain_only)
    }

    #[test]
    fn test_classify_same_site_document() {
        assert_eq!(
            classify_link(&url("https://example.com/page"), &scope(true)),
            LinkClassification::Document
        );
        assert_eq!(
            classify_link(&url("https://docs.example.com/page"), &scope(true)),
            LinkClassification::Document
        );
    }

    #[test]
    fn test_classify_off_site() {
        assert_eq!(
            classify_link(&url("https://example.org/page"), &scope(true)),
            LinkClassification::OffSite
        );
    }

    #[test]
    fn test_off_site_allowed_when_unrestricted() {
        assert_eq!(
            classify_link(&url("https://example.org/page"), &scope(false)),
            LinkClassification::Document
        );
    }

    #[test]
    fn test_classify_file() {
        for path in ["/a.pdf", "/img/logo.PNG", "/data.json", "/style.css", "/font.woff2"] {
            let link = url(&format!("https://example.com{}", path));
            assert_eq!(
                classify_link(&link, &scope(true)),
                LinkClassification::File,
                "{} should be a file",
                path
            );
        }
    }

    #[test]
    fn test_query_does_not_hide_extension() {
        let link = url("https://example.com/report.pdf?download=1");
        assert!(is_non_document(&link));

        let link = url("https://example.com/page?format=pdf");
        assert!(!is_non_document(&link));
    }

    #[test]
    fn test_off_site_file_is_off_site() {
        assert_eq!(
            classify_link(&url("https://cdn.other.net/a.pdf"), &scope(true)),
            LinkClassification::OffSite
        );
    }

    #[test]
    fn test_should_crawl() {
        assert!(LinkClassification::Document.should_crawl());
        assert!(!LinkClassification::File.should_crawl());
        assert!(!LinkClassification::OffSite.should_crawl());
    }
}
