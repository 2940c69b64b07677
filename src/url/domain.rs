use std::net::IpAddr;
use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// The port is not part of the domain.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use polite_crawl::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Reduces a host to its registrable domain
///
/// The registrable domain is approximated as the last two labels of the host
/// (`blog.example.com` -> `example.com`). IP literals and single-label hosts
/// such as `localhost` are returned whole.
///
/// # Examples
///
/// ```
/// use polite_crawl::url::registrable_domain;
///
/// assert_eq!(registrable_domain("api.v2.example.com"), "example.com");
/// assert_eq!(registrable_domain("127.0.0.1"), "127.0.0.1");
/// ```
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();

    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() {
        return host;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host;
    }

    labels[labels.len() - 2..].join(".")
}
