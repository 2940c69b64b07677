//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the real
//! HTTP fetcher and robots.txt source through full crawls.

use polite_crawl::config::{
    Config, CrawlerConfig, RateLimiterConfig, RetryConfig, UserAgentConfig,
};
use polite_crawl::crawler::Coordinator;
use polite_crawl::CrawlReport;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling from the root of `base_url`
fn create_test_config(base_url: &str, max_pages: usize, concurrency_limit: usize) -> Config {
    Config {
        seeds: vec![format!("{}/", base_url)],
        crawler: CrawlerConfig {
            max_pages,
            delay_between_batches: 0.0,
            concurrency_limit,
            same_domain_only: true,
        },
        retry: RetryConfig {
            initial_timeout: 5.0,
            ..RetryConfig::default()
        },
        rate_limiter: RateLimiterConfig::None,
        user_agent: UserAgentConfig {
            agents: vec!["TestBot/1.0".to_string(), "OtherBot/2.0".to_string()],
        },
    }
}

fn html(links: &[&str]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();

    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", anchors))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, page: &str, links: &[&str]) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(links))
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn crawl(config: Config) -> CrawlReport {
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    coordinator.run().await
}

fn paths(urls: &[url::Url]) -> HashSet<String> {
    urls.iter().map(|u| u.path().to_string()).collect()
}

#[tokio::test]
async fn test_budget_exhausted_before_deeper_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(
        &mock_server,
        "/",
        &["/b", "/c", "/d", "https://elsewhere.invalid/page"],
    )
    .await;
    mount_page(&mock_server, "/b", &["/e"]).await;
    mount_page(&mock_server, "/c", &[]).await;
    mount_page(&mock_server, "/d", &[]).await;

    Mock::given(method("GET"))
        .and(path("/e"))
        .respond_with(html(&[]))
        .expect(0)
        .mount(&mock_server)
        .await;

    let report = crawl(create_test_config(&base_url, 3, 2)).await;

    assert_eq!(report.stats.visited_count, 3);
    assert!(paths(&report.succeeded).contains("/"));
    assert!(report
        .visited()
        .all(|u| u.host_str() == Some("127.0.0.1")));
    assert!(report.stats.queue_size_remaining >= 1);
}

#[tokio::test]
async fn test_robots_disallowed_path_is_never_requested() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nDisallow: /private").await;
    mount_page(&mock_server, "/", &["/private/secret", "/public"]).await;
    mount_page(&mock_server, "/public", &[]).await;

    Mock::given(method("GET"))
        .and(path("/private/secret"))
        .respond_with(html(&[]))
        .expect(0)
        .mount(&mock_server)
        .await;

    let report = crawl(create_test_config(&base_url, 10, 2)).await;

    assert_eq!(
        paths(&report.succeeded),
        HashSet::from(["/".to_string(), "/public".to_string()])
    );
    assert_eq!(
        paths(&report.failed),
        HashSet::from(["/private/secret".to_string()])
    );
}

#[tokio::test]
async fn test_missing_robots_is_permissive() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/", &["/next"]).await;
    mount_page(&mock_server, "/next", &[]).await;

    let report = crawl(create_test_config(&base_url, 10, 2)).await;

    assert_eq!(report.stats.succeeded_count, 2);
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn test_not_found_is_skipped_without_retry() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(&mock_server, "/", &["/missing", "/ok"]).await;
    mount_page(&mock_server, "/ok", &[]).await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let start = Instant::now();
    let report = crawl(create_test_config(&base_url, 10, 2)).await;

    assert_eq!(paths(&report.failed), HashSet::from(["/missing".to_string()]));
    assert_eq!(report.stats.succeeded_count, 2);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_rate_limited_page_exhausts_retries() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(&mock_server, "/", &["/busy"]).await;

    // max_retries = 1: the initial attempt plus one retry
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url, 10, 2);
    config.retry.max_retries = 1;

    let start = Instant::now();
    let report = crawl(config).await;

    assert_eq!(paths(&report.failed), HashSet::from(["/busy".to_string()]));
    assert_eq!(paths(&report.succeeded), HashSet::from(["/".to_string()]));
    // One backoff of base^0 = 1s plus jitter
    assert!(start.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_server_error_recovers_on_retry() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(&mock_server, "/", &["/flaky"]).await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/flaky", &["/after"]).await;
    mount_page(&mock_server, "/after", &[]).await;

    let report = crawl(create_test_config(&base_url, 10, 2)).await;

    assert_eq!(
        paths(&report.succeeded),
        HashSet::from(["/".to_string(), "/flaky".to_string(), "/after".to_string()])
    );
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn test_forbidden_retries_with_another_identity() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(&mock_server, "/", &["/members"]).await;

    Mock::given(method("GET"))
        .and(path("/members"))
        .and(wiremock::matchers::header("user-agent", "TestBot/1.0"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/members"))
        .and(wiremock::matchers::header("user-agent", "OtherBot/2.0"))
        .respond_with(html(&[]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = crawl(create_test_config(&base_url, 10, 2)).await;

    assert!(paths(&report.succeeded).contains("/members"));
}

#[tokio::test]
async fn test_files_are_recorded_not_fetched() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(&mock_server, "/", &["/report.pdf", "/img/logo.PNG", "/about"]).await;
    mount_page(&mock_server, "/about", &["/report.pdf"]).await;

    for file in ["/report.pdf", "/img/logo.PNG"] {
        Mock::given(method("GET"))
            .and(path(file))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;
    }

    let report = crawl(create_test_config(&base_url, 10, 2)).await;

    assert_eq!(report.stats.files_found, 2);
    assert_eq!(
        report
            .files
            .iter()
            .map(|f| url::Url::parse(f).unwrap().path().to_string())
            .collect::<HashSet<_>>(),
        HashSet::from(["/report.pdf".to_string(), "/img/logo.PNG".to_string()])
    );
    assert_eq!(report.stats.succeeded_count, 2);
}

#[tokio::test]
async fn test_redirect_followed_by_client() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(&mock_server, "/", &["/old"]).await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/new", &["next"]).await;
    mount_page(&mock_server, "/next", &[]).await;

    let report = crawl(create_test_config(&base_url, 10, 1)).await;

    // Links on the redirect target resolve against its URL
    assert_eq!(
        paths(&report.succeeded),
        HashSet::from(["/".to_string(), "/old".to_string(), "/next".to_string()])
    );
}

#[tokio::test]
async fn test_token_bucket_paces_requests() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(&mock_server, "/", &["/1", "/2", "/3", "/4"]).await;
    for page in ["/1", "/2", "/3", "/4"] {
        mount_page(&mock_server, page, &[]).await;
    }

    let mut config = create_test_config(&base_url, 10, 5);
    config.rate_limiter = RateLimiterConfig::TokenBucket {
        capacity: 2,
        window: 1.0,
    };

    let start = Instant::now();
    let report = crawl(config).await;

    assert_eq!(report.stats.succeeded_count, 5);
    // Two tokens up front, then one every 500ms for the remaining three
    assert!(start.elapsed() >= Duration::from_millis(1400));
}
