//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the listing and detail
//! endpoints and exercise discovery, retry policy, and the concurrent
//! fan-out end-to-end.

use posting_harvester::config::{
    Config, EndpointConfig, FetchConfig, OutputConfig, SearchConfig,
};
use posting_harvester::crawler::{
    build_http_client, run_harvest, CandidateId, CandidateSet, ConcurrencyGate, Coordinator,
    DetailFetcher, FetchFailure, FetchOutcome, RetryPolicy,
};
use posting_harvester::output::write_postings_csv;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use url::Url;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Creates a test configuration pointing both endpoints at the mock server
fn create_test_config(base_url: &str, keywords: &[&str], locations: &[&str], pages: u32) -> Config {
    Config {
        search: SearchConfig {
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            locations: locations.iter().map(|s| s.to_string()).collect(),
            pages,
            page_size: 10,
        },
        fetch: FetchConfig {
            max_concurrent_requests: 3,
            max_attempts: 3,
            base_backoff_ms: 1, // Very short for testing
            max_jitter_ms: 0,
            request_timeout_ms: 2_000,
            user_agent: "TestAgent/1.0".to_string(),
        },
        endpoints: EndpointConfig {
            listing_url: format!("{}/search", base_url),
            detail_url: format!("{}/posting", base_url),
        },
        output: OutputConfig {
            csv_path: "./unused.csv".to_string(),
        },
    }
}

fn listing_html(ids: &[&str]) -> String {
    let entries: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<li><div class="base-card" data-entity-urn="urn:li:jobPosting:{}"></div></li>"#,
                id
            )
        })
        .collect();
    format!("<html><body><ul>{}<li><span>ad</span></li></ul></body></html>", entries)
}

fn detail_html(title: &str) -> String {
    format!(
        r#"<html><body>
        <h2 class="top-card-layout__title">{}</h2>
        <a class="topcard__org-name-link" href="https://example.com/company/acme">Acme</a>
        <span class="topcard__flavor--bullet">Remote</span>
        <div class="description__text">Do things.</div>
        </body></html>"#,
        title
    )
}

fn html_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

async fn mount_listing(server: &MockServer, keyword: &str, start: &str, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("keywords", keyword))
        .and(query_param("start", start))
        .respond_with(html_response(listing_html(ids)))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/posting/{}", id)))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn requests_to(server: &MockServer, prefix: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .into_iter()
        .filter(|r| r.url.path().starts_with(prefix))
        .collect()
}

fn fetcher_for(server: &MockServer, max_attempts: u32, timeout: Duration) -> DetailFetcher {
    let fetch = FetchConfig {
        request_timeout_ms: timeout.as_millis() as u64,
        ..FetchConfig::default()
    };
    let client = build_http_client(&fetch).expect("client builds");

    DetailFetcher::new(
        client,
        ConcurrencyGate::new(3),
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_jitter: Duration::ZERO,
        },
        Url::parse(&format!("{}/posting", server.uri())).unwrap(),
        timeout,
    )
}

fn id(raw: &str) -> CandidateId {
    CandidateId::new(raw).unwrap()
}

#[tokio::test]
async fn test_full_harvest_deduplicates_across_terms() {
    let mock_server = MockServer::start().await;

    // Overlapping ids across terms and pages
    mount_listing(&mock_server, "Backend", "0", &["1", "2"]).await;
    mount_listing(&mock_server, "Backend", "10", &["2", "3"]).await;
    mount_listing(&mock_server, "Python", "0", &["3", "4"]).await;
    mount_listing(&mock_server, "Python", "10", &["1"]).await;

    for id in ["1", "2", "3", "4"] {
        mount_detail(&mock_server, id, html_response(detail_html(&format!("Job {}", id)))).await;
    }

    let config = create_test_config(&mock_server.uri(), &["Backend", "Python"], &["Remote"], 2);
    let coordinator = Coordinator::new(&config).expect("Failed to create coordinator");
    let report = coordinator.run().await;

    assert_eq!(report.postings.len(), 4);
    assert_eq!(report.stats.candidates, 4);
    assert_eq!(report.stats.listing_pages_fetched, 4);
    assert_eq!(report.stats.listing_pages_failed, 0);

    // Each detail page fetched exactly once
    let detail_requests = requests_to(&mock_server, "/posting/").await;
    assert_eq!(detail_requests.len(), 4);
    let paths: HashSet<String> = detail_requests
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(paths.len(), 4);

    // Postings carry their detail link
    let links: HashSet<String> = report
        .postings
        .iter()
        .map(|p| p.job_posting_link.clone())
        .collect();
    assert!(links.contains(&format!("{}/posting/3", mock_server.uri())));
    assert!(report.postings.iter().all(|p| p.org_name == "Acme"));
}

#[tokio::test]
async fn test_discovery_survives_failed_page() {
    let mock_server = MockServer::start().await;

    mount_listing(&mock_server, "Backend", "0", &["1"]).await;
    mount_listing(&mock_server, "Backend", "10", &["2"]).await;
    mount_listing(&mock_server, "Backend", "20", &["3"]).await;
    mount_listing(&mock_server, "Python", "0", &["4"]).await;
    mount_listing(&mock_server, "Python", "20", &["6"]).await;

    // The sixth page errors
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("keywords", "Python"))
        .and(query_param("start", "10"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &["Backend", "Python"], &["Remote"], 3);
    let coordinator = Coordinator::new(&config).unwrap();

    let terms = coordinator.search_terms().to_vec();
    let discovery = posting_harvester::crawler::ListingDiscovery::new(
        build_http_client(&config.fetch).unwrap(),
        Url::parse(&config.endpoints.listing_url).unwrap(),
        config.search.pages,
        config.search.page_size,
        config.fetch.request_timeout(),
    );
    let report = discovery.discover(&terms).await;

    assert_eq!(report.pages_fetched, 5);
    assert_eq!(report.pages_failed, 1);

    let found: HashSet<String> = report
        .candidates
        .iter()
        .map(|c| c.as_str().to_string())
        .collect();
    let expected: HashSet<String> = ["1", "2", "3", "4", "6"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(found, expected);
}

#[tokio::test]
async fn test_discovery_is_sequential_and_ordered() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html_response(listing_html(&[])))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &["A", "B"], &["X", "Y"], 2);
    let coordinator = Coordinator::new(&config).unwrap();
    let report = coordinator.run().await;

    assert!(report.postings.is_empty());
    assert_eq!(report.stats.candidates, 0);

    let order: Vec<(String, String, String)> = requests_to(&mock_server, "/search")
        .await
        .iter()
        .map(|r| {
            let get = |key: &str| {
                r.url
                    .query_pairs()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.into_owned())
                    .unwrap_or_default()
            };
            (get("keywords"), get("location"), get("start"))
        })
        .collect();

    let expected: Vec<(String, String, String)> = [
        ("A", "X", "0"),
        ("A", "X", "10"),
        ("A", "Y", "0"),
        ("A", "Y", "10"),
        ("B", "X", "0"),
        ("B", "X", "10"),
        ("B", "Y", "0"),
        ("B", "Y", "10"),
    ]
    .iter()
    .map(|(k, l, s)| (k.to_string(), l.to_string(), s.to_string()))
    .collect();

    assert_eq!(order, expected);
}

#[tokio::test]
async fn test_rate_limited_candidate_uses_exact_budget() {
    let mock_server = MockServer::start().await;
    mount_detail(&mock_server, "77", ResponseTemplate::new(429)).await;

    let fetcher = fetcher_for(&mock_server, 4, Duration::from_secs(2));
    let outcome = fetcher.fetch(id("77")).await;

    assert_eq!(
        outcome,
        FetchOutcome::Failed(FetchFailure::Exhausted {
            attempts: 4,
            last_error: "HTTP 429".to_string()
        })
    );
    assert_eq!(requests_to(&mock_server, "/posting/77").await.len(), 4);
    assert_eq!(fetcher.gate().acquisitions(), 4);
    assert_eq!(fetcher.gate().in_flight(), 0);
}

#[tokio::test]
async fn test_terminal_status_is_not_retried() {
    let mock_server = MockServer::start().await;
    mount_detail(&mock_server, "404", ResponseTemplate::new(404)).await;
    mount_detail(&mock_server, "503", ResponseTemplate::new(503)).await;

    let fetcher = fetcher_for(&mock_server, 5, Duration::from_secs(2));

    assert_eq!(
        fetcher.fetch(id("404")).await,
        FetchOutcome::Failed(FetchFailure::Status(404))
    );
    assert_eq!(
        fetcher.fetch(id("503")).await,
        FetchOutcome::Failed(FetchFailure::Status(503))
    );

    assert_eq!(requests_to(&mock_server, "/posting/404").await.len(), 1);
    assert_eq!(requests_to(&mock_server, "/posting/503").await.len(), 1);
}

#[tokio::test]
async fn test_page_without_title_is_empty_and_not_retried() {
    let mock_server = MockServer::start().await;
    mount_detail(
        &mock_server,
        "5",
        html_response("<html><body><p>Posting closed</p></body></html>".to_string()),
    )
    .await;

    let fetcher = fetcher_for(&mock_server, 5, Duration::from_secs(2));

    assert_eq!(fetcher.fetch(id("5")).await, FetchOutcome::Empty);
    assert_eq!(requests_to(&mock_server, "/posting/5").await.len(), 1);
}

#[tokio::test]
async fn test_rate_limit_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/posting/9"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    mount_detail(&mock_server, "9", html_response(detail_html("Rust Developer"))).await;

    let fetcher = fetcher_for(&mock_server, 5, Duration::from_secs(2));
    let outcome = fetcher.fetch(id("9")).await;

    match outcome {
        FetchOutcome::Success(posting) => {
            assert_eq!(posting.title, "Rust Developer");
            assert_eq!(
                posting.job_posting_link,
                format!("{}/posting/9", mock_server.uri())
            );
        }
        other => panic!("expected success, got {:?}", other),
    }
    assert_eq!(requests_to(&mock_server, "/posting/9").await.len(), 3);
}

#[tokio::test]
async fn test_timeout_is_retried_until_budget_spent() {
    let mock_server = MockServer::start().await;
    mount_detail(
        &mock_server,
        "slow",
        html_response(detail_html("Slow Job")).set_delay(Duration::from_millis(500)),
    )
    .await;

    let fetcher = fetcher_for(&mock_server, 2, Duration::from_millis(100));
    let outcome = fetcher.fetch(id("slow")).await;

    match outcome {
        FetchOutcome::Failed(FetchFailure::Exhausted { attempts, .. }) => assert_eq!(attempts, 2),
        other => panic!("expected exhausted retries, got {:?}", other),
    }
    assert_eq!(requests_to(&mock_server, "/posting/slow").await.len(), 2);
}

#[tokio::test]
async fn test_gate_bounds_in_flight_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/posting/\d+$"))
        .respond_with(html_response(detail_html("Job")).set_delay(Duration::from_millis(50)))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), &["Rust"], &["Remote"], 1);
    config.fetch.max_concurrent_requests = 2;
    let coordinator = Coordinator::new(&config).unwrap();

    let candidates: CandidateSet = (0..12).map(|n| id(&n.to_string())).collect();
    let (postings, tally) = coordinator.fetch_all(candidates).await;

    assert_eq!(postings.len(), 12);
    assert_eq!(tally.succeeded, 12);
    assert!(coordinator.gate().peak() <= 2);
    assert!(coordinator.gate().peak() >= 1);
    assert_eq!(coordinator.gate().in_flight(), 0);
}

#[tokio::test]
async fn test_partial_failures_are_isolated() {
    let mock_server = MockServer::start().await;

    for ok in ["1", "2", "3", "4"] {
        mount_detail(&mock_server, ok, html_response(detail_html("Job"))).await;
    }
    mount_detail(&mock_server, "5", ResponseTemplate::new(404)).await;
    mount_detail(&mock_server, "6", ResponseTemplate::new(429)).await;

    let config = create_test_config(&mock_server.uri(), &["Rust"], &["Remote"], 1);
    let coordinator = Coordinator::new(&config).unwrap();

    let candidates: CandidateSet = ["1", "2", "3", "4", "5", "6"].iter().map(|s| id(s)).collect();
    let (postings, tally) = coordinator.fetch_all(candidates).await;

    assert_eq!(postings.len(), 4);
    assert_eq!(tally.succeeded, 4);
    assert_eq!(tally.failed, 2);
    assert_eq!(tally.empty, 0);
}

#[tokio::test]
async fn test_harvest_to_csv() {
    let mock_server = MockServer::start().await;

    mount_listing(&mock_server, "Rust", "0", &["10", "11"]).await;
    mount_detail(&mock_server, "10", html_response(detail_html("Rust Engineer"))).await;
    mount_detail(&mock_server, "11", ResponseTemplate::new(410)).await;

    let config = create_test_config(&mock_server.uri(), &["Rust"], &["Remote"], 1);
    let report = run_harvest(&config).await.unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    let csv_path = dir.path().join("out").join("postings.csv");
    write_postings_csv(&report.postings, &csv_path).unwrap();

    let content = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        "title,location,org_name,org_link,description,job_posting_link"
    );
    assert!(lines[1].starts_with("Rust Engineer,Remote,Acme,"));
    assert_eq!(report.stats.failed, 1);
}

#[tokio::test]
async fn test_gate_slot_is_free_during_backoff() {
    let mock_server = MockServer::start().await;
    mount_detail(&mock_server, "limited", ResponseTemplate::new(429)).await;
    mount_detail(&mock_server, "open", html_response(detail_html("Open Job"))).await;

    let fetch = FetchConfig::default();
    let fetcher = DetailFetcher::new(
        build_http_client(&fetch).unwrap(),
        ConcurrencyGate::new(1),
        RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(800),
            max_jitter: Duration::ZERO,
        },
        Url::parse(&format!("{}/posting", mock_server.uri())).unwrap(),
        Duration::from_secs(2),
    );

    let limited = fetcher.fetch(id("limited"));
    let open = async {
        // Let the first attempt land and enter its backoff
        tokio::time::sleep(Duration::from_millis(100)).await;
        let started = Instant::now();
        let outcome = fetcher.fetch(id("open")).await;
        (outcome, started.elapsed())
    };

    let (limited_outcome, (open_outcome, open_elapsed)) = tokio::join!(limited, open);

    assert!(open_outcome.is_success());
    assert!(
        open_elapsed < Duration::from_millis(500),
        "second fetch waited {:?} for the only slot",
        open_elapsed
    );
    assert_eq!(
        limited_outcome,
        FetchOutcome::Failed(FetchFailure::Exhausted {
            attempts: 2,
            last_error: "HTTP 429".to_string()
        })
    );
    assert_eq!(fetcher.gate().peak(), 1);
    assert_eq!(fetcher.gate().in_flight(), 0);
}

#[tokio::test]
async fn test_connection_error_is_retried_until_budget_spent() {
    // Bind then drop a listener so the port refuses connections
    let closed_port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let fetch = FetchConfig::default();
    let fetcher = DetailFetcher::new(
        build_http_client(&fetch).unwrap(),
        ConcurrencyGate::new(3),
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_jitter: Duration::ZERO,
        },
        Url::parse(&format!("http://127.0.0.1:{}/posting", closed_port)).unwrap(),
        Duration::from_secs(2),
    );

    match fetcher.fetch(id("1")).await {
        FetchOutcome::Failed(FetchFailure::Exhausted {
            attempts,
            last_error,
        }) => {
            assert_eq!(attempts, 3);
            assert_ne!(last_error, "HTTP 429");
            assert_ne!(last_error, "request timeout");
        }
        other => panic!("expected exhausted retries, got {:?}", other),
    }
    assert_eq!(fetcher.gate().acquisitions(), 3);
    assert_eq!(fetcher.gate().in_flight(), 0);
}
