// tests/providers_github.rs
use chrono::NaiveDate;
use comfy_intel_digest::ingest::providers::GithubSearchProvider;
use comfy_intel_digest::ingest::types::{SourceKind, SourceProvider, SourceUnavailable};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_JSON: &str = include_str!("fixtures/github_search.json");

fn provider(base: &str) -> GithubSearchProvider {
    GithubSearchProvider::from_api(base, reqwest::Client::new(), "comfyui nodes", 7, 5)
        .with_today(NaiveDate::from_ymd_opt(2025, 10, 8).unwrap())
}

#[tokio::test]
async fn search_query_carries_date_bound_sort_and_cap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("q", "comfyui nodes created:>2025-10-01"))
        .and(query_param("sort", "stars"))
        .and(query_param("order", "desc"))
        .and(query_param("per_page", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SEARCH_JSON, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let items = provider(&server.uri()).fetch_latest().await.expect("search ok");
    assert_eq!(items.len(), 5);
    assert!(items.iter().all(|e| e.source == SourceKind::Search));
    assert_eq!(items[0].title, "ComfyUI-TiledKSampler-Pro");
    assert_eq!(items[0].popularity, Some(812));
    assert!(items[2].body.is_none());
    // native order is kept (already stars-desc)
    let stars: Vec<_> = items.iter().map(|e| e.popularity.unwrap()).collect();
    assert_eq!(stars, vec![812, 355, 120, 64, 31]);
}

#[tokio::test]
async fn rate_limited_search_is_source_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(ResponseTemplate::new(403).set_body_string(r#"{"message":"API rate limit exceeded"}"#))
        .mount(&server)
        .await;

    let err = provider(&server.uri()).fetch_latest().await.unwrap_err();
    assert!(matches!(err, SourceUnavailable::HttpStatus(403)), "{err:?}");
}

#[tokio::test]
async fn non_json_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = provider(&server.uri()).fetch_latest().await.unwrap_err();
    assert!(matches!(err, SourceUnavailable::Parse(_)), "{err:?}");
}
