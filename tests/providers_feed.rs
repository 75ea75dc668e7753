// tests/providers_feed.rs
use comfy_intel_digest::ingest::providers::FeedProvider;
use comfy_intel_digest::ingest::types::{SourceKind, SourceProvider, SourceUnavailable};
use comfy_intel_digest::translate::sanitize;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ATOM: &str = include_str!("fixtures/reddit_top.atom");

#[tokio::test]
async fn reddit_atom_fixture_parses() {
    let provider = FeedProvider::from_fixture_str(ATOM, 10);
    let items = provider.fetch_latest().await.expect("atom parse ok");

    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|e| e.source == SourceKind::Feed));
    assert_eq!(items[0].title, "Tiled upscaler workflow for 8GB cards");
    assert_eq!(
        items[0].url.as_deref(),
        Some("https://www.reddit.com/r/comfyui/comments/1o0aaaa/tiled_upscaler/")
    );
    assert_eq!(items[1].title, r#"Wan 2.2 "first frame" comparison"#);
    assert!(items[0].published_at.is_some());

    let body = sanitize(items[0].body.as_deref().unwrap(), 250);
    assert_eq!(
        body,
        "I built a tiled upscaler workflow that runs on 8GB VRAM & keeps faces sharp."
    );
    // link-only post: nothing left but the footer
    assert_eq!(sanitize(items[1].body.as_deref().unwrap(), 250), "");
}

#[tokio::test]
async fn top_k_limit_applies() {
    let provider = FeedProvider::from_fixture_str(ATOM, 2);
    let items = provider.fetch_latest().await.unwrap();
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn http_feed_is_fetched_with_browser_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/comfyui/top/.rss"))
        .and(query_param("t", "day"))
        .and(wiremock::matchers::header_regex("user-agent", "Mozilla/5.0"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ATOM, "application/atom+xml"))
        .mount(&server)
        .await;

    let cfg = comfy_intel_digest::DigestConfig {
        feed_url_base: format!("{}/r/comfyui", server.uri()),
        ..Default::default()
    };
    let client = comfy_intel_digest::ingest::build_http_client(&cfg).unwrap();
    let provider = FeedProvider::from_url(cfg.feed_url(), client, cfg.feed_limit);
    let items = provider.fetch_latest().await.expect("fetch ok");
    assert_eq!(items.len(), 3);
}

#[tokio::test]
async fn http_error_status_is_source_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let provider = FeedProvider::from_url(
        format!("{}/r/comfyui/new/.rss", server.uri()),
        reqwest::Client::new(),
        10,
    );
    let err = provider.fetch_latest().await.unwrap_err();
    assert!(matches!(err, SourceUnavailable::HttpStatus(429)), "{err:?}");
}
