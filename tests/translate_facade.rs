// tests/translate_facade.rs
use std::sync::Arc;

use comfy_intel_digest::translate::{
    has_residual_markup, sanitize, GoogleWebTranslator, TextFacade,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn facade(server: &MockServer) -> TextFacade {
    TextFacade::new(Arc::new(GoogleWebTranslator::new(
        reqwest::Client::new(),
        server.uri(),
        "zh-CN".to_string(),
    )))
}

#[tokio::test]
async fn translates_sanitized_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/translate_a/single"))
        .and(query_param("tl", "zh-CN"))
        .and(query_param("q", "New upscaler node"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"[[["新的放大节点","New upscaler node",null,null,10]],null,"en"]"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let out = facade(&server)
        .sanitize_and_translate("<p>New&nbsp;upscaler <b>node</b></p>", 250)
        .await;
    assert_eq!(out, "新的放大节点");
}

#[tokio::test]
async fn failure_falls_back_to_sanitized_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let raw = "<div>Workflow &amp; nodes for <i>video</i> upscaling</div>";
    let out = facade(&server).sanitize_and_translate(raw, 250).await;
    assert_eq!(out, sanitize(raw, 250));
    assert!(!out.is_empty());
    assert!(!has_residual_markup(&out));
}

#[tokio::test]
async fn unreachable_translator_falls_back() {
    // nothing listens on port 9 on a test box
    let f = TextFacade::new(Arc::new(GoogleWebTranslator::new(
        reqwest::Client::new(),
        "http://127.0.0.1:9".to_string(),
        "zh-CN".to_string(),
    )));
    assert_eq!(
        f.sanitize_and_translate("hello world", 250).await,
        "hello world"
    );
}
