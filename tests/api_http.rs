// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /start
// - POST /publish (twice: item, then notice)
// - GET /freshness

use std::sync::Arc;

use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use news_courier::api::{self, AppState};
use news_courier::config::topics::TopicConfig;
use news_courier::format::{MarkupKind, MessageFormatter, TemplateKind};
use news_courier::freshness::FreshnessTracker;
use news_courier::ingest::providers::rss::RssSource;
use news_courier::ingest::types::ContentSource;
use news_courier::notify::LogChannel;
use news_courier::publisher::Publisher;
use news_courier::relevance::{TopicEngine, TopicHandle};
use news_courier::selector::{ItemSelector, SelectionPolicy};

const BODY_LIMIT: usize = 1024 * 1024;
const SAMPLE_XML: &str = include_str!("fixtures/sample_rss.xml");

/// Same router the binary builds, fed by the fixture feed and a log channel.
fn test_router() -> Router {
    let selector = ItemSelector::new(
        vec![Arc::new(RssSource::from_fixture(SAMPLE_XML, "English")) as Arc<dyn ContentSource>],
        TopicHandle::new(
            TopicEngine::new(TopicConfig {
                keywords: vec!["exam".into()],
                exclusions: vec![],
            })
            .unwrap(),
        ),
        Arc::new(FreshnessTracker::new()),
        SelectionPolicy {
            max_attempts: 1,
            ..SelectionPolicy::default()
        },
    );
    let publisher = Publisher::new(
        selector,
        MessageFormatter::for_markup(MarkupKind::Markdown),
        TemplateKind::Caption,
        Arc::new(LogChannel::new()),
    );
    api::router(AppState {
        publisher: Arc::new(publisher),
        interval_secs: 120,
    })
}

async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, String::from_utf8(bytes).expect("utf8"))
}

#[tokio::test]
async fn health_returns_ok() {
    let app = test_router();
    let (status, body) = call(&app, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.trim(), "OK");
}

#[tokio::test]
async fn start_returns_welcome() {
    let app = test_router();
    let (status, body) = call(&app, "GET", "/start").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("👋 Welcome!"));
    assert!(body.contains("every 2 minutes"));
}

#[tokio::test]
async fn publish_then_freshness_then_notice() {
    let app = test_router();

    let (_, body) = call(&app, "GET", "/freshness").await;
    let v: Json = serde_json::from_str(&body).unwrap();
    assert_eq!(v["delivered"], 0);

    let (status, body) = call(&app, "POST", "/publish").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_str(&body).unwrap();
    assert_eq!(v["outcome"], "photo");
    assert_eq!(v["link"], "https://news.example.com/exam-schedule");
    assert_eq!(v["title"], "Exam schedule released");

    let (_, body) = call(&app, "GET", "/freshness").await;
    let v: Json = serde_json::from_str(&body).unwrap();
    assert_eq!(v["delivered"], 1);

    let (status, body) = call(&app, "POST", "/publish").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_str(&body).unwrap();
    assert_eq!(v["outcome"], "notice");
    assert!(v["link"].is_null());
}

#[tokio::test]
async fn publish_requires_post() {
    let app = test_router();
    let (status, _) = call(&app, "GET", "/publish").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
