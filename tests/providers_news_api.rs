// tests/providers_news_api.rs
use news_courier::ingest::providers::news_api::NewsApiSource;
use news_courier::ingest::types::{ContentSource, SourceFetchError};

const NEWS_JSON: &str = include_str!("fixtures/news_api.json");

#[tokio::test]
async fn fixture_page_maps_articles() {
    let src = NewsApiSource::from_fixture(NEWS_JSON, "News API", 20);
    let items = src.fetch_items().await.expect("news api parse ok");

    // the "[Removed]" article has no url
    assert_eq!(items.len(), 2);

    let first = &items[0];
    assert_eq!(first.title, "Scholarship results announced");
    assert_eq!(first.source_label, "News API");
    assert_eq!(
        first.media_url.as_deref(),
        Some("https://times.example.com/img/scholarship.jpg")
    );
    assert_eq!(first.content_html.as_deref(), Some("Full story [+1200 chars]"));
    assert_eq!(first.published_at, Some(1_748_844_000));

    assert_eq!(items[1].summary_html, "");
    assert!(items[1].media_url.is_none());
}

#[tokio::test]
async fn api_error_payload_is_typed() {
    let src = NewsApiSource::from_fixture(
        r#"{"status":"error","code":"rateLimited","message":"Too many requests"}"#,
        "News API",
        20,
    );
    let err = src.fetch_items().await.unwrap_err();
    assert!(matches!(err, SourceFetchError::Api(ref m) if m.contains("Too many requests")));
}

#[tokio::test]
async fn non_json_is_a_parse_error() {
    let src = NewsApiSource::from_fixture("<html>bad gateway</html>", "News API", 20);
    assert!(matches!(
        src.fetch_items().await,
        Err(SourceFetchError::Parse(_))
    ));
}
