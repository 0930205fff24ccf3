// src/ingest/types.rs
use std::time::Duration;

/// One item as a content source produced it. Immutable once read.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq, Default)]
pub struct RawItem {
    pub title: String,
    pub summary_html: String, // may contain markup
    #[serde(default)]
    pub content_html: Option<String>, // e.g. content:encoded
    pub link: String,          // unique id
    pub source_label: String,  // e.g. "Gujarati", "English"
    #[serde(default)]
    pub media_url: Option<String>, // media:content / enclosure / urlToImage
    #[serde(default)]
    pub published_at: Option<u64>, // unix seconds
}

/// Render-ready item derived from a [`RawItem`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct NormalizedItem {
    pub title: String,
    pub summary: String, // plain text, length-bounded
    pub link: String,
    pub image: Option<String>,
    pub video: Option<String>,
    pub source_label: String,
    pub score: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceFetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected http status {0}")]
    Status(u16),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<RawItem>, SourceFetchError>;
    fn label(&self) -> &str;
}
