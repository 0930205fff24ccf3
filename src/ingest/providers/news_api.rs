// src/ingest/providers/news_api.rs
//! REST news API source (NewsAPI-style `articles` page).

use async_trait::async_trait;
use chrono::DateTime;
use metrics::{counter, histogram};
use serde::Deserialize;
use std::time::Duration;

use crate::config::bot::NewsApiCfg;
use crate::ingest::types::{ContentSource, RawItem, SourceFetchError};

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    articles: Vec<Article>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
}

pub struct NewsApiSource {
    label: String,
    page_size: usize,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        endpoint: String,
        api_key: String,
        query: Option<String>,
        client: reqwest::Client,
    },
}

impl NewsApiSource {
    pub fn from_fixture(json: &str, label: &str, page_size: usize) -> Self {
        Self {
            label: label.to_string(),
            page_size: page_size.max(1),
            mode: Mode::Fixture(json.to_string()),
        }
    }

    pub fn from_cfg(cfg: &NewsApiCfg, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("news-courier/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            label: cfg.label.clone(),
            page_size: cfg.page_size.max(1) as usize,
            mode: Mode::Http {
                endpoint: cfg.endpoint.clone(),
                api_key: cfg.api_key.clone(),
                query: cfg.query.clone(),
                client,
            },
        }
    }

    /// Parse one response page; at most `page_size` articles are kept.
    pub fn parse_items(
        json: &str,
        label: &str,
        page_size: usize,
    ) -> Result<Vec<RawItem>, SourceFetchError> {
        let t0 = std::time::Instant::now();
        let resp: ApiResponse = serde_json::from_str(json)
            .map_err(|e| SourceFetchError::Parse(format!("news api json ({label}): {e}")))?;

        if !resp.status.eq_ignore_ascii_case("ok") {
            return Err(SourceFetchError::Api(format!(
                "{}: {}",
                resp.code.unwrap_or_else(|| resp.status.clone()),
                resp.message.unwrap_or_default()
            )));
        }

        let out: Vec<RawItem> = resp
            .articles
            .into_iter()
            .filter_map(|a| {
                let link = a.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())?;
                Some(RawItem {
                    title: a.title.unwrap_or_default(),
                    summary_html: a.description.unwrap_or_default(),
                    content_html: a.content,
                    link,
                    source_label: label.to_string(),
                    media_url: a.url_to_image,
                    published_at: a
                        .published_at
                        .as_deref()
                        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                        .and_then(|dt| u64::try_from(dt.timestamp()).ok()),
                })
            })
            .take(page_size)
            .collect();

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_parse_ms").record(ms);
        counter!("ingest_events_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl ContentSource for NewsApiSource {
    async fn fetch_items(&self) -> Result<Vec<RawItem>, SourceFetchError> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items(s, &self.label, self.page_size),
            Mode::Http {
                endpoint,
                api_key,
                query,
                client,
            } => {
                let mut req = client
                    .get(endpoint.as_str())
                    .header("X-Api-Key", api_key.as_str())
                    .query(&[("pageSize", self.page_size.to_string())]);
                if let Some(q) = query {
                    req = req.query(&[("q", q.as_str())]);
                }
                let resp = req.send().await?;
                let status = resp.status();
                let body = resp.text().await?;
                // Error pages still carry a JSON status/message worth surfacing.
                match Self::parse_items(&body, &self.label, self.page_size) {
                    Err(SourceFetchError::Parse(_)) if !status.is_success() => {
                        Err(SourceFetchError::Status(status.as_u16()))
                    }
                    other => other,
                }
            }
        }
    }

    fn label(&self) -> &str {
        &self.label
    }
}
