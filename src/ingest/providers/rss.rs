// src/ingest/providers/rss.rs
use async_trait::async_trait;
use metrics::{counter, histogram};
use once_cell::sync::Lazy;
use quick_xml::de::from_str;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::borrow::Cow;
use std::time::Duration;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::ingest::types::{ContentSource, RawItem, SourceFetchError};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<Guid>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "content:encoded")]
    content_encoded: Option<String>,
    #[serde(rename = "media:content", default)]
    media_content: Vec<MediaRef>,
    #[serde(rename = "media:thumbnail", default)]
    media_thumbnail: Vec<MediaRef>,
    #[serde(default)]
    enclosure: Vec<MediaRef>,
}

#[derive(Debug, Deserialize)]
struct Guid {
    #[serde(rename = "$text")]
    value: Option<String>,
}

/// `media:content`, `media:thumbnail` and `enclosure` share the attributes we need.
#[derive(Debug, Deserialize)]
struct MediaRef {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "@medium")]
    medium: Option<String>,
    #[serde(rename = "@type")]
    mime: Option<String>,
}

impl MediaRef {
    /// Untyped media:content is assumed to be an image; enclosures must say so.
    fn image_url(&self, require_type: bool) -> Option<&str> {
        let is_image = match (self.medium.as_deref(), self.mime.as_deref()) {
            (Some(m), _) => m.eq_ignore_ascii_case("image"),
            (None, Some(t)) => t.to_ascii_lowercase().starts_with("image/"),
            (None, None) => !require_type,
        };
        if is_image {
            self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
        } else {
            None
        }
    }
}

fn parse_rfc2822_to_unix(ts: &str) -> Option<u64> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
}

/// RSS 2.0 feed, either embedded (fixtures, tests) or polled over HTTP.
pub struct RssSource {
    label: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl RssSource {
    pub fn from_fixture(xml: &str, label: &str) -> Self {
        Self {
            label: label.to_string(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(url: &str, label: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("news-courier/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            label: label.to_string(),
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        }
    }

    /// Parse a feed document into raw items tagged with `label`.
    /// Items without a link (and without a URL-like guid) are dropped.
    pub fn parse_items(xml: &str, label: &str) -> Result<Vec<RawItem>, SourceFetchError> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(xml);
        let rss: Rss = from_str(&xml_clean)
            .map_err(|e| SourceFetchError::Parse(format!("rss xml ({label}): {e}")))?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let link = it
                .link
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .or_else(|| {
                    it.guid
                        .as_ref()
                        .and_then(|g| g.value.as_deref())
                        .map(str::trim)
                        .filter(|g| g.starts_with("http://") || g.starts_with("https://"))
                        .map(str::to_string)
                });
            let Some(link) = link else {
                continue;
            };

            let media_url = it
                .media_content
                .iter()
                .find_map(|m| m.image_url(false))
                .or_else(|| it.media_thumbnail.iter().find_map(|m| m.image_url(false)))
                .or_else(|| it.enclosure.iter().find_map(|m| m.image_url(true)))
                .map(str::to_string);

            out.push(RawItem {
                title: it.title.unwrap_or_default(),
                summary_html: it.description.unwrap_or_default(),
                content_html: it.content_encoded,
                link,
                source_label: label.to_string(),
                media_url,
                published_at: it.pub_date.as_deref().and_then(parse_rfc2822_to_unix),
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_parse_ms").record(ms);
        counter!("ingest_events_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl ContentSource for RssSource {
    async fn fetch_items(&self) -> Result<Vec<RawItem>, SourceFetchError> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items(s, &self.label),
            Mode::Http { url, client } => {
                let resp = client.get(url.as_str()).send().await?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(SourceFetchError::Status(status.as_u16()));
                }
                let body = resp.text().await?;
                Self::parse_items(&body, &self.label)
            }
        }
    }

    fn label(&self) -> &str {
        &self.label
    }
}

static RE_NAMED_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]{1,31});").expect("named entity regex"));

/// XML only knows five named entities; feeds routinely use HTML ones.
/// Known HTML names become numeric references. Unknown names are escaped
/// into literal text and left for the cleaner to drop.
fn scrub_html_entities_for_xml(s: &str) -> Cow<'_, str> {
    RE_NAMED_ENTITY.replace_all(s, |caps: &Captures| {
        let name = &caps[1];
        if matches!(name, "amp" | "lt" | "gt" | "quot" | "apos") {
            return caps[0].to_string();
        }
        if name == "rupee" {
            return "&#8377;".to_string();
        }
        let decoded = html_escape::decode_html_entities(&caps[0]);
        if decoded != &caps[0] {
            decoded.chars().map(|c| format!("&#{};", c as u32)).collect()
        } else {
            format!("&amp;{name};")
        }
    })
}
