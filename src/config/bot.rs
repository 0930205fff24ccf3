// src/config/bot.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use std::{env, fs, path::Path, path::PathBuf};

use crate::format::{MarkupKind, TemplateKind};
use crate::ingest::providers::news_api::NewsApiSource;
use crate::ingest::providers::rss::RssSource;
use crate::ingest::types::ContentSource;
use crate::media::VideoHosts;
use crate::selector::{SelectionPolicy, SourcePick};

pub const DEFAULT_BOT_CONFIG_PATH: &str = "config/bot.toml";
pub const ENV_BOT_CONFIG_PATH: &str = "NEWS_CONFIG_PATH";

fn default_page_size() -> u32 {
    20
}
fn default_news_api_label() -> String {
    "News API".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCfg {
    pub url: String,
    /// Language or category tag carried onto every item of the feed.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsApiCfg {
    pub endpoint: String,
    /// "ENV" means: read from NEWS_API_KEY
    pub api_key: String,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_news_api_label")]
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub bot_token: Option<String>,
    /// e.g. "@your_channel_username" or a numeric chat id
    pub channel_id: Option<String>,
    pub feeds: Vec<FeedCfg>,
    pub news_api: Option<NewsApiCfg>,
    pub interval_secs: u64,
    pub first_delay_secs: u64,
    pub max_attempts: u32,
    pub max_summary_len: usize,
    pub fetch_timeout_secs: u64,
    pub freshness: bool,
    pub freshness_capacity: Option<usize>,
    pub topic_filter: bool,
    pub scoring: bool,
    pub source_pick: SourcePick,
    pub template: TemplateKind,
    pub markup: MarkupKind,
    /// Overrides the built-in video host patterns when set.
    pub video_hosts: Option<Vec<String>>,
}

impl Default for BotConfig {
    fn default() -> Self {
        let feed = |url: &str, label: &str| FeedCfg {
            url: url.to_string(),
            label: label.to_string(),
        };
        Self {
            bot_token: None,
            channel_id: None,
            feeds: vec![
                feed("https://gujaratsamachar.com/rss/gujarat", "Gujarati"),
                feed("https://www.bhaskar.com/rss-national/", "Hindi"),
                feed(
                    "https://timesofindia.indiatimes.com/rssfeeds/-2128936835.cms",
                    "English",
                ),
                feed(
                    "https://www.thehindu.com/news/national/feeder/default.rss",
                    "English",
                ),
            ],
            news_api: None,
            interval_secs: 120,
            first_delay_secs: 5,
            max_attempts: 5,
            max_summary_len: 500,
            fetch_timeout_secs: 10,
            freshness: true,
            freshness_capacity: None,
            topic_filter: false,
            scoring: false,
            source_pick: SourcePick::Pooled,
            template: TemplateKind::Caption,
            markup: MarkupKind::Markdown,
            video_hosts: None,
        }
    }
}

impl BotConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading bot config from {}", path.display()))?;
        let cfg: BotConfig = toml::from_str(&data)
            .with_context(|| format!("parsing bot config {}", path.display()))?;
        Ok(cfg)
    }

    /// Resolve config file + env:
    /// 1) $NEWS_CONFIG_PATH (must exist)
    /// 2) config/bot.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let cfg = if let Ok(p) = env::var(ENV_BOT_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                anyhow::bail!("NEWS_CONFIG_PATH points to non-existent path");
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_BOT_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_BOT_CONFIG_PATH)?
        } else {
            Self::default()
        };
        cfg.finish(|k| env::var(k).ok())
    }

    /// Apply env overrides, resolve secrets and sanitize ranges.
    pub fn finish<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BOT_TOKEN").filter(|v| !v.trim().is_empty()) {
            self.bot_token = Some(v.trim().to_string());
        }
        if let Some(v) = lookup("CHANNEL_ID").filter(|v| !v.trim().is_empty()) {
            self.channel_id = Some(v.trim().to_string());
        }
        if let Some(v) = lookup("NEWS_INTERVAL_SECS").and_then(|v| v.trim().parse().ok()) {
            self.interval_secs = v;
        }
        if let Some(v) = lookup("NEWS_MAX_ATTEMPTS").and_then(|v| v.trim().parse().ok()) {
            self.max_attempts = v;
        }

        if let Some(api) = self.news_api.as_mut() {
            if api.api_key.trim().eq_ignore_ascii_case("env") {
                api.api_key = lookup("NEWS_API_KEY")
                    .ok_or_else(|| anyhow::anyhow!("Missing NEWS_API_KEY env var"))?;
            }
        }

        self.max_attempts = self.max_attempts.max(1);
        self.interval_secs = self.interval_secs.max(1);
        self.fetch_timeout_secs = self.fetch_timeout_secs.max(1);
        Ok(self)
    }

    pub fn policy(&self) -> SelectionPolicy {
        SelectionPolicy {
            max_attempts: self.max_attempts,
            freshness_required: self.freshness,
            topic_filter: self.topic_filter,
            scoring: self.scoring,
            source_pick: self.source_pick,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            max_summary_len: self.max_summary_len,
        }
    }

    pub fn video_hosts(&self) -> Result<VideoHosts> {
        match &self.video_hosts {
            Some(patterns) => VideoHosts::from_patterns(patterns),
            None => Ok(VideoHosts::default()),
        }
    }

    /// Content sources in configured order: feeds first, then the news API.
    pub fn sources(&self) -> Vec<Arc<dyn ContentSource>> {
        let timeout = Duration::from_secs(self.fetch_timeout_secs);
        let mut out: Vec<Arc<dyn ContentSource>> = self
            .feeds
            .iter()
            .map(|f| Arc::new(RssSource::from_url(&f.url, &f.label, timeout)) as Arc<dyn ContentSource>)
            .collect();
        if let Some(api) = &self.news_api {
            out.push(Arc::new(NewsApiSource::from_cfg(api, timeout)));
        }
        out
    }
}
