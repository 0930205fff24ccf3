// src/config/topics.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::relevance::ENV_TOPICS_CONFIG_PATH;

/// Keyword and exclusion lists consumed by the topic gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TopicConfig {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
}

/// Load topics from an explicit path. Supports TOML or JSON formats.
pub fn load_topics_from(path: &Path) -> Result<TopicConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading topics from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_topics(&content, ext.as_str())
}

/// Load topics using env var + fallbacks:
/// 1) $TOPICS_CONFIG_PATH
/// 2) config/topics.toml
/// 3) config/topics.json
///
/// No file at all means an empty config (topic filter matches nothing).
pub fn load_topics_default() -> Result<TopicConfig> {
    if let Ok(p) = std::env::var(ENV_TOPICS_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_topics_from(&pb);
        } else {
            return Err(anyhow!("TOPICS_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/topics.toml");
    if toml_p.exists() {
        return load_topics_from(&toml_p);
    }
    let json_p = PathBuf::from("config/topics.json");
    if json_p.exists() {
        return load_topics_from(&json_p);
    }
    Ok(TopicConfig::default())
}

fn parse_topics(s: &str, hint_ext: &str) -> Result<TopicConfig> {
    let parsed = match hint_ext {
        "json" => serde_json::from_str::<TopicConfig>(s).map_err(anyhow::Error::from),
        "toml" => toml::from_str::<TopicConfig>(s).map_err(anyhow::Error::from),
        // Unknown extension: sniff JSON first, then TOML.
        _ => serde_json::from_str::<TopicConfig>(s)
            .map_err(anyhow::Error::from)
            .or_else(|_| toml::from_str::<TopicConfig>(s).map_err(anyhow::Error::from)),
    };
    let cfg = parsed.map_err(|e| anyhow!("unsupported topics format: {e}"))?;
    Ok(TopicConfig {
        keywords: clean_list(cfg.keywords),
        exclusions: clean_list(cfg.exclusions),
    })
}

/// Trim, lower-case, drop empties, dedup and sort.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut set = BTreeSet::new();
    for it in items {
        let t = it.trim();
        if !t.is_empty() {
            set.insert(t.to_lowercase());
        }
    }
    set.into_iter().collect()
}
