// src/relevance.rs
//! Topic gate: exclusion phrases, whole-word keyword matching, and scoring.
//!
//! Exclusions are checked first and win outright, so a phrase like
//! "school of thought" can veto an item that would otherwise match "school".
//! The score is the number of distinct keywords found as whole words.

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::info;

use crate::config::topics::{load_topics_default, load_topics_from, TopicConfig};

// --- env defaults & names ---
pub const DEFAULT_TOPICS_CONFIG_PATH: &str = "config/topics.toml";
pub const ENV_TOPICS_CONFIG_PATH: &str = "TOPICS_CONFIG_PATH";

// Dev logging gate: NEWS_DEV_LOG=1 AND dev env (debug or SHUTTLE_ENV in {local,development,dev})
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var("NEWS_DEV_LOG").ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Short, stable fingerprint of a text for logs that must not carry it.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn dev_log_topics(event: &str, text: &str, result: &Classification) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(text);
    let matched: Vec<&str> = result.matched.iter().take(5).map(String::as_str).collect();
    // Never log raw text. Only hashed id + short lists.
    info!(
        target: "topics",
        %id, score = result.score, event,
        matched = ?matched,
        excluded_by = ?result.excluded_by
    );
}

/// Result of classifying one text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub matches: bool,
    pub score: u32,
    /// Distinct keywords found, in configured order.
    pub matched: Vec<String>,
    /// Exclusion phrase that vetoed the text, if any.
    pub excluded_by: Option<String>,
}

#[derive(Debug)]
struct CompiledKeyword {
    keyword: String,
    re: Regex,
}

/// Compiled keyword/exclusion set.
#[derive(Debug)]
pub struct TopicEngine {
    pub cfg: TopicConfig,
    keywords: Vec<CompiledKeyword>,
    exclusions: Vec<String>,
}

impl TopicEngine {
    pub fn new(cfg: TopicConfig) -> anyhow::Result<Self> {
        let mut seen = HashSet::new();
        let keywords = cfg
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty() && seen.insert(k.clone()))
            .map(|k| {
                // \b breaks on keywords that begin or end with punctuation ("c++", "#ai"),
                // so the boundary is spelled out as "start/end or a non-word char".
                let pattern = format!(r"(?:^|[^\w]){}(?:[^\w]|$)", regex::escape(&k));
                let re = Regex::new(&pattern)
                    .map_err(|e| anyhow::anyhow!("keyword `{}` regex error: {}", k, e))?;
                Ok(CompiledKeyword { keyword: k, re })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let exclusions = cfg
            .exclusions
            .iter()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        Ok(Self {
            cfg,
            keywords,
            exclusions,
        })
    }

    /// Load from TOPICS_CONFIG_PATH or the default locations.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(load_topics_default()?)
    }

    pub fn from_path(path: &std::path::Path) -> anyhow::Result<Self> {
        Self::new(load_topics_from(path)?)
    }

    pub fn has_keywords(&self) -> bool {
        !self.keywords.is_empty()
    }

    pub fn classify(&self, text: &str) -> Classification {
        let lower = text.to_lowercase();

        if let Some(ex) = self.exclusions.iter().find(|e| lower.contains(e.as_str())) {
            let out = Classification {
                excluded_by: Some(ex.clone()),
                ..Classification::default()
            };
            dev_log_topics("excluded", text, &out);
            return out;
        }

        let matched: Vec<String> = self
            .keywords
            .iter()
            .filter(|k| k.re.is_match(&lower))
            .map(|k| k.keyword.clone())
            .collect();

        let score = u32::try_from(matched.len()).unwrap_or(u32::MAX);
        let out = Classification {
            matches: score > 0,
            score,
            matched,
            excluded_by: None,
        };
        dev_log_topics(if out.matches { "matched" } else { "no_match" }, text, &out);
        out
    }
}

/// One-shot classification against ad-hoc keyword and exclusion lists.
pub fn classify<K: AsRef<str>, E: AsRef<str>>(
    text: &str,
    keywords: &[K],
    exclusions: &[E],
) -> Classification {
    let cfg = TopicConfig {
        keywords: keywords.iter().map(|k| k.as_ref().to_string()).collect(),
        exclusions: exclusions.iter().map(|e| e.as_ref().to_string()).collect(),
    };
    match TopicEngine::new(cfg) {
        Ok(eng) => eng.classify(text),
        Err(_) => Classification::default(),
    }
}

/* ----------------------------
Thread-safe handle + hot reload
---------------------------- */

/// A threadsafe handle that can hot-reload the underlying engine in dev/local.
/// - Enable by setting TOPICS_HOT_RELOAD=1
/// - Dev-gated: active only if cfg!(debug_assertions) OR SHUTTLE_ENV is "local"/"development".
#[derive(Clone)]
pub struct TopicHandle {
    inner: Arc<RwLock<TopicEngine>>,
}

impl TopicHandle {
    pub fn new(engine: TopicEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    pub fn classify(&self, text: &str) -> Classification {
        if let Ok(eng) = self.inner.read() {
            eng.classify(text)
        } else {
            Classification::default()
        }
    }

    /// Swap in a freshly loaded engine.
    pub fn replace(&self, engine: TopicEngine) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = engine;
        }
    }

    pub fn keyword_count(&self) -> usize {
        self.inner.read().map(|e| e.keywords.len()).unwrap_or(0)
    }
}

/// Returns true if we should enable hot reload (dev/local only).
fn hot_reload_enabled() -> bool {
    let want = std::env::var("TOPICS_HOT_RELOAD")
        .ok()
        .map(|v| v == "1")
        .unwrap_or(false);
    if !want {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Resolve the topics file the hot-reload watcher should poll.
pub fn topics_config_path() -> PathBuf {
    std::env::var(ENV_TOPICS_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOPICS_CONFIG_PATH))
}

/// Start a simple polling watcher on `path` to hot-reload into `handle`.
/// Polls mtime every 2s.
pub fn start_hot_reload_thread(handle: TopicHandle, path: PathBuf) {
    if !hot_reload_enabled() {
        return;
    }

    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime: Option<SystemTime> = None;

        loop {
            if let Ok(mtime) = fs::metadata(&path).and_then(|m| m.modified()) {
                let changed = match last_mtime {
                    None => {
                        last_mtime = Some(mtime);
                        false
                    }
                    Some(prev) => mtime > prev,
                };
                if changed {
                    match TopicEngine::from_path(&path) {
                        Ok(engine) => {
                            handle.replace(engine);
                            info!(target: "topics", path = %path.display(), "topics reloaded");
                        }
                        Err(e) => {
                            tracing::warn!(target: "topics", error = ?e, "topics reload failed");
                        }
                    }
                    last_mtime = Some(mtime);
                }
            }
            thread::sleep(poll);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eng(keywords: &[&str], exclusions: &[&str]) -> TopicEngine {
        TopicEngine::new(TopicConfig {
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            exclusions: exclusions.iter().map(|s| s.to_string()).collect(),
        })
        .expect("compile test topics")
    }

    #[test]
    fn exclusion_beats_keyword() {
        let e = eng(&["school"], &["school of thought"]);
        let r = e.classify("School of thought on education");
        assert!(!r.matches);
        assert_eq!(r.score, 0);
        assert_eq!(r.excluded_by.as_deref(), Some("school of thought"));

        let r2 = e.classify("the school reopened");
        assert!(r2.matches);
        assert_eq!(r2.score, 1);
    }

    #[test]
    fn whole_words_only() {
        let e = eng(&["exam", "art"], &[]);
        assert_eq!(e.classify("Examination hall, smart start").score, 0);
        assert_eq!(e.classify("Art exam today.").score, 2);
    }

    #[test]
    fn repeated_keyword_counts_once() {
        let e = eng(&["exam"], &[]);
        assert_eq!(e.classify("exam, exam and EXAM").score, 1);
    }

    #[test]
    fn punctuation_edged_and_non_latin_keywords() {
        let e = eng(&["c++", "परीक्षा"], &[]);
        let r = e.classify("C++ course: परीक्षा कल होगी");
        assert_eq!(r.score, 2, "{r:?}");
        assert_eq!(e.classify("abc++ nonsense").score, 0);
    }

    #[test]
    fn empty_keyword_set_never_matches() {
        let e = eng(&[], &[]);
        assert!(!e.has_keywords());
        assert!(!e.classify("anything").matches);
    }

    #[test]
    fn handle_replace_swaps_engine() {
        let h = TopicHandle::new(eng(&["budget"], &[]));
        assert!(h.classify("budget passed").matches);
        h.replace(eng(&["monsoon"], &[]));
        assert!(!h.classify("budget passed").matches);
        assert_eq!(h.keyword_count(), 1);
    }

    #[test]
    fn anon_hash_is_short_and_stable() {
        assert_eq!(anon_hash("abc"), anon_hash("abc"));
        assert_eq!(anon_hash("abc").len(), 12);
    }
}
