// src/selector.rs
//! Item selection: bounded retry-by-resampling over content sources.
//!
//! Each attempt fetches from the sources picked by [`SourcePick`], keeps the
//! on-topic and fresh items, ranks them, and claims the winner(s) in the
//! freshness tracker. An attempt has no side effects until that claim, so a
//! failed attempt simply moves on to the next one.

use metrics::counter;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::freshness::FreshnessTracker;
use crate::ingest::types::{ContentSource, NormalizedItem, RawItem, SourceFetchError};
use crate::ingest::{classification_text, ensure_metrics_described, normalize_item};
use crate::media::VideoHosts;
use crate::relevance::TopicHandle;

/// Which sources an attempt draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourcePick {
    /// Always the first configured source.
    First,
    /// One source, chosen uniformly at random per attempt.
    Random,
    /// Every source, concatenated in configured order.
    #[default]
    Pooled,
}

/// Strategy switches consumed by [`ItemSelector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub max_attempts: u32,
    /// Skip links already delivered and claim the winner.
    pub freshness_required: bool,
    /// Drop items that do not match the topic keywords.
    pub topic_filter: bool,
    /// Highest score wins (ties: first encountered). Off = uniform random.
    pub scoring: bool,
    pub source_pick: SourcePick,
    pub fetch_timeout: Duration,
    pub max_summary_len: usize,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            freshness_required: true,
            topic_filter: true,
            scoring: true,
            source_pick: SourcePick::Random,
            fetch_timeout: Duration::from_secs(10),
            max_summary_len: 500,
        }
    }
}

#[derive(Debug)]
struct Candidate {
    raw: RawItem,
    score: u32,
}

pub struct ItemSelector {
    sources: Vec<Arc<dyn ContentSource>>,
    topics: TopicHandle,
    freshness: Arc<FreshnessTracker>,
    policy: SelectionPolicy,
    video_hosts: VideoHosts,
    rng: Mutex<StdRng>,
}

impl ItemSelector {
    pub fn new(
        sources: Vec<Arc<dyn ContentSource>>,
        topics: TopicHandle,
        freshness: Arc<FreshnessTracker>,
        policy: SelectionPolicy,
    ) -> Self {
        ensure_metrics_described();
        Self {
            sources,
            topics,
            freshness,
            policy,
            video_hosts: VideoHosts::default(),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Replace the random source (seed it for reproducible attempt sequences).
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_video_hosts(mut self, hosts: VideoHosts) -> Self {
        self.video_hosts = hosts;
        self
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    pub fn freshness(&self) -> &Arc<FreshnessTracker> {
        &self.freshness
    }

    pub fn source_labels(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.label().to_string()).collect()
    }

    /// Pick one item, or `None` once `max_attempts` attempts came up empty.
    pub async fn select(&self) -> Option<NormalizedItem> {
        self.select_many(1).await.and_then(|mut v| v.pop())
    }

    /// Pick up to `n` items from the first attempt that yields any.
    pub async fn select_many(&self, n: usize) -> Option<Vec<NormalizedItem>> {
        if n == 0 {
            return None;
        }
        if self.sources.is_empty() {
            warn!(target: "selector", "no content sources configured");
            return None;
        }

        for attempt in 1..=self.policy.max_attempts {
            counter!("selector_attempts_total").increment(1);

            let raw = self.fetch_for_attempt().await;
            if raw.is_empty() {
                debug!(target: "selector", attempt, "no items from sources");
                continue;
            }

            let fetched = raw.len();
            let candidates = self.eligible(raw);
            if candidates.is_empty() {
                debug!(target: "selector", attempt, fetched, "no eligible items");
                continue;
            }

            let ranked = self.rank(candidates);
            let picked = self.claim(ranked, n);
            if picked.is_empty() {
                debug!(target: "selector", attempt, "eligible items lost to concurrent selection");
                continue;
            }

            counter!("selector_selected_total").increment(picked.len() as u64);
            for it in &picked {
                info!(
                    target: "selector",
                    attempt,
                    source = %it.source_label,
                    score = it.score,
                    link = %it.link,
                    "item selected"
                );
            }
            return Some(picked);
        }

        counter!("selector_exhausted_total").increment(1);
        info!(
            target: "selector",
            attempts = self.policy.max_attempts,
            "no eligible item after all attempts"
        );
        None
    }

    async fn fetch_for_attempt(&self) -> Vec<RawItem> {
        let picked: Vec<&Arc<dyn ContentSource>> = match self.policy.source_pick {
            SourcePick::First => self.sources.iter().take(1).collect(),
            SourcePick::Random => {
                let idx = {
                    let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                    rng.random_range(0..self.sources.len())
                };
                vec![&self.sources[idx]]
            }
            SourcePick::Pooled => self.sources.iter().collect(),
        };

        let mut out = Vec::new();
        for src in picked {
            out.extend(self.fetch_one(src.as_ref()).await);
        }
        out
    }

    /// The one place fetch failures are logged; they count as "no items".
    async fn fetch_one(&self, src: &dyn ContentSource) -> Vec<RawItem> {
        let timeout = self.policy.fetch_timeout;
        let res = match tokio::time::timeout(timeout, src.fetch_items()).await {
            Ok(r) => r,
            Err(_) => Err(SourceFetchError::Timeout(timeout)),
        };
        match res {
            Ok(items) => items,
            Err(e) => {
                warn!(target: "selector", error = %e, source = src.label(), "source fetch failed");
                counter!("selector_source_errors_total").increment(1);
                Vec::new()
            }
        }
    }

    /// Topic filter + freshness filter, preserving source order.
    fn eligible(&self, raw: Vec<RawItem>) -> Vec<Candidate> {
        let classify = self.policy.topic_filter || self.policy.scoring;
        let mut seen_links = HashSet::new();
        let mut out = Vec::with_capacity(raw.len());

        for it in raw {
            let link = it.link.trim();
            if link.is_empty() || !seen_links.insert(link.to_string()) {
                continue;
            }

            let score = if classify {
                let c = self.topics.classify(&classification_text(&it));
                if self.policy.topic_filter && !c.matches {
                    continue;
                }
                c.score
            } else {
                0
            };

            if self.policy.freshness_required && !self.freshness.is_fresh(link) {
                continue;
            }

            out.push(Candidate { raw: it, score });
        }
        out
    }

    /// Best first. Scoring: stable sort by score (ties keep source order).
    /// No scoring: uniform shuffle from the injected RNG.
    fn rank(&self, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        if self.policy.scoring {
            candidates.sort_by(|a, b| b.score.cmp(&a.score));
        } else {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            candidates.shuffle(&mut *rng);
        }
        candidates
    }

    /// Normalize and claim in rank order. A claim lost to a concurrent
    /// selection falls through to the next candidate.
    fn claim(&self, ranked: Vec<Candidate>, n: usize) -> Vec<NormalizedItem> {
        let mut out = Vec::with_capacity(n);
        for c in ranked {
            if out.len() == n {
                break;
            }
            let Some(item) = normalize_item(
                &c.raw,
                c.score,
                self.policy.max_summary_len,
                &self.video_hosts,
            ) else {
                continue;
            };
            if self.policy.freshness_required && !self.freshness.claim(&item.link) {
                continue;
            }
            out.push(item);
        }
        out
    }
}
