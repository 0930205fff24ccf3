//! In-memory record of links already delivered in this process lifetime.
//!
//! Check-and-mark is one atomic step (`claim`), so two selections racing on
//! the same unseen link cannot both treat it as fresh. Nothing is persisted;
//! a restart starts from an empty set. An optional capacity bounds memory by
//! forgetting the oldest links first.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    seen: HashSet<String>,
    order: VecDeque<String>, // insertion order, used for eviction only
}

#[derive(Debug, Default)]
pub struct FreshnessTracker {
    inner: Mutex<Inner>,
    capacity: Option<usize>,
}

impl FreshnessTracker {
    /// Unbounded tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker that remembers at most `cap` links (min 1).
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: Some(cap.max(1)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_fresh(&self, link: &str) -> bool {
        let g = self.lock();
        !g.seen.contains(link)
    }

    pub fn mark_delivered(&self, link: &str) {
        self.claim(link);
    }

    /// Mark `link` delivered if it was fresh. Returns `true` only for the
    /// caller that flipped it from fresh to delivered.
    pub fn claim(&self, link: &str) -> bool {
        let mut g = self.lock();
        if !g.seen.insert(link.to_string()) {
            return false;
        }
        g.order.push_back(link.to_string());
        if let Some(cap) = self.capacity {
            while g.order.len() > cap {
                if let Some(old) = g.order.pop_front() {
                    g.seen.remove(&old);
                }
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.lock().seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut g = self.lock();
        g.seen.clear();
        g.order.clear();
    }
}
