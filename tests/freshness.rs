// tests/freshness.rs
use news_courier::freshness::FreshnessTracker;
use std::sync::Arc;

#[test]
fn delivered_link_is_no_longer_fresh() {
    let t = FreshnessTracker::new();
    assert!(t.is_fresh("L1"));
    t.mark_delivered("L1");
    assert!(!t.is_fresh("L1"));
    assert!(t.is_fresh("L2"));
    assert_eq!(t.len(), 1);
}

#[test]
fn capacity_forgets_oldest_first() {
    let t = FreshnessTracker::with_capacity(2);
    t.mark_delivered("a");
    t.mark_delivered("b");
    t.mark_delivered("c");
    assert!(t.is_fresh("a"));
    assert!(!t.is_fresh("b"));
    assert!(!t.is_fresh("c"));
    assert_eq!(t.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_have_one_winner() {
    let t = Arc::new(FreshnessTracker::new());
    let mut tasks = Vec::new();
    for _ in 0..16 {
        let t = t.clone();
        tasks.push(tokio::spawn(async move { t.claim("https://x/same") }));
    }
    let mut wins = 0;
    for h in tasks {
        if h.await.unwrap() {
            wins += 1;
        }
    }
    assert_eq!(wins, 1);
}
