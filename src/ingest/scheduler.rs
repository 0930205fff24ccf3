// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::gauge;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::publisher::Publisher;

#[derive(Clone, Copy, Debug)]
pub struct PublishSchedulerCfg {
    pub interval_secs: u64,
    pub first_delay_secs: u64,
}

/// Publish on a timer: first run after `first_delay_secs`, then every
/// `interval_secs`. Failed runs are logged and the loop keeps going.
pub fn spawn_publish_scheduler(publisher: Arc<Publisher>, cfg: PublishSchedulerCfg) -> JoinHandle<()> {
    let period = Duration::from_secs(cfg.interval_secs.max(1));
    let start = Instant::now() + Duration::from_secs(cfg.first_delay_secs);

    tokio::spawn(async move {
        let mut ticker = interval_at(start, period);
        // no catch-up bursts after a slow run
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let now = chrono::Utc::now().timestamp().max(0) as u64;

            match publisher.publish_once().await {
                Ok(report) => tracing::info!(
                    target: "ingest",
                    outcome = ?report.outcome,
                    link = report.link.as_deref().unwrap_or("-"),
                    "scheduled publish"
                ),
                Err(e) => tracing::warn!(target: "ingest", error = %e, "scheduled publish failed"),
            }
            gauge!("publish_last_run_ts").set(now as f64);
        }
    })
}
