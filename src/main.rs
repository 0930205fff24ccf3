//! News courier: binary entrypoint.
//! Boots the Axum HTTP server, the publish scheduler and shared state.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_courier::api::{self, AppState};
use news_courier::config::bot::BotConfig;
use news_courier::format::MessageFormatter;
use news_courier::freshness::FreshnessTracker;
use news_courier::ingest::scheduler::{spawn_publish_scheduler, PublishSchedulerCfg};
use news_courier::metrics::Metrics;
use news_courier::notify::{DeliveryChannel, LogChannel, TelegramChannel};
use news_courier::publisher::Publisher;
use news_courier::relevance::{start_hot_reload_thread, topics_config_path, TopicEngine, TopicHandle};
use news_courier::selector::ItemSelector;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - NEWS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("NEWS_DEV_LOG").ok().is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("selector=info,notify=info,ingest=info,topics=info,warn"));

    // the runtime may already have installed a subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

fn build_channel(cfg: &BotConfig) -> Arc<dyn DeliveryChannel> {
    match (&cfg.bot_token, &cfg.channel_id) {
        (Some(token), Some(chat)) => Arc::new(
            TelegramChannel::new(token.clone(), chat.clone()).with_timeout(cfg.fetch_timeout_secs),
        ),
        _ => {
            tracing::warn!(target: "notify", "BOT_TOKEN / CHANNEL_ID not set, messages are only logged");
            Arc::new(LogChannel::new())
        }
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    enable_dev_tracing();

    // Before anything touches a counter, so descriptions land in the exporter.
    let metrics = Metrics::init()?;

    let cfg = BotConfig::load_default()?;

    let topics = TopicHandle::new(TopicEngine::from_env()?);
    if cfg.topic_filter && topics.keyword_count() == 0 {
        tracing::warn!(target: "topics", "topic filter is on but no keywords are configured; nothing will be selected");
    }
    start_hot_reload_thread(topics.clone(), topics_config_path());

    let freshness = Arc::new(match cfg.freshness_capacity {
        Some(cap) => FreshnessTracker::with_capacity(cap),
        None => FreshnessTracker::new(),
    });

    let selector = ItemSelector::new(cfg.sources(), topics, freshness, cfg.policy())
        .with_video_hosts(cfg.video_hosts()?);
    tracing::info!(target: "selector", sources = ?selector.source_labels(), "selector ready");

    let publisher = Arc::new(Publisher::new(
        selector,
        MessageFormatter::for_markup(cfg.markup),
        cfg.template,
        build_channel(&cfg),
    ));

    spawn_publish_scheduler(
        publisher.clone(),
        PublishSchedulerCfg {
            interval_secs: cfg.interval_secs,
            first_delay_secs: cfg.first_delay_secs,
        },
    );

    let state = AppState {
        publisher,
        interval_secs: cfg.interval_secs,
    };
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
