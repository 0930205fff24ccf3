//! One publish run against the configured sources, printed instead of posted.
//! `cargo run --bin news_preview`

use std::sync::Arc;

use news_courier::config::bot::BotConfig;
use news_courier::format::MessageFormatter;
use news_courier::freshness::FreshnessTracker;
use news_courier::notify::LogChannel;
use news_courier::publisher::Publisher;
use news_courier::relevance::{TopicEngine, TopicHandle};
use news_courier::selector::ItemSelector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = BotConfig::load_default()?;
    let selector = ItemSelector::new(
        cfg.sources(),
        TopicHandle::new(TopicEngine::from_env()?),
        Arc::new(FreshnessTracker::new()),
        cfg.policy(),
    )
    .with_video_hosts(cfg.video_hosts()?);

    let channel = Arc::new(LogChannel::new());
    let publisher = Publisher::new(
        selector,
        MessageFormatter::for_markup(cfg.markup),
        cfg.template,
        channel.clone(),
    );

    let report = publisher.publish_once().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    for m in channel.recent() {
        if let Some(photo) = &m.photo {
            println!("[photo] {photo}");
        }
        println!("{}", m.text);
    }
    Ok(())
}
