// src/notify/mod.rs
//! Delivery of rendered messages to a channel, with graceful degradation.

pub mod log;
pub mod telegram;

use async_trait::async_trait;
use metrics::counter;
use serde::Serialize;
use tracing::{info, warn};

use crate::format::{MessageFormatter, RenderedMessage};

pub use self::log::LogChannel;
pub use self::telegram::TelegramChannel;

/// Telegram rejects photo captions longer than this (characters).
pub const CAPTION_LIMIT: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error: {0}")]
    Api(String),
    #[error("delivery disabled: {0}")]
    Disabled(String),
}

/// What actually reached the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOutcome {
    Photo,
    Text,
    Notice,
}

#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn deliver_text(&self, text: &str, parse_mode: Option<&str>)
        -> Result<(), DeliveryError>;

    async fn deliver_photo(
        &self,
        photo_url: &str,
        caption: &str,
        parse_mode: Option<&str>,
    ) -> Result<(), DeliveryError>;

    fn name(&self) -> &str;
}

/// Send `msg`, degrading photo → text → static notice.
///
/// `None` means nothing was selected and goes straight to the notice.
/// Returns the error of the final step only when the notice fails too.
pub async fn deliver(
    channel: &dyn DeliveryChannel,
    msg: Option<&RenderedMessage>,
    formatter: &MessageFormatter,
) -> Result<DeliveryOutcome, DeliveryError> {
    if let Some(msg) = msg {
        if let Some(image) = &msg.image {
            if msg.text.chars().count() <= CAPTION_LIMIT {
                match channel.deliver_photo(image, &msg.text, msg.parse_mode).await {
                    Ok(()) => {
                        info!(target: "notify", channel = channel.name(), "photo delivered");
                        return Ok(DeliveryOutcome::Photo);
                    }
                    Err(e) => {
                        warn!(target: "notify", channel = channel.name(), error = %e, "photo failed, falling back to text");
                        counter!("delivery_fallback_total", "stage" => "text").increment(1);
                    }
                }
            }
        }

        match channel.deliver_text(&msg.text, msg.parse_mode).await {
            Ok(()) => {
                info!(target: "notify", channel = channel.name(), "text delivered");
                return Ok(DeliveryOutcome::Text);
            }
            Err(e) => {
                warn!(target: "notify", channel = channel.name(), error = %e, "text failed, falling back to notice");
                counter!("delivery_fallback_total", "stage" => "notice").increment(1);
            }
        }
    }

    let notice = formatter.notice();
    channel
        .deliver_text(&notice.text, notice.parse_mode)
        .await
        .map(|()| DeliveryOutcome::Notice)
}
