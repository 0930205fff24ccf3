// src/notify/log.rs
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use super::{DeliveryChannel, DeliveryError};

const KEEP_LAST: usize = 32;

/// One message as the channel saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedMessage {
    pub photo: Option<String>,
    pub text: String,
    pub parse_mode: Option<String>,
}

/// Dry-run channel: logs instead of posting and keeps the last few messages.
/// Used when no bot token / channel is configured.
#[derive(Debug, Default)]
pub struct LogChannel {
    recent: Mutex<VecDeque<LoggedMessage>>,
}

impl LogChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest first.
    pub fn recent(&self) -> Vec<LoggedMessage> {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    fn push(&self, m: LoggedMessage) {
        let mut g = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        g.push_back(m);
        while g.len() > KEEP_LAST {
            g.pop_front();
        }
    }
}

#[async_trait]
impl DeliveryChannel for LogChannel {
    async fn deliver_text(&self, text: &str, parse_mode: Option<&str>) -> Result<(), DeliveryError> {
        tracing::info!(target: "notify", parse_mode, "[dry-run] message:\n{text}");
        self.push(LoggedMessage {
            photo: None,
            text: text.to_string(),
            parse_mode: parse_mode.map(str::to_string),
        });
        Ok(())
    }

    async fn deliver_photo(
        &self,
        photo_url: &str,
        caption: &str,
        parse_mode: Option<&str>,
    ) -> Result<(), DeliveryError> {
        tracing::info!(target: "notify", photo = photo_url, parse_mode, "[dry-run] photo:\n{caption}");
        self.push(LoggedMessage {
            photo: Some(photo_url.to_string()),
            text: caption.to_string(),
            parse_mode: parse_mode.map(str::to_string),
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keeps_only_recent_messages() {
        let ch = LogChannel::new();
        for i in 0..(KEEP_LAST + 3) {
            ch.deliver_text(&format!("m{i}"), None).await.unwrap();
        }
        let recent = ch.recent();
        assert_eq!(recent.len(), KEEP_LAST);
        assert_eq!(recent[0].text, "m3");
    }

    #[tokio::test]
    async fn poisoned_history_still_records() {
        let ch = std::sync::Arc::new(LogChannel::new());
        let held = ch.clone();
        let _ = std::thread::spawn(move || {
            let _g = held.recent.lock().unwrap();
            panic!("panic while holding the history lock");
        })
        .join();
        assert!(ch.recent.is_poisoned());

        ch.deliver_text("after", None).await.unwrap();
        assert_eq!(ch.recent().len(), 1);
    }
}
