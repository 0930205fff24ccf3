// src/notify/telegram.rs
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{DeliveryChannel, DeliveryError};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API channel (`sendMessage` / `sendPhoto`).
#[derive(Clone)]
pub struct TelegramChannel {
    api_base: String,
    token: String,
    chat_id: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl std::fmt::Debug for TelegramChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramChannel")
            .field("api_base", &self.api_base)
            .field("chat_id", &self.chat_id)
            .field("token", &"***")
            .finish()
    }
}

impl TelegramChannel {
    pub fn new(token: String, chat_id: String) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token,
            chat_id,
            client: Client::new(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }

    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// POST one Bot API call. Network errors, 429 and 5xx are retried with
    /// exponential backoff; any other rejection is final.
    async fn call<P: Serialize + Sync>(&self, method: &str, payload: &P) -> Result<(), DeliveryError> {
        if self.token.trim().is_empty() || self.chat_id.trim().is_empty() {
            return Err(DeliveryError::Disabled("bot token or chat id is empty".into()));
        }
        let url = self.method_url(method);
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&url)
                .timeout(self.timeout)
                .json(payload)
                .send()
                .await;

            match res {
                Ok(rsp) => {
                    let status = rsp.status();
                    let body = rsp.json::<ApiReply>().await.ok();
                    if status.is_success() && body.as_ref().map_or(true, |b| b.ok) {
                        return Ok(());
                    }
                    let retryable =
                        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;
                    if retryable && attempt < self.max_retries {
                        tracing::debug!(target: "notify", method, %status, attempt, "telegram retry");
                        tokio::time::sleep(backoff(attempt)).await;
                        continue;
                    }
                    let desc = body
                        .and_then(|b| b.description)
                        .unwrap_or_else(|| format!("HTTP {status}"));
                    return Err(DeliveryError::Api(format!("{method}: {desc}")));
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tokio::time::sleep(backoff(attempt)).await;
                        continue;
                    }
                    return Err(DeliveryError::Http(e.without_url()));
                }
            }
        }
    }
}

fn backoff(attempt: u8) -> Duration {
    Duration::from_millis(500u64 << (attempt.saturating_sub(1)).min(6))
}

#[async_trait]
impl DeliveryChannel for TelegramChannel {
    async fn deliver_text(&self, text: &str, parse_mode: Option<&str>) -> Result<(), DeliveryError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode,
            disable_web_page_preview: false,
        };
        self.call("sendMessage", &payload).await
    }

    async fn deliver_photo(
        &self,
        photo_url: &str,
        caption: &str,
        parse_mode: Option<&str>,
    ) -> Result<(), DeliveryError> {
        let payload = SendPhoto {
            chat_id: &self.chat_id,
            photo: photo_url,
            caption,
            parse_mode,
        };
        self.call("sendPhoto", &payload).await
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    disable_web_page_preview: bool,
}

#[derive(Serialize)]
struct SendPhoto<'a> {
    chat_id: &'a str,
    photo: &'a str,
    caption: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

#[derive(Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_omits_missing_parse_mode() {
        let p = SendMessage {
            chat_id: "@news",
            text: "hi",
            parse_mode: None,
            disable_web_page_preview: false,
        };
        let v = serde_json::to_value(&p).unwrap();
        assert!(v.get("parse_mode").is_none());
        assert_eq!(v["chat_id"], "@news");
    }

    #[test]
    fn debug_hides_token() {
        let ch = TelegramChannel::new("123:secret".into(), "@news".into())
            .with_api_base("http://127.0.0.1:9/");
        let dbg = format!("{ch:?}");
        assert!(!dbg.contains("secret"));
        assert_eq!(ch.method_url("sendPhoto"), "http://127.0.0.1:9/bot123:secret/sendPhoto");
    }

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff(1), Duration::from_millis(500));
        assert_eq!(backoff(3), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn empty_chat_id_is_disabled_without_a_request() {
        let ch = TelegramChannel::new("123:abc".into(), "  ".into());
        let err = ch.deliver_text("hi", None).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Disabled(_)));
    }
}
