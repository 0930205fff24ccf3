// src/format.rs
//! Message rendering.
//!
//! `MessageFormatter::format` is a pure function of (item, template): the same
//! input always yields byte-identical output. Markup specifics live behind the
//! [`Escaper`] trait so the target dialect can be swapped without touching the
//! templates.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::ingest::types::NormalizedItem;

pub const NO_NEWS_NOTICE: &str = "⚠️ No news found.";

/// Converts plain text into the markup-safe form a delivery channel expects.
pub trait Escaper: Send + Sync {
    fn escape(&self, text: &str) -> String;

    fn bold(&self, text: &str) -> String {
        self.escape(text)
    }

    fn link(&self, label: &str, url: &str) -> String {
        format!("{}: {}", self.escape(label), url)
    }

    /// Value for the Telegram `parse_mode` field, `None` for plain text.
    fn parse_mode(&self) -> Option<&'static str> {
        None
    }
}

/// Telegram legacy `Markdown`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelegramMarkdown;

impl Escaper for TelegramMarkdown {
    fn escape(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            if matches!(ch, '_' | '*' | '`' | '[') {
                out.push('\\');
            }
            out.push(ch);
        }
        out
    }

    /// Legacy Markdown has no escapes inside an entity, so a literal `*`
    /// closes the bold run and reopens it after an escaped star.
    fn bold(&self, text: &str) -> String {
        text.split('*')
            .map(|run| {
                if run.is_empty() {
                    String::new()
                } else {
                    format!("*{run}*")
                }
            })
            .collect::<Vec<_>>()
            .join("\\*")
    }

    fn link(&self, label: &str, url: &str) -> String {
        format!("[{}]({})", self.escape(label), url.replace(')', "%29"))
    }

    fn parse_mode(&self) -> Option<&'static str> {
        Some("Markdown")
    }
}

/// Telegram `MarkdownV2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelegramMarkdownV2;

impl Escaper for TelegramMarkdownV2 {
    fn escape(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            if matches!(
                ch,
                '_' | '*'
                    | '['
                    | ']'
                    | '('
                    | ')'
                    | '~'
                    | '`'
                    | '>'
                    | '#'
                    | '+'
                    | '-'
                    | '='
                    | '|'
                    | '{'
                    | '}'
                    | '.'
                    | '!'
                    | '\\'
            ) {
                out.push('\\');
            }
            out.push(ch);
        }
        out
    }

    fn bold(&self, text: &str) -> String {
        format!("*{}*", self.escape(text))
    }

    fn link(&self, label: &str, url: &str) -> String {
        let url = url.replace('\\', "\\\\").replace(')', "\\)");
        format!("[{}]({})", self.escape(label), url)
    }

    fn parse_mode(&self) -> Option<&'static str> {
        Some("MarkdownV2")
    }
}

/// Telegram `HTML`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelegramHtml;

impl Escaper for TelegramHtml {
    fn escape(&self, text: &str) -> String {
        html_escape::encode_text(text).into_owned()
    }

    fn bold(&self, text: &str) -> String {
        format!("<b>{}</b>", self.escape(text))
    }

    fn link(&self, label: &str, url: &str) -> String {
        format!(
            "<a href=\"{}\">{}</a>",
            html_escape::encode_double_quoted_attribute(url),
            self.escape(label)
        )
    }

    fn parse_mode(&self) -> Option<&'static str> {
        Some("HTML")
    }
}

/// No markup at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl Escaper for PlainText {
    fn escape(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Adapter for an arbitrary escaping function (plain-text decorations).
pub struct FnEscaper<F>(pub F);

impl<F> Escaper for FnEscaper<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn escape(&self, text: &str) -> String {
        (self.0)(text)
    }
}

/// Markup dialect selectable from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupKind {
    #[default]
    Markdown,
    #[serde(rename = "markdownv2")]
    MarkdownV2,
    Html,
    Plain,
}

impl MarkupKind {
    pub fn escaper(self) -> Arc<dyn Escaper> {
        match self {
            MarkupKind::Markdown => Arc::new(TelegramMarkdown),
            MarkupKind::MarkdownV2 => Arc::new(TelegramMarkdownV2),
            MarkupKind::Html => Arc::new(TelegramHtml),
            MarkupKind::Plain => Arc::new(PlainText),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    /// 🗞 bold title, summary, "Read more" link (+ video line)
    #[default]
    Caption,
    /// Title and link only.
    Headline,
    /// Source label, title, summary, bare link; no emoji.
    Digest,
}

/// Final text/caption plus optional media references ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    pub text: String,
    pub image: Option<String>,
    pub video: Option<String>,
    pub parse_mode: Option<&'static str>,
}

#[derive(Clone)]
pub struct MessageFormatter {
    escaper: Arc<dyn Escaper>,
}

impl MessageFormatter {
    pub fn new(escaper: Arc<dyn Escaper>) -> Self {
        Self { escaper }
    }

    pub fn for_markup(kind: MarkupKind) -> Self {
        Self::new(kind.escaper())
    }

    pub fn parse_mode(&self) -> Option<&'static str> {
        self.escaper.parse_mode()
    }

    pub fn format(&self, item: &NormalizedItem, template: TemplateKind) -> RenderedMessage {
        let e = self.escaper.as_ref();
        let mut blocks: Vec<String> = Vec::with_capacity(4);

        match template {
            TemplateKind::Caption => {
                blocks.push(format!("🗞 {}", e.bold(&item.title)));
                if !item.summary.is_empty() {
                    blocks.push(e.escape(&item.summary));
                }
                let mut tail = format!("🔗 {}", e.link("Read more", &item.link));
                if let Some(video) = &item.video {
                    tail.push('\n');
                    tail.push_str(&format!("🎬 {}", e.link("Watch video", video)));
                }
                blocks.push(tail);
            }
            TemplateKind::Headline => {
                blocks.push(format!(
                    "📰 {}\n{}",
                    e.bold(&item.title),
                    e.link("Read more", &item.link)
                ));
            }
            TemplateKind::Digest => {
                blocks.push(format!(
                    "{} {}",
                    e.escape(&format!("[{}]", item.source_label)),
                    e.bold(&item.title)
                ));
                if !item.summary.is_empty() {
                    blocks.push(e.escape(&item.summary));
                }
                blocks.push(e.escape(&item.link));
                if let Some(video) = &item.video {
                    blocks.push(e.escape(video));
                }
            }
        }

        RenderedMessage {
            text: blocks.join("\n\n"),
            image: item.image.clone(),
            video: item.video.clone(),
            parse_mode: e.parse_mode(),
        }
    }

    /// Static last-resort message when nothing could be selected or delivered.
    pub fn notice(&self) -> RenderedMessage {
        RenderedMessage {
            text: self.escaper.escape(NO_NEWS_NOTICE),
            image: None,
            video: None,
            parse_mode: self.escaper.parse_mode(),
        }
    }
}

/// Reply for the `/start` trigger.
pub fn welcome_text(interval_secs: u64) -> String {
    let every = if interval_secs % 60 == 0 {
        let m = interval_secs / 60;
        if m == 1 {
            "minute".to_string()
        } else {
            format!("{m} minutes")
        }
    } else {
        format!("{interval_secs} seconds")
    };
    format!("👋 Welcome! You’ll get auto-updated multilingual news every {every}.")
}
