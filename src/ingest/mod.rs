// src/ingest/mod.rs
pub mod providers;
pub mod scheduler;
pub mod types;

use crate::ingest::types::{NormalizedItem, RawItem};
use crate::media::{extract_media, VideoHosts};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;

/// Upper bound on decode/strip passes; double-encoded feeds need two.
const MAX_CLEAN_PASSES: usize = 4;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_events_total", "Total items parsed from sources.");
        describe_histogram!("ingest_parse_ms", "Source parse time in milliseconds.");
        describe_counter!("selector_attempts_total", "Selection attempts started.");
        describe_counter!(
            "selector_source_errors_total",
            "Source fetch/parse errors and timeouts."
        );
        describe_counter!("selector_selected_total", "Items handed out by the selector.");
        describe_counter!(
            "selector_exhausted_total",
            "Selections that ran out of attempts."
        );
        describe_counter!(
            "delivery_fallback_total",
            "Deliveries that fell back to a simpler message."
        );
        describe_counter!("publish_runs_total", "Publish runs (timer or on demand).");
        describe_gauge!("publish_last_run_ts", "Unix time of the last scheduled publish.");
    });
}

static RE_TAGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>|</?[a-z!?][^>]*>")
        .expect("tag regex")
});
static RE_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]{1,31});").expect("entity regex")
});
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Turn a markup-bearing field into plain text.
///
/// 1) decode entities and strip tags until nothing changes (double-encoded input).
///    Feeds ship escaped markup as `&lt;p&gt;`, so escaped tag-shaped text such
///    as `&lt;b&gt;` is removed as markup too. A bare escaped `<` stays text.
/// 2) drop entity sequences the decoder did not know
/// 3) neutralize stray `<` / `>` left behind by malformed markup
/// 4) collapse whitespace and trim
pub fn clean_text(raw: &str) -> String {
    let mut out = raw.to_string();
    for _ in 0..MAX_CLEAN_PASSES {
        let decoded = html_escape::decode_html_entities(&out);
        let stripped = RE_TAGS.replace_all(&decoded, " ").into_owned();
        if stripped == out {
            break;
        }
        out = stripped;
    }

    // Removing one sequence can splice two halves into a new one, so loop.
    while RE_ENTITY.is_match(&out) {
        out = RE_ENTITY.replace_all(&out, "").into_owned();
    }

    out = out.replace('<', "‹").replace('>', "›");

    RE_WS.replace_all(&out, " ").trim().to_string()
}

/// Bound `s` to at most `max` characters, ending with `…` when cut.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.truncate(out.trim_end().len());
    out.push('…');
    out
}

/// Clean a raw item into its render-ready form. Returns `None` for items
/// without a usable link, which can never be tracked for freshness.
pub fn normalize_item(
    raw: &RawItem,
    score: u32,
    max_summary_len: usize,
    video_hosts: &VideoHosts,
) -> Option<NormalizedItem> {
    let link = raw.link.trim();
    if link.is_empty() {
        return None;
    }

    let media = extract_media(raw, video_hosts);
    let summary = clean_text(&raw.summary_html);

    Some(NormalizedItem {
        title: clean_text(&raw.title),
        summary: truncate_chars(&summary, max_summary_len),
        link: link.to_string(),
        image: media.image,
        video: media.video,
        source_label: raw.source_label.clone(),
        score,
    })
}

/// Text the topic classifier looks at: cleaned title plus cleaned summary.
pub fn classification_text(raw: &RawItem) -> String {
    format!("{} {}", clean_text(&raw.title), clean_text(&raw.summary_html))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_ws_and_decodes() {
        let s = "  Hello,&nbsp;&nbsp; <b>world</b>!  ";
        assert_eq!(clean_text(s), "Hello, world !");
    }

    #[test]
    fn double_encoded_markup_is_removed() {
        let s = "&amp;lt;p&amp;gt;Budget&amp;lt;/p&amp;gt; passed";
        assert_eq!(clean_text(s), "Budget passed");
    }

    #[test]
    fn escaped_tags_count_as_markup() {
        assert_eq!(clean_text("Use &lt;b&gt;bold&lt;/b&gt; tags"), "Use bold tags");
        assert_eq!(clean_text("5 &lt; 6"), "5 ‹ 6");
    }

    #[test]
    fn stray_angle_brackets_are_neutralized() {
        assert_eq!(clean_text("5 < 6 and 7 > 3"), "5 ‹ 6 and 7 › 3");
    }

    #[test]
    fn truncate_respects_char_budget() {
        let s = "ગુજરાત સમાચાર ".repeat(50);
        let out = truncate_chars(&s, 40);
        assert_eq!(out.chars().count(), 40);
        assert!(out.ends_with('…'));
        assert_eq!(truncate_chars("short", 40), "short");
        assert_eq!(truncate_chars("short", 0), "");
    }

    #[test]
    fn empty_link_is_not_normalized() {
        let raw = RawItem {
            title: "t".into(),
            link: "   ".into(),
            ..RawItem::default()
        };
        assert!(normalize_item(&raw, 0, 500, &VideoHosts::default()).is_none());
    }
}
