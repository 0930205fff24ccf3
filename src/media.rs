//! Media extraction: derive an illustrative image and video URL from a raw
//! item's embedded markup.
//!
//! Both scans are best-effort and independent. Nothing here fails: no match
//! simply leaves the field empty.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::types::RawItem;

/// Default video host patterns (YouTube, youtu.be, Vimeo, Dailymotion).
pub const DEFAULT_VIDEO_HOST_PATTERNS: &[&str] = &[
    r"https?://(?:www\.|m\.)?youtube\.com/(?:watch\?v=|shorts/|embed/)[A-Za-z0-9_-]+",
    r"https?://youtu\.be/[A-Za-z0-9_-]+",
    r"https?://(?:www\.|player\.)?vimeo\.com/(?:video/)?[0-9]+",
    r"https?://(?:www\.)?dailymotion\.com/video/[A-Za-z0-9]+",
];

static RE_IMG_SRC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).expect("img src regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Media {
    pub image: Option<String>,
    pub video: Option<String>,
}

/// Closed, configurable set of recognized video-hosting URL patterns.
#[derive(Debug, Clone)]
pub struct VideoHosts {
    patterns: Vec<Regex>,
}

impl VideoHosts {
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> anyhow::Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref())
                    .map_err(|e| anyhow::anyhow!("video host `{}` regex error: {}", p.as_ref(), e))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// An empty set never recognizes a video.
    pub fn none() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Earliest match of any pattern in `haystack`.
    pub fn first_match(&self, haystack: &str) -> Option<String> {
        self.patterns
            .iter()
            .filter_map(|re| re.find(haystack))
            .min_by_key(|m| m.start())
            .map(|m| m.as_str().to_string())
    }
}

impl Default for VideoHosts {
    fn default() -> Self {
        static DEFAULT: Lazy<VideoHosts> = Lazy::new(|| {
            VideoHosts::from_patterns(DEFAULT_VIDEO_HOST_PATTERNS).expect("default video hosts")
        });
        DEFAULT.clone()
    }
}

/// Scan summary + extended content of `raw` for an image and a video.
pub fn extract_media(raw: &RawItem, hosts: &VideoHosts) -> Media {
    let mut haystack = raw.summary_html.clone();
    if let Some(content) = raw.content_html.as_deref() {
        haystack.push('\n');
        haystack.push_str(content);
    }

    let image = raw
        .media_url
        .as_deref()
        .map(str::trim)
        .filter(|u| is_http_url(u))
        .map(str::to_string)
        .or_else(|| first_img_src(&haystack));

    Media {
        image,
        video: hosts.first_match(&haystack),
    }
}

/// First `<img src>` pointing at an http(s) URL; data URIs are skipped.
fn first_img_src(html: &str) -> Option<String> {
    RE_IMG_SRC
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| html_escape::decode_html_entities(m.as_str().trim()).into_owned())
        .find(|u| is_http_url(u))
}

fn is_http_url(u: &str) -> bool {
    let lower = u.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(summary: &str) -> RawItem {
        RawItem {
            title: "t".into(),
            summary_html: summary.into(),
            link: "https://example.com/a".into(),
            source_label: "English".into(),
            ..RawItem::default()
        }
    }

    #[test]
    fn first_img_src_wins() {
        let r = raw(r#"<p><img src="data:image/png;base64,AAA"><img alt="x" src='https://cdn.example.com/a.jpg?w=1&amp;h=2'><img src="https://cdn.example.com/b.jpg"></p>"#);
        let m = extract_media(&r, &VideoHosts::default());
        assert_eq!(m.image.as_deref(), Some("https://cdn.example.com/a.jpg?w=1&h=2"));
        assert!(m.video.is_none());
    }

    #[test]
    fn feed_media_url_takes_precedence() {
        let mut r = raw(r#"<img src="https://cdn.example.com/inline.jpg">"#);
        r.media_url = Some("https://cdn.example.com/media.jpg".into());
        let m = extract_media(&r, &VideoHosts::default());
        assert_eq!(m.image.as_deref(), Some("https://cdn.example.com/media.jpg"));
    }

    #[test]
    fn earliest_video_across_patterns_and_content() {
        let mut r = raw("Watch https://vimeo.com/12345 now");
        r.content_html = Some("also https://www.youtube.com/watch?v=abc_DEF-1".into());
        let m = extract_media(&r, &VideoHosts::default());
        assert_eq!(m.video.as_deref(), Some("https://vimeo.com/12345"));

        let r2 = raw("clip: https://youtu.be/xyz987 and https://vimeo.com/1");
        let m2 = extract_media(&r2, &VideoHosts::default());
        assert_eq!(m2.video.as_deref(), Some("https://youtu.be/xyz987"));
    }

    #[test]
    fn unknown_hosts_and_empty_set_yield_none() {
        let r = raw("see https://videos.example.org/v/1");
        assert!(extract_media(&r, &VideoHosts::default()).video.is_none());

        let r2 = raw("https://youtu.be/xyz987");
        assert!(extract_media(&r2, &VideoHosts::none()).video.is_none());
    }

    #[test]
    fn custom_pattern_and_bad_pattern() {
        let hosts = VideoHosts::from_patterns(&[r"https://videos\.example\.org/v/[0-9]+"]).unwrap();
        let r = raw("see https://videos.example.org/v/1");
        assert_eq!(
            extract_media(&r, &hosts).video.as_deref(),
            Some("https://videos.example.org/v/1")
        );
        assert!(VideoHosts::from_patterns(&["(unclosed"]).is_err());
    }
}
