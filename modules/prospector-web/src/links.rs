use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::html::inner_text;

/// `<a href="...">text</a>`, attributes in any order before `href`.
static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#).expect("valid regex")
});

/// Extensions that never lead to crawlable markup.
const BANNED_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "gif", "svg", "ico", "zip", "rar", "7z", "mp4", "mp3", "webm",
    "css", "js",
];

/// A resolved anchor and its visible text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub href: String,
    pub text: String,
}

/// Resolve a raw href against a base URL. Fragments are kept so callers can
/// reject them.
pub fn resolve(base: &Url, raw: &str) -> Option<Url> {
    base.join(raw.trim()).ok()
}

/// Extract every anchor in document order. Relative hrefs resolve against
/// `base_url`; hrefs that cannot be resolved are dropped.
pub fn extract_anchors(html: &str, base_url: &str) -> Vec<Anchor> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };
    ANCHOR_RE
        .captures_iter(html)
        .filter_map(|cap| {
            let href = resolve(&base, &cap[1])?;
            Some(Anchor {
                href: href.to_string(),
                text: inner_text(&cap[2]),
            })
        })
        .collect()
}

pub fn is_same_origin(base: &Url, candidate: &Url) -> bool {
    base.origin() == candidate.origin()
}

/// Rejects fragment URLs and paths ending in a binary, script or style extension.
pub fn is_crawlable(url: &Url) -> bool {
    if url.fragment().is_some() {
        return false;
    }
    let last_segment = url.path().rsplit('/').next().unwrap_or("");
    match last_segment.rsplit_once('.') {
        Some((_, ext)) => !BANNED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => true,
    }
}
