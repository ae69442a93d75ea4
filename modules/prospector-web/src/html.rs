//! Regex-based signal extraction from raw HTML. No DOM; pages are treated
//! as text, which is enough for titles, meta tags and link discovery.

use std::sync::LazyLock;

use prospector_common::SiteProfile;
use regex::Regex;
use url::Url;

use crate::links::resolve;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));
static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\s[^>]*>").expect("valid regex"));
static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").expect("valid regex"));
static LINK_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<link\s[^>]*>").expect("valid regex"));
static SCRIPT_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script\s[^>]*?src\s*=\s*["']([^"']+)["']"#).expect("valid regex")
});
static SCRIPT_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid regex"));
static STYLE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid regex"));
static BLOCK_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|li|div|h[1-6]|tr|td|a|section|article)>").expect("valid regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static LINE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n|\.\s").expect("valid regex"));
static JOB_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(engineer|developer|analyst|consultant|manager|specialist|coordinator|architect|designer|account|sales|support)",
    )
    .expect("valid regex")
});

const MAX_JOB_LINE_LEN: usize = 140;
const MAX_JOB_LINES: usize = 50;

static NAME_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| attr_regex("name"));
static CONTENT_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| attr_regex("content"));
static TYPE_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| attr_regex("type"));
static HREF_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| attr_regex("href"));

fn attr_regex(name: &str) -> Regex {
    Regex::new(&format!(r#"(?is)\b{name}\s*=\s*["']([^"']*)["']"#)).expect("valid regex")
}

/// Value of the attribute matched by `re` within a single tag.
fn attr<'a>(tag: &'a str, re: &Regex) -> Option<&'a str> {
    re.captures(tag).and_then(|c| c.get(1)).map(|m| m.as_str())
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Visible text of an HTML fragment with whitespace collapsed.
pub fn inner_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, " ");
    WS_RE
        .replace_all(&decode_entities(&stripped), " ")
        .trim()
        .to_string()
}

pub fn page_title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .map(|c| inner_text(&c[1]))
        .filter(|t| !t.is_empty())
}

pub fn meta_description(html: &str) -> Option<String> {
    META_TAG_RE
        .find_iter(html)
        .map(|m| m.as_str())
        .find(|tag| attr(tag, &NAME_ATTR_RE).is_some_and(|n| n.eq_ignore_ascii_case("description")))
        .and_then(|tag| attr(tag, &CONTENT_ATTR_RE))
        .map(|c| decode_entities(c).trim().to_string())
        .filter(|c| !c.is_empty())
}

pub fn headings(html: &str, limit: usize) -> Vec<String> {
    H1_RE
        .captures_iter(html)
        .map(|c| inner_text(&c[1]))
        .filter(|h| !h.is_empty())
        .take(limit)
        .collect()
}

pub fn site_profile(html: &str) -> SiteProfile {
    SiteProfile {
        title: page_title(html).unwrap_or_default(),
        meta_description: meta_description(html).unwrap_or_default(),
        headings: headings(html, 3),
    }
}

/// RSS/Atom feeds advertised with `<link type="application/rss+xml" href=...>`.
pub fn feed_links(html: &str, base_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };
    LINK_TAG_RE
        .find_iter(html)
        .map(|m| m.as_str())
        .filter(|tag| {
            attr(tag, &TYPE_ATTR_RE).is_some_and(|t| {
                let t = t.to_ascii_lowercase();
                t == "application/rss+xml" || t == "application/atom+xml"
            })
        })
        .filter_map(|tag| attr(tag, &HREF_ATTR_RE))
        .filter_map(|href| resolve(&base, href))
        .map(|u| u.to_string())
        .collect()
}

/// Resolved URLs of every `<script src>` and `<link href>`, in document order
/// with scripts first.
pub fn asset_urls(html: &str, base_url: &str) -> Vec<Url> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };
    let scripts = SCRIPT_SRC_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1).map(|m| m.as_str()));
    let links = LINK_TAG_RE
        .find_iter(html)
        .filter_map(|m| attr(m.as_str(), &HREF_ATTR_RE));

    scripts
        .chain(links)
        .filter_map(|href| resolve(&base, href))
        .collect()
}

/// Short text lines that mention a job-title keyword.
pub fn job_lines(html: &str) -> Vec<String> {
    let without_scripts = SCRIPT_BLOCK_RE.replace_all(html, " ");
    let without_styles = STYLE_BLOCK_RE.replace_all(&without_scripts, " ");
    let broken = BLOCK_BREAK_RE.replace_all(&without_styles, "\n");
    let text = decode_entities(&TAG_RE.replace_all(&broken, " "));

    LINE_SPLIT_RE
        .split(&text)
        .map(|line| WS_RE.replace_all(line, " ").trim().to_string())
        .filter(|line| {
            !line.is_empty()
                && line.chars().count() < MAX_JOB_LINE_LEN
                && JOB_TITLE_RE.is_match(line)
        })
        .take(MAX_JOB_LINES)
        .collect()
}
