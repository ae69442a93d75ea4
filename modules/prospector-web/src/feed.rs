// RSS/Atom/JSON feed parsing into news items.

use chrono::Utc;
use prospector_common::NewsItem;
use tracing::debug;

use crate::error::Result;

/// Parse a feed body, keeping at most `limit` entries in feed order.
/// Entries with neither a link nor an http id are skipped.
pub fn parse_feed(body: &str, limit: usize) -> Result<Vec<NewsItem>> {
    let feed = feed_rs::parser::parse(body.as_bytes())?;

    let items: Vec<NewsItem> = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let url = entry
                .links
                .first()
                .map(|l| l.href.trim().to_string())
                .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;

            let published_at = entry
                .published
                .or(entry.updated)
                .map(|dt| dt.with_timezone(&Utc));

            Some(NewsItem {
                url: Some(url),
                title: entry.title.map(|t| t.content.trim().to_string()),
                published_at,
            })
        })
        .take(limit)
        .collect();

    debug!(items = items.len(), "Parsed feed");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0"?>
        <rss version="2.0"><channel>
          <title>Acme News</title>
          <link>https://acme.test/</link>
          <description>Updates</description>
          <item>
            <title>Acme opens Denver plant</title>
            <link>https://acme.test/news/denver</link>
            <pubDate>Mon, 06 May 2024 10:00:00 GMT</pubDate>
          </item>
          <item>
            <title>Q1 results</title>
            <link>https://acme.test/news/q1</link>
          </item>
          <item>
            <title>Hiring spree</title>
            <link>https://acme.test/news/hiring</link>
          </item>
        </channel></rss>"#;

    #[test]
    fn rss_items_keep_feed_order() {
        let items = parse_feed(RSS, 12).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title.as_deref(), Some("Acme opens Denver plant"));
        assert_eq!(items[0].url.as_deref(), Some("https://acme.test/news/denver"));
        assert!(items[0].published_at.is_some());
        assert_eq!(items[1].published_at, None);
    }

    #[test]
    fn limit_caps_items() {
        assert_eq!(parse_feed(RSS, 2).unwrap().len(), 2);
    }

    #[test]
    fn atom_entries_are_parsed() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
            <feed xmlns="http://www.w3.org/2005/Atom">
              <title>Acme Blog</title>
              <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
              <updated>2024-05-01T12:00:00Z</updated>
              <entry>
                <title>Welcome</title>
                <link href="https://acme.test/blog/welcome"/>
                <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
                <updated>2024-05-01T12:00:00Z</updated>
              </entry>
            </feed>"#;
        let items = parse_feed(atom, 12).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url.as_deref(), Some("https://acme.test/blog/welcome"));
        assert!(items[0].published_at.is_some());
    }

    #[test]
    fn html_is_not_a_feed() {
        assert!(parse_feed("<html><body>nope</body></html>", 12).is_err());
    }
}
