use std::sync::Arc;

use async_trait::async_trait;
use prospector_common::{Evidence, Fragment, NewsItem, OsintQuery};
use prospector_web::{
    extract_anchors, html, parse_feed, BoundedCrawler, CrawlOptions, PageFetcher,
};
use tracing::{debug, info};
use url::Url;

use crate::touchpoint::Collect;

pub const FEED_ITEM_LIMIT: usize = 12;
const SECTION_PATHS: &[&str] = &[
    "/news", "/press", "/blog", "/insights", "/media", "/stories", "/updates",
];
const NEWS_PATTERNS: &[&str] = &["news", "press", "blog", "insights", "media", "stories", "updates"];
const LINKS_PER_SECTION: usize = 12;
const LINKS_PER_CRAWL_HIT: usize = 6;
const MAX_HEADLINE_LEN: usize = 160;
const CRAWL_PAGES: usize = 20;

/// News discovery: advertised feeds first, then well-known section paths,
/// then a crawl for news-like pages. Each step runs only if the previous
/// one found nothing.
pub struct NewsDiscovery {
    fetcher: Arc<dyn PageFetcher>,
    limit: usize,
}

impl NewsDiscovery {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            limit: FEED_ITEM_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Skip feeds and section paths and go straight to the crawl.
    pub async fn crawl_only(&self, homepage: &str) -> Fragment {
        let mut out = Fragment::empty();
        self.from_crawl(homepage, &mut out).await;
        out.news.truncate(self.limit);
        out
    }

    async fn from_feeds(&self, homepage_html: &str, homepage: &str, out: &mut Fragment) {
        for feed_url in html::feed_links(homepage_html, homepage) {
            let body = match self.fetcher.fetch_text(&feed_url).await {
                Ok(body) => body,
                Err(e) => {
                    debug!(feed_url = feed_url.as_str(), error = %e, "Feed fetch failed");
                    continue;
                }
            };
            match parse_feed(&body, self.limit) {
                Ok(items) if !items.is_empty() => {
                    out.news.extend(items);
                    out.evidence.push(Evidence::new(feed_url, "RSS feed"));
                    return;
                }
                Ok(_) => {}
                Err(e) => debug!(feed_url = feed_url.as_str(), error = %e, "Feed parse failed"),
            }
        }
    }

    async fn from_sections(&self, base: &Url, out: &mut Fragment) {
        for path in SECTION_PATHS {
            let Ok(url) = base.join(path) else { continue };
            let url = url.to_string();
            let Ok(page) = self.fetcher.fetch_text(&url).await else {
                continue;
            };
            let items = headlines(&page, &url, LINKS_PER_SECTION);
            if !items.is_empty() {
                out.news.extend(items);
                out.evidence.push(Evidence::new(url, "News/Blog"));
            }
            if out.news.len() >= self.limit {
                break;
            }
        }
    }

    async fn from_crawl(&self, homepage: &str, out: &mut Fragment) {
        let options = NEWS_PATTERNS
            .iter()
            .fold(CrawlOptions::new().with_max_pages(CRAWL_PAGES), |o, p| o.include(*p));
        let hits = BoundedCrawler::new(self.fetcher.clone())
            .crawl(homepage, &options)
            .await;
        for hit in hits {
            let items = headlines(&hit.html, &hit.url, LINKS_PER_CRAWL_HIT);
            if !items.is_empty() {
                out.news.extend(items);
                out.evidence.push(Evidence::new(hit.url, "Discovered by crawl"));
            }
            if out.news.len() >= self.limit {
                break;
            }
        }
    }
}

/// Anchors with short, non-empty text, read as headlines.
fn headlines(page: &str, url: &str, limit: usize) -> Vec<NewsItem> {
    extract_anchors(page, url)
        .into_iter()
        .filter(|a| !a.text.is_empty() && a.text.chars().count() < MAX_HEADLINE_LEN)
        .take(limit)
        .map(|a| NewsItem::new(a.href, a.text))
        .collect()
}

#[async_trait]
impl Collect for NewsDiscovery {
    async fn collect(&self, query: &OsintQuery) -> anyhow::Result<Fragment> {
        let Some(homepage) = query.resolved_homepage() else {
            return Ok(Fragment::empty());
        };
        let base = Url::parse(&homepage)?;
        let homepage_html = self.fetcher.fetch_text(&homepage).await?;

        let mut out = Fragment::empty();
        self.from_feeds(&homepage_html, &homepage, &mut out).await;
        if out.news.is_empty() {
            self.from_sections(&base, &mut out).await;
        }
        if out.news.is_empty() {
            self.from_crawl(&homepage, &mut out).await;
        }
        out.news.truncate(self.limit);

        info!(homepage = homepage.as_str(), items = out.news.len(), "News discovery complete");
        Ok(out)
    }
}
