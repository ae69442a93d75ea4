use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use tracing::{debug, info};
use url::Url;

use crate::fetcher::PageFetcher;
use crate::links::{extract_anchors, is_crawlable, is_same_origin};

pub const DEFAULT_MAX_PAGES: usize = 15;
pub const MIN_PAGES: usize = 5;
pub const MAX_PAGES: usize = 30;

/// Bounds for one crawl. `max_pages` is clamped to `[MIN_PAGES, MAX_PAGES]`.
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    pub max_pages: Option<usize>,
    pub include_patterns: Vec<String>,
}

impl CrawlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include_patterns.push(pattern.into());
        self
    }

    pub fn page_cap(&self) -> usize {
        self.max_pages
            .unwrap_or(DEFAULT_MAX_PAGES)
            .clamp(MIN_PAGES, MAX_PAGES)
    }

    /// Patterns match case-insensitively; one that is not a valid regex is
    /// matched as a literal substring.
    fn compile_patterns(&self) -> Vec<Regex> {
        self.include_patterns
            .iter()
            .filter_map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .or_else(|_| {
                        RegexBuilder::new(&regex::escape(p))
                            .case_insensitive(true)
                            .build()
                    })
                    .ok()
            })
            .collect()
    }
}

/// A visited page whose URL matched the include patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlHit {
    pub url: String,
    pub html: String,
}

/// Breadth-first, same-origin crawler with a hard page cap.
pub struct BoundedCrawler {
    fetcher: Arc<dyn PageFetcher>,
}

impl BoundedCrawler {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Crawl from `start_url`, returning hits in visit order. Never fails:
    /// an unparseable start URL yields nothing and fetch errors skip the page.
    pub async fn crawl(&self, start_url: &str, options: &CrawlOptions) -> Vec<CrawlHit> {
        let Ok(origin) = Url::parse(start_url) else {
            debug!(start_url, "Invalid crawl start URL");
            return Vec::new();
        };

        let cap = options.page_cap();
        let patterns = options.compile_patterns();

        let mut visited: HashSet<String> = HashSet::new();
        let mut queued: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        let mut hits = Vec::new();

        queued.insert(origin.to_string());
        queue.push_back(origin.to_string());

        while let Some(url) = queue.pop_front() {
            if visited.len() >= cap {
                break;
            }
            if !visited.insert(url.clone()) {
                continue;
            }

            let html = match self.fetcher.fetch_text(&url).await {
                Ok(html) => html,
                Err(e) => {
                    debug!(url = url.as_str(), error = %e, "Crawl fetch failed, skipping");
                    continue;
                }
            };

            for anchor in extract_anchors(&html, &url) {
                let Ok(link) = Url::parse(&anchor.href) else {
                    continue;
                };
                if !is_same_origin(&origin, &link) || !is_crawlable(&link) {
                    continue;
                }
                let link = link.to_string();
                if visited.contains(&link) || queued.contains(&link) {
                    continue;
                }
                if visited.len() + queue.len() >= cap {
                    break;
                }
                queued.insert(link.clone());
                queue.push_back(link);
            }

            if patterns.is_empty() || patterns.iter().any(|p| p.is_match(&url)) {
                hits.push(CrawlHit { url, html });
            }
        }

        info!(
            start_url,
            fetcher = self.fetcher.name(),
            visited = visited.len(),
            hits = hits.len(),
            "Crawl complete"
        );
        hits
    }
}
