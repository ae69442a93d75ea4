use std::sync::Arc;

use async_trait::async_trait;
use prospector_common::{dedupe, Evidence, Fragment, JobPosting, OsintQuery};
use prospector_web::{html, BoundedCrawler, CrawlOptions, PageFetcher};
use tracing::{debug, info};
use url::Url;

use crate::touchpoint::Collect;

pub const MAX_JOBS: usize = 50;
/// Below this many lines from the guessed pages, crawl for more.
const CRAWL_THRESHOLD: usize = 10;
const CAREERS_PATHS: &[&str] = &[
    "/careers",
    "/jobs",
    "/about/careers",
    "/company/careers",
    "/about-us/careers",
    "/join-us",
];
const CAREERS_PATTERNS: &[&str] = &[
    "careers", "jobs", "join", "work-with", "employment", "positions", "opportun",
];
const CRAWL_PAGES: usize = 20;

/// Job-title lines from the homepage and the usual careers paths, topped up
/// by a careers-focused crawl when those come back thin.
pub struct CareersDiscovery {
    fetcher: Arc<dyn PageFetcher>,
    limit: usize,
}

impl CareersDiscovery {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            limit: MAX_JOBS,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Skip the guessed URLs and go straight to the crawl.
    pub async fn crawl_only(&self, homepage: &str) -> Fragment {
        let mut out = Fragment::empty();
        self.from_crawl(homepage, &mut out).await;
        out.jobs.truncate(self.limit);
        out
    }

    async fn from_guesses(&self, homepage: &Url, out: &mut Fragment) {
        for url in guessed_urls(homepage) {
            let page = match self.fetcher.fetch_text(&url).await {
                Ok(page) => page,
                Err(e) => {
                    debug!(url = url.as_str(), error = %e, "Careers page unavailable");
                    continue;
                }
            };
            if collect_lines(&page, &url, "Careers", out) && out.jobs.len() >= self.limit {
                break;
            }
        }
    }

    async fn from_crawl(&self, homepage: &str, out: &mut Fragment) {
        let options = CAREERS_PATTERNS
            .iter()
            .fold(CrawlOptions::new().with_max_pages(CRAWL_PAGES), |o, p| o.include(*p));
        let hits = BoundedCrawler::new(self.fetcher.clone())
            .crawl(homepage, &options)
            .await;
        for hit in hits {
            if collect_lines(&hit.html, &hit.url, "Careers (crawl)", out)
                && out.jobs.len() >= self.limit
            {
                break;
            }
        }
    }
}

/// Homepage first, then each careers path on the same origin, without repeats.
fn guessed_urls(homepage: &Url) -> Vec<String> {
    let mut urls = vec![homepage.to_string()];
    for path in CAREERS_PATHS {
        if let Ok(url) = homepage.join(path) {
            let url = url.to_string();
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
    }
    urls
}

/// Append job lines found on `page`. Returns whether any were found.
fn collect_lines(page: &str, url: &str, label: &str, out: &mut Fragment) -> bool {
    let lines = html::job_lines(page);
    if lines.is_empty() {
        return false;
    }
    out.evidence.push(Evidence::new(url, label));
    out.jobs
        .extend(lines.into_iter().map(|line| JobPosting::new(url, line)));
    true
}

#[async_trait]
impl Collect for CareersDiscovery {
    async fn collect(&self, query: &OsintQuery) -> anyhow::Result<Fragment> {
        let Some(homepage) = query.resolved_homepage() else {
            return Ok(Fragment::empty());
        };
        let base = Url::parse(&homepage)?;

        let mut out = Fragment::empty();
        self.from_guesses(&base, &mut out).await;
        out.jobs = dedupe(out.jobs);
        if out.jobs.len() < CRAWL_THRESHOLD {
            self.from_crawl(&homepage, &mut out).await;
            out.jobs = dedupe(out.jobs);
        }
        out.jobs.truncate(self.limit);

        info!(homepage = homepage.as_str(), jobs = out.jobs.len(), "Careers discovery complete");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospector_web::testing::MockFetcher;

    fn query() -> OsintQuery {
        OsintQuery::new().with_domain("acme.test")
    }

    #[test]
    fn guesses_start_with_homepage() {
        let home = Url::parse("https://acme.test/").unwrap();
        let urls = guessed_urls(&home);
        assert_eq!(urls[0], "https://acme.test/");
        assert_eq!(urls[1], "https://acme.test/careers");
        assert_eq!(urls.len(), 7);
    }

    #[tokio::test]
    async fn reads_lines_from_careers_path() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .on_page("https://acme.test/", "<p>Welcome</p>")
                .on_page(
                    "https://acme.test/careers",
                    "<ul><li>Backend Engineer</li><li>Account Executive</li><li>Our values</li></ul>",
                ),
        );
        let f = CareersDiscovery::new(fetcher).collect(&query()).await.unwrap();

        let titles: Vec<_> = f.jobs.iter().filter_map(|j| j.title.as_deref()).collect();
        assert_eq!(titles, vec!["Backend Engineer", "Account Executive"]);
        assert_eq!(f.evidence[0], Evidence::new("https://acme.test/careers", "Careers"));
    }

    #[tokio::test]
    async fn thin_results_trigger_crawl() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .on_page("https://acme.test/", r#"<a href="/work-with-us">Work with us</a>"#)
                .on_page(
                    "https://acme.test/work-with-us",
                    "<li>Data Analyst</li><li>Support Specialist</li>",
                ),
        );
        let f = CareersDiscovery::new(fetcher).collect(&query()).await.unwrap();

        assert_eq!(f.jobs.len(), 2);
        assert!(f.evidence.iter().any(|e| e.title == "Careers (crawl)"));
    }

    #[tokio::test]
    async fn results_are_capped() {
        let many: String = (0..40).map(|i| format!("<li>Engineer {i}</li>")).collect();
        let fetcher = Arc::new(
            MockFetcher::new()
                .on_page("https://acme.test/careers", &many)
                .on_page("https://acme.test/jobs", &many.replace("Engineer", "Designer")),
        );
        let f = CareersDiscovery::new(fetcher).collect(&query()).await.unwrap();
        assert_eq!(f.jobs.len(), MAX_JOBS);
    }
}
