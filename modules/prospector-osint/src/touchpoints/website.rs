use std::sync::Arc;

use async_trait::async_trait;
use prospector_common::{Evidence, Fragment, OsintQuery};
use prospector_web::{html, PageFetcher};
use tracing::debug;

use crate::touchpoint::Collect;

/// Homepage title, meta description and leading headings.
pub struct Website {
    fetcher: Arc<dyn PageFetcher>,
}

impl Website {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Collect for Website {
    async fn collect(&self, query: &OsintQuery) -> anyhow::Result<Fragment> {
        let Some(homepage) = query.resolved_homepage() else {
            debug!("No homepage known, skipping website");
            return Ok(Fragment::empty());
        };

        let page = self.fetcher.fetch_text(&homepage).await?;
        let site = html::site_profile(&page);
        let title = if site.title.is_empty() {
            "Homepage".to_string()
        } else {
            format!("Homepage: {}", site.title)
        };

        Ok(Fragment {
            homepage_url: Some(homepage.clone()),
            evidence: vec![Evidence::new(homepage, title)],
            site: Some(site),
            ..Fragment::empty()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::touchpoint::{Touchpoint, TOUCHPOINT_BASE_DELAY};
    use prospector_common::{RateLimiter, RetryPolicy};
    use prospector_web::testing::MockFetcher;

    #[tokio::test]
    async fn reads_site_profile() {
        let fetcher = Arc::new(MockFetcher::new().on_page(
            "https://acme.test/",
            "<title>Acme Anvils</title><meta name=\"description\" content=\"Anvils\"><h1>We make anvils</h1>",
        ));
        let f = Website::new(fetcher)
            .collect(&OsintQuery::new().with_domain("acme.test"))
            .await
            .unwrap();

        let site = f.site.unwrap();
        assert_eq!(site.title, "Acme Anvils");
        assert_eq!(site.meta_description, "Anvils");
        assert_eq!(site.headings, vec!["We make anvils"]);
        assert_eq!(f.evidence[0].title, "Homepage: Acme Anvils");
    }

    #[tokio::test]
    async fn fetch_failure_is_an_error() {
        let fetcher = Arc::new(MockFetcher::new());
        let result = Website::new(fetcher)
            .collect(&OsintQuery::new().with_domain("acme.test"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn no_homepage_is_empty() {
        let fetcher = Arc::new(MockFetcher::new());
        let f = Website::new(fetcher.clone())
            .collect(&OsintQuery::new().with_company_name("Acme"))
            .await
            .unwrap();
        assert!(f.site.is_none());
        assert!(fetcher.fetched().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn touchpoint_retries_a_flaky_homepage() {
        let fetcher = Arc::new(MockFetcher::new().on_flaky("https://acme.test/", 2, "<title>Acme</title>"));
        let tp = Touchpoint::builder()
            .id("website")
            .stage(1)
            .rate_key("website")
            .per_minute(60)
            .retry(RetryPolicy::new(3, TOUCHPOINT_BASE_DELAY))
            .collector(Arc::new(Website::new(fetcher.clone())))
            .build();

        let f = tp
            .run(&OsintQuery::new().with_domain("acme.test"), &RateLimiter::new())
            .await
            .unwrap();

        assert_eq!(f.evidence[0].title, "Homepage: Acme");
        assert_eq!(fetcher.fetch_count("https://acme.test/"), 3);
    }
}
