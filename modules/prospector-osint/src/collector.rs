use std::sync::Arc;

use async_trait::async_trait;
use clap::ValueEnum;
use prospector_common::{Config, OsintContext, OsintError, OsintQuery, Result};
use prospector_web::PageFetcher;
use tracing::{info, warn};

use crate::orchestrator::Orchestrator;
use crate::touchpoint::Collect;
use crate::touchpoints::{
    default_registry, CareersDiscovery, Identity, NewsDiscovery, TechFingerprint, Website,
};

/// Items kept from the sweep's news crawl.
pub const SWEEP_NEWS_LIMIT: usize = 20;
/// Job lines kept from the sweep's careers crawl.
pub const SWEEP_JOBS_LIMIT: usize = 50;

/// A whole-run collection strategy.
#[async_trait]
pub trait Collector: Send + Sync {
    fn name(&self) -> &str;

    async fn collect(&self, query: &OsintQuery) -> Result<OsintContext>;
}

/// Staged touchpoint pipeline.
pub struct StagedCollector {
    orchestrator: Orchestrator,
}

impl StagedCollector {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl Collector for StagedCollector {
    fn name(&self) -> &str {
        "staged"
    }

    async fn collect(&self, query: &OsintQuery) -> Result<OsintContext> {
        self.orchestrator.build_context(query).await
    }
}

/// Stage-less sweep of the company site: homepage facts, tech fingerprint,
/// a news crawl and a careers crawl. Individual failures become evidence.
pub struct SiteSweepCollector {
    fetcher: Arc<dyn PageFetcher>,
}

impl SiteSweepCollector {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Collector for SiteSweepCollector {
    fn name(&self) -> &str {
        "sweep"
    }

    async fn collect(&self, query: &OsintQuery) -> Result<OsintContext> {
        let homepage = query
            .resolved_homepage()
            .ok_or_else(|| anyhow::anyhow!("site sweep needs a homepage or domain"))?;

        let mut ctx = OsintContext::default();
        ctx.merge(Identity.collect(query).await?);

        let website = Website::new(self.fetcher.clone());
        let tech = TechFingerprint::new(self.fetcher.clone());
        let news = NewsDiscovery::new(self.fetcher.clone()).with_limit(SWEEP_NEWS_LIMIT);
        let careers = CareersDiscovery::new(self.fetcher.clone()).with_limit(SWEEP_JOBS_LIMIT);

        let (site, fingerprint, news, jobs) = futures::join!(
            website.collect(query),
            tech.collect(query),
            news.crawl_only(&homepage),
            careers.crawl_only(&homepage),
        );
        for (id, result) in [("website", site), ("tech", fingerprint)] {
            match result {
                Ok(fragment) => ctx.merge(fragment),
                Err(e) => ctx.record_touchpoint_error(id, &format!("{e:#}")),
            }
        }
        ctx.merge(news);
        ctx.merge(jobs);
        ctx.dedupe_signals();

        info!(
            homepage = homepage.as_str(),
            news = ctx.news.len(),
            jobs = ctx.jobs.len(),
            tech = ctx.tech.len(),
            "Site sweep complete"
        );
        Ok(ctx)
    }
}

/// Collectors tried in a fixed order. The first success wins; if all fail,
/// the last error is returned.
pub struct FallbackChain {
    collectors: Vec<Box<dyn Collector>>,
}

impl FallbackChain {
    pub fn new(collectors: Vec<Box<dyn Collector>>) -> Self {
        Self { collectors }
    }

    pub fn names(&self) -> Vec<&str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }
}

#[async_trait]
impl Collector for FallbackChain {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn collect(&self, query: &OsintQuery) -> Result<OsintContext> {
        let mut last_err = None;
        for collector in &self.collectors {
            match collector.collect(query).await {
                Ok(ctx) => {
                    info!(collector = collector.name(), "Collector succeeded");
                    return Ok(ctx);
                }
                Err(e) => {
                    warn!(collector = collector.name(), error = %e, "Collector failed, trying next");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or(OsintError::NoCollectors))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CollectorStrategy {
    #[default]
    Staged,
    Sweep,
    StagedThenSweep,
}

impl CollectorStrategy {
    /// Build the chain for this strategy over the default registry.
    pub fn build(self, fetcher: Arc<dyn PageFetcher>, config: &Config) -> FallbackChain {
        let staged = || -> Box<dyn Collector> {
            let registry = default_registry(fetcher.clone(), &config.rate_limits);
            Box::new(StagedCollector::new(Orchestrator::new(registry, config.pipeline)))
        };
        let sweep = || -> Box<dyn Collector> { Box::new(SiteSweepCollector::new(fetcher.clone())) };

        match self {
            Self::Staged => FallbackChain::new(vec![staged()]),
            Self::Sweep => FallbackChain::new(vec![sweep()]),
            Self::StagedThenSweep => FallbackChain::new(vec![staged(), sweep()]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospector_web::testing::MockFetcher;

    struct Failing(&'static str);

    #[async_trait]
    impl Collector for Failing {
        fn name(&self) -> &str {
            self.0
        }

        async fn collect(&self, _query: &OsintQuery) -> Result<OsintContext> {
            Err(OsintError::Config(format!("{} broke", self.0)))
        }
    }

    struct Fixed;

    #[async_trait]
    impl Collector for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn collect(&self, query: &OsintQuery) -> Result<OsintContext> {
            Ok(OsintContext {
                domain: query.domain.clone(),
                ..OsintContext::default()
            })
        }
    }

    #[tokio::test]
    async fn empty_chain_reports_no_collectors() {
        let err = FallbackChain::new(Vec::new())
            .collect(&OsintQuery::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OsintError::NoCollectors));
    }

    #[tokio::test]
    async fn first_success_wins() {
        let chain = FallbackChain::new(vec![Box::new(Failing("a")), Box::new(Fixed), Box::new(Failing("b"))]);
        let ctx = chain
            .collect(&OsintQuery::new().with_domain("acme.test"))
            .await
            .unwrap();
        assert_eq!(ctx.domain.as_deref(), Some("acme.test"));
    }

    #[tokio::test]
    async fn last_error_is_returned() {
        let chain = FallbackChain::new(vec![Box::new(Failing("a")), Box::new(Failing("b"))]);
        let err = chain.collect(&OsintQuery::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "configuration error: b broke");
    }

    #[test]
    fn strategies_build_expected_chains() {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(MockFetcher::new());
        let config = Config::default();
        assert_eq!(CollectorStrategy::Staged.build(fetcher.clone(), &config).names(), vec!["staged"]);
        assert_eq!(
            CollectorStrategy::StagedThenSweep.build(fetcher, &config).names(),
            vec!["staged", "sweep"]
        );
    }

    #[tokio::test]
    async fn sweep_collects_site_signals() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .on_page(
                    "https://acme.test/",
                    r#"<title>Acme</title>
                       <script src="https://www.google-analytics.com/analytics.js"></script>
                       <a href="/press">Press</a><a href="/careers">Careers</a>"#,
                )
                .on_page("https://acme.test/press", r#"<a href="/press/launch">Acme launches</a>"#)
                .on_page("https://acme.test/careers", "<li>Field Engineer</li>"),
        );
        let ctx = SiteSweepCollector::new(fetcher)
            .collect(&OsintQuery::new().with_domain("acme.test"))
            .await
            .unwrap();

        assert_eq!(ctx.site.as_ref().map(|s| s.title.as_str()), Some("Acme"));
        assert_eq!(ctx.tech[0].name.as_deref(), Some("Google Analytics"));
        assert!(ctx.news.iter().any(|n| n.title.as_deref() == Some("Acme launches")));
        assert_eq!(ctx.jobs.len(), 1);
    }

    #[tokio::test]
    async fn sweep_needs_a_homepage() {
        let err = SiteSweepCollector::new(Arc::new(MockFetcher::new()))
            .collect(&OsintQuery::new().with_company_name("Acme"))
            .await
            .unwrap_err();
        assert!(matches!(err, OsintError::Other(_)));
    }
}
