//! The built-in touchpoints and the registry that stages them.

pub mod careers;
pub mod identity;
pub mod news;
pub mod placeholders;
pub mod tech;
pub mod website;

use std::sync::Arc;

use prospector_common::{OsintContext, RateLimits, RetryPolicy, SYNTHETIC_EVIDENCE_URL};
use prospector_web::PageFetcher;

use crate::touchpoint::{always_satisfied, Collect, Predicate, Touchpoint, TOUCHPOINT_BASE_DELAY};

pub use careers::CareersDiscovery;
pub use identity::Identity;
pub use news::NewsDiscovery;
pub use placeholders::{CorpRegistry, Empty};
pub use tech::TechFingerprint;
pub use website::Website;

fn identity_known(ctx: &OsintContext) -> bool {
    ctx.homepage_url.is_some() || ctx.domain.is_some()
}

/// Real (non-synthetic) evidence mentioning the homepage.
fn homepage_seen(ctx: &OsintContext) -> bool {
    ctx.evidence
        .iter()
        .any(|e| e.url != SYNTHETIC_EVIDENCE_URL && e.title.to_lowercase().contains("home"))
}

fn corp_known(ctx: &OsintContext) -> bool {
    ctx.corp.is_some()
}

fn has_news(ctx: &OsintContext) -> bool {
    !ctx.news.is_empty()
}

fn has_jobs(ctx: &OsintContext) -> bool {
    !ctx.jobs.is_empty()
}

fn has_tech(ctx: &OsintContext) -> bool {
    !ctx.tech.is_empty()
}

/// id, stage, required, rate key, retries, predicate
type Entry = (&'static str, u32, bool, &'static str, u32, Predicate);

const ENTRIES: &[Entry] = &[
    ("identity", 1, true, "identity", 2, identity_known),
    ("website", 1, true, "website", 3, homepage_seen),
    ("wikipedia", 2, false, "wikipedia", 2, corp_known),
    ("open_corporates", 2, false, "opencorp", 2, corp_known),
    ("rss", 2, true, "rss", 3, has_news),
    ("gdelt", 2, false, "gdelt", 2, has_news),
    ("jobs", 2, false, "jobs", 3, has_jobs),
    ("tech", 3, false, "tech", 2, has_tech),
    ("social", 3, false, "social", 2, always_satisfied),
    ("procurement", 3, false, "proc", 2, always_satisfied),
    ("archives", 3, false, "archives", 2, always_satisfied),
];

fn collector_for(id: &str, fetcher: &Arc<dyn PageFetcher>) -> Arc<dyn Collect> {
    match id {
        "identity" => Arc::new(Identity),
        "website" => Arc::new(Website::new(fetcher.clone())),
        "wikipedia" => Arc::new(CorpRegistry { source: "wikipedia" }),
        "open_corporates" => Arc::new(CorpRegistry { source: "open_corporates" }),
        "rss" => Arc::new(NewsDiscovery::new(fetcher.clone())),
        "jobs" => Arc::new(CareersDiscovery::new(fetcher.clone())),
        "tech" => Arc::new(TechFingerprint::new(fetcher.clone())),
        _ => Arc::new(Empty),
    }
}

/// Every built-in touchpoint, with rate budgets taken from `limits`.
pub fn default_registry(fetcher: Arc<dyn PageFetcher>, limits: &RateLimits) -> Vec<Touchpoint> {
    ENTRIES
        .iter()
        .map(|&(id, stage, required, rate_key, retries, satisfied)| {
            Touchpoint::builder()
                .id(id)
                .stage(stage)
                .required(required)
                .rate_key(rate_key)
                .per_minute(limits.per_minute(rate_key))
                .retry(RetryPolicy::new(retries, TOUCHPOINT_BASE_DELAY))
                .satisfied(satisfied)
                .collector(collector_for(id, &fetcher))
                .build()
        })
        .collect()
}
