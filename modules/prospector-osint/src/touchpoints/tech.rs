use std::sync::Arc;

use async_trait::async_trait;
use prospector_common::{Evidence, Fragment, OsintQuery, TechSignal};
use prospector_web::{html, PageFetcher};
use url::Url;

use crate::touchpoint::Collect;

/// Vendor name and the fragments of asset URLs that give it away.
const VENDORS: &[(&str, &[&str])] = &[
    ("Google Analytics", &["googletagmanager.com", "google-analytics.com"]),
    ("Tag Manager", &["googletagmanager.com"]),
    ("HubSpot", &["hs-scripts.com", "hscollectedforms.net", "hubspot.com"]),
    ("Marketo", &["marketo", "mktoss"]),
    ("Salesforce", &["salesforce", "pardot"]),
    ("Cloudflare", &["cloudflare"]),
    ("Shopify", &["shopify", "cdn.shopify"]),
    ("WordPress", &["wp-content", "wp-includes"]),
];

/// Fingerprints the homepage's third-party scripts and stylesheets.
pub struct TechFingerprint {
    fetcher: Arc<dyn PageFetcher>,
}

impl TechFingerprint {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

/// Vendors whose needles appear in any asset's host or path, in table order.
pub fn match_vendors(assets: &[Url]) -> Vec<TechSignal> {
    let haystacks: Vec<String> = assets
        .iter()
        .map(|u| format!("{}{}", u.host_str().unwrap_or(""), u.path()).to_ascii_lowercase())
        .collect();

    VENDORS
        .iter()
        .filter(|(_, needles)| {
            haystacks
                .iter()
                .any(|h| needles.iter().any(|n| h.contains(n)))
        })
        .map(|(name, _)| TechSignal::named(name))
        .collect()
}

#[async_trait]
impl Collect for TechFingerprint {
    async fn collect(&self, query: &OsintQuery) -> anyhow::Result<Fragment> {
        let Some(homepage) = query.resolved_homepage() else {
            return Ok(Fragment::empty());
        };
        let page = self.fetcher.fetch_text(&homepage).await?;
        let tech = match_vendors(&html::asset_urls(&page, &homepage));

        let evidence = if tech.is_empty() {
            Vec::new()
        } else {
            vec![Evidence::new(homepage, "Tech signals")]
        };
        Ok(Fragment {
            tech,
            evidence,
            ..Fragment::empty()
        })
    }
}
