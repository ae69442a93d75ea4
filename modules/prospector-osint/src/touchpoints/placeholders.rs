//! Sources with no live integration yet. They answer with what can be said
//! from the query alone, or nothing.

use async_trait::async_trait;
use prospector_common::{CorpFacts, Fragment, OsintQuery};

use crate::touchpoint::Collect;

/// Company facts from a public registry, seeded from the company name.
pub struct CorpRegistry {
    pub source: &'static str,
}

#[async_trait]
impl Collect for CorpRegistry {
    async fn collect(&self, query: &OsintQuery) -> anyhow::Result<Fragment> {
        let corp = query
            .company_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|name| CorpFacts {
                legal_name: name.to_string(),
                status: "Unknown".to_string(),
                officers: Vec::new(),
                sources: vec![self.source.to_string()],
            });
        Ok(Fragment {
            corp,
            ..Fragment::empty()
        })
    }
}

/// News index, social profiles, procurement and archive lookups.
pub struct Empty;

#[async_trait]
impl Collect for Empty {
    async fn collect(&self, _query: &OsintQuery) -> anyhow::Result<Fragment> {
        Ok(Fragment::empty())
    }
}
