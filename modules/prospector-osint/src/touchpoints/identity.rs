use async_trait::async_trait;
use prospector_common::{Evidence, Fragment, OsintQuery};

use crate::touchpoint::Collect;

/// Fills in domain and homepage from whichever one the caller supplied.
/// No network.
pub struct Identity;

#[async_trait]
impl Collect for Identity {
    async fn collect(&self, query: &OsintQuery) -> anyhow::Result<Fragment> {
        let homepage_url = query.resolved_homepage();
        let evidence = homepage_url
            .iter()
            .map(|url| Evidence::new(url.clone(), "Resolved identity"))
            .collect();

        Ok(Fragment {
            company_name: query.company_name.clone(),
            domain: query.resolved_domain(),
            homepage_url,
            evidence,
            ..Fragment::empty()
        })
    }
}
