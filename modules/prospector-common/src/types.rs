use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dedupe::dedupe;

/// Evidence URL used for synthetic entries that do not point at a real page.
pub const SYNTHETIC_EVIDENCE_URL: &str = "#";

// --- Query ---

/// Seed for one collection run. Any subset of fields may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsintQuery {
    pub company_name: Option<String>,
    pub domain: Option<String>,
    pub homepage_url: Option<String>,
}

impl OsintQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = Some(name.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_homepage_url(mut self, url: impl Into<String>) -> Self {
        self.homepage_url = Some(url.into());
        self
    }

    /// Homepage URL, derived from the domain when not given explicitly.
    ///
    /// Malformed input fails closed: `None` means "no homepage known".
    pub fn resolved_homepage(&self) -> Option<String> {
        if let Some(url) = non_empty(self.homepage_url.as_deref()) {
            return parse_web_url(url).map(|u| u.to_string());
        }
        let domain = non_empty(self.domain.as_deref())?;
        parse_web_url(&format!("https://{domain}")).map(|u| u.to_string())
    }

    /// Domain, derived from the homepage host when not given explicitly.
    pub fn resolved_domain(&self) -> Option<String> {
        if let Some(domain) = non_empty(self.domain.as_deref()) {
            return Some(domain.to_string());
        }
        let url = non_empty(self.homepage_url.as_deref())?;
        parse_web_url(url).and_then(|u| u.host_str().map(str::to_string))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse an absolute http(s) URL with a host.
pub fn parse_web_url(raw: &str) -> Option<url::Url> {
    let parsed = url::Url::parse(raw.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return None;
    }
    Some(parsed)
}

// --- Signal records ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub url: Option<String>,
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl NewsItem {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            title: Some(title.into()),
            published_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub url: Option<String>,
    pub title: Option<String>,
}

impl JobPosting {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            title: Some(title.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechSignal {
    pub name: Option<String>,
    pub slug: Option<String>,
}

impl TechSignal {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            slug: Some(name.to_lowercase().replace(' ', "-")),
        }
    }
}

/// Corporate registry facts. Registry touchpoints are placeholders, so
/// `status` is usually "Unknown".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpFacts {
    pub legal_name: String,
    pub status: String,
    #[serde(default)]
    pub officers: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialProfile {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcurementRecord {
    pub title: String,
    pub url: Option<String>,
    pub agency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveSnapshot {
    pub url: String,
    pub captured_at: Option<DateTime<Utc>>,
}

/// Homepage facts: `<title>`, meta description, first headings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteProfile {
    pub title: String,
    pub meta_description: String,
    pub headings: Vec<String>,
}

/// Provenance entry. Never deduped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub url: String,
    pub title: String,
}

impl Evidence {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

// --- Fragment ---

/// Partial result produced by one touchpoint call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fragment {
    pub company_name: Option<String>,
    pub domain: Option<String>,
    pub homepage_url: Option<String>,
    pub corp: Option<CorpFacts>,
    pub site: Option<SiteProfile>,
    pub news: Vec<NewsItem>,
    pub jobs: Vec<JobPosting>,
    pub tech: Vec<TechSignal>,
    pub social: Vec<SocialProfile>,
    pub procurement: Vec<ProcurementRecord>,
    pub archives: Vec<ArchiveSnapshot>,
    pub evidence: Vec<Evidence>,
}

impl Fragment {
    pub fn empty() -> Self {
        Self::default()
    }
}

// --- Context ---

/// Accumulator for one run. Starts empty and is filled only by merged
/// fragments. Scalars are first-known-wins; collections are append-only, with `news`/`jobs`/`tech` deduped after each merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsintContext {
    pub company_name: Option<String>,
    pub domain: Option<String>,
    pub homepage_url: Option<String>,
    pub corp: Option<CorpFacts>,
    pub site: Option<SiteProfile>,
    pub news: Vec<NewsItem>,
    pub jobs: Vec<JobPosting>,
    pub tech: Vec<TechSignal>,
    pub social: Vec<SocialProfile>,
    pub procurement: Vec<ProcurementRecord>,
    pub archives: Vec<ArchiveSnapshot>,
    pub evidence: Vec<Evidence>,
}

impl OsintContext {
    pub fn merge(&mut self, fragment: Fragment) {
        set_once(&mut self.company_name, fragment.company_name);
        set_once(&mut self.domain, fragment.domain);
        set_once(&mut self.homepage_url, fragment.homepage_url);
        if self.corp.is_none() {
            self.corp = fragment.corp;
        }
        if self.site.is_none() {
            self.site = fragment.site;
        }
        self.news.extend(fragment.news);
        self.jobs.extend(fragment.jobs);
        self.tech.extend(fragment.tech);
        self.social.extend(fragment.social);
        self.procurement.extend(fragment.procurement);
        self.archives.extend(fragment.archives);
        self.evidence.extend(fragment.evidence);
    }

    /// Collapse duplicate news, jobs and tech entries. Idempotent.
    pub fn dedupe_signals(&mut self) {
        self.news = dedupe(std::mem::take(&mut self.news));
        self.jobs = dedupe(std::mem::take(&mut self.jobs));
        self.tech = dedupe(std::mem::take(&mut self.tech));
    }

    pub fn record_touchpoint_error(&mut self, touchpoint_id: &str, message: &str) {
        self.evidence.push(Evidence::new(
            SYNTHETIC_EVIDENCE_URL,
            format!("Touchpoint error: {touchpoint_id} – {message}"),
        ));
    }
}

fn set_once(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_some() {
        return;
    }
    if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
        *slot = Some(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homepage_is_derived_from_domain() {
        let q = OsintQuery::new().with_domain("acme.test");
        assert_eq!(q.resolved_homepage().as_deref(), Some("https://acme.test/"));
    }

    #[test]
    fn domain_is_derived_from_homepage() {
        let q = OsintQuery::new().with_homepage_url("https://www.acme.test/about");
        assert_eq!(q.resolved_domain().as_deref(), Some("www.acme.test"));
    }

    #[test]
    fn malformed_homepage_fails_closed() {
        let q = OsintQuery::new().with_homepage_url("not a url");
        assert_eq!(q.resolved_homepage(), None);
        assert_eq!(q.resolved_domain(), None);

        let q = OsintQuery::new().with_homepage_url("ftp://acme.test");
        assert_eq!(q.resolved_homepage(), None);
    }

    #[test]
    fn scalars_are_first_known_wins() {
        let mut ctx = OsintContext::default();
        ctx.merge(Fragment {
            company_name: Some("Acme".into()),
            ..Default::default()
        });
        ctx.merge(Fragment {
            company_name: Some("Other".into()),
            domain: Some("acme.test".into()),
            ..Default::default()
        });
        ctx.merge(Fragment {
            domain: Some("second.test".into()),
            ..Default::default()
        });
        assert_eq!(ctx.company_name.as_deref(), Some("Acme"));
        assert_eq!(ctx.domain.as_deref(), Some("acme.test"));
    }

    #[test]
    fn blank_scalar_does_not_claim_the_slot() {
        let mut ctx = OsintContext::default();
        ctx.merge(Fragment {
            domain: Some("  ".into()),
            ..Default::default()
        });
        ctx.merge(Fragment {
            domain: Some("acme.test".into()),
            ..Default::default()
        });
        assert_eq!(ctx.domain.as_deref(), Some("acme.test"));
    }

    #[test]
    fn corp_is_first_known_wins() {
        let corp = |name: &str| CorpFacts {
            legal_name: name.into(),
            status: "Unknown".into(),
            officers: vec![],
            sources: vec![],
        };
        let mut ctx = OsintContext::default();
        ctx.merge(Fragment {
            corp: Some(corp("Acme Inc")),
            ..Default::default()
        });
        ctx.merge(Fragment {
            corp: Some(corp("Acme LLC")),
            ..Default::default()
        });
        assert_eq!(ctx.corp.map(|c| c.legal_name).as_deref(), Some("Acme Inc"));
    }

    #[test]
    fn evidence_is_never_deduped() {
        let mut ctx = OsintContext::default();
        for _ in 0..2 {
            ctx.merge(Fragment {
                evidence: vec![Evidence::new("https://a", "Homepage")],
                ..Default::default()
            });
            ctx.dedupe_signals();
        }
        assert_eq!(ctx.evidence.len(), 2);
    }

    #[test]
    fn touchpoint_error_is_recorded_as_evidence() {
        let mut ctx = OsintContext::default();
        ctx.record_touchpoint_error("rss", "fetch failed");
        assert_eq!(ctx.evidence[0].url, "#");
        assert_eq!(ctx.evidence[0].title, "Touchpoint error: rss – fetch failed");
    }

    #[test]
    fn context_serializes_camel_case() {
        let mut ctx = OsintContext::default();
        ctx.merge(Fragment {
            homepage_url: Some("https://acme.test".into()),
            ..Default::default()
        });
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["homepageUrl"], "https://acme.test");
        assert!(json["news"].as_array().unwrap().is_empty());
    }
}
