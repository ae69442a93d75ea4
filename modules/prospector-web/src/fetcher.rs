use std::time::Duration;

use async_trait::async_trait;
use prospector_common::{parse_web_url, with_retry, Config, RetryPolicy};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use tracing::debug;

use crate::error::{FetchError, Result};

/// The shared fetch primitive: GET a page and return its markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;

    /// Fetcher name (for logging).
    fn name(&self) -> &str {
        "unknown"
    }
}

/// reqwest-backed fetcher. Sends a fixed user-agent, retries transport
/// errors, and rejects bodies that are not HTML or XML.
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(user_agent: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(FetchError::Client)?;
        Ok(Self {
            client,
            user_agent: user_agent.into(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.user_agent.clone(), config.fetch_timeout)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let target = parse_web_url(url).ok_or_else(|| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;

        let response = with_retry(self.retry, || {
            self.client
                .get(target.clone())
                .header(USER_AGENT, &self.user_agent)
                .send()
        })
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !is_markup(&content_type) {
            return Err(FetchError::NotMarkup {
                url: url.to_string(),
                content_type,
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
        debug!(url, bytes = body.len(), "Fetched page");
        Ok(body)
    }

    fn name(&self) -> &str {
        "http"
    }
}

fn is_markup(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.contains("text/html") || ct.contains("xml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospector_common::config::DEFAULT_USER_AGENT;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(DEFAULT_USER_AGENT, Some(Duration::from_secs(5)))
            .unwrap()
            .with_retry(RetryPolicy::none())
    }

    #[tokio::test]
    async fn fetches_html_with_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("user-agent", DEFAULT_USER_AGENT))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html><title>Acme</title></html>", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;

        let body = fetcher()
            .fetch_text(&format!("{}/", server.uri()))
            .await
            .unwrap();
        assert!(body.contains("<title>Acme</title>"));
    }

    #[tokio::test]
    async fn accepts_xml_feeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<rss></rss>", "application/rss+xml"))
            .mount(&server)
            .await;

        let body = fetcher()
            .fetch_text(&format!("{}/feed.xml", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<rss></rss>");
    }

    #[tokio::test]
    async fn rejects_non_markup_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data.json"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch_text(&format!("{}/data.json", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NotMarkup { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch_text(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_without_a_request() {
        let err = fetcher().fetch_text("mailto:sales@acme.test").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[test]
    fn markup_content_types() {
        assert!(is_markup("text/html; charset=UTF-8"));
        assert!(is_markup("application/atom+xml"));
        assert!(is_markup("text/xml"));
        assert!(!is_markup("application/pdf"));
        assert!(!is_markup(""));
    }
}
