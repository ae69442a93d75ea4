// Test doubles for the fetch seam.
//
// - MockFetcher (PageFetcher) — HashMap-based URL→markup, records every call

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use crate::error::{FetchError, Result};
use crate::fetcher::PageFetcher;

/// HashMap-based page fetcher. Unregistered URLs answer 404.
/// Builder pattern: `.on_page()`, `.on_flaky()`.
#[derive(Default)]
pub struct MockFetcher {
    pages: HashMap<String, String>,
    failures_left: Mutex<HashMap<String, u32>>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(normalize(url), html.to_string());
        self
    }

    /// Fail the first `failures` fetches of `url` with a 503, then serve `html`.
    pub fn on_flaky(mut self, url: &str, failures: u32, html: &str) -> Self {
        let key = normalize(url);
        self.failures_left
            .get_mut()
            .unwrap()
            .insert(key.clone(), failures);
        self.pages.insert(key, html.to_string());
        self
    }

    /// Every URL requested so far, in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        let key = normalize(url);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|u| **u == key)
            .count()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let key = normalize(url);
        self.calls.lock().unwrap().push(key.clone());

        if let Some(left) = self.failures_left.lock().unwrap().get_mut(&key) {
            if *left > 0 {
                *left -= 1;
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: 503,
                });
            }
        }

        self.pages
            .get(&key)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn normalize(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}
