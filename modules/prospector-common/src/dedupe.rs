use std::collections::HashSet;

use crate::types::{JobPosting, NewsItem, TechSignal};

/// Identity used to collapse duplicate records. `None` (or an empty key)
/// means the record has no identity and is always kept.
pub trait DedupeKey {
    fn dedupe_key(&self) -> Option<String>;
}

/// Stable dedupe: keeps the first item per lower-cased key.
pub fn dedupe_by_key<T, F>(items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> Option<String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| match normalize(key(item)) {
            Some(k) => seen.insert(k),
            None => true,
        })
        .collect()
}

pub fn dedupe<T: DedupeKey>(items: Vec<T>) -> Vec<T> {
    dedupe_by_key(items, T::dedupe_key)
}

fn normalize(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_lowercase()).filter(|k| !k.is_empty())
}

fn first_present(a: &Option<String>, b: &Option<String>) -> Option<String> {
    [a, b]
        .into_iter()
        .flatten()
        .find(|v| !v.trim().is_empty())
        .cloned()
}

impl DedupeKey for NewsItem {
    fn dedupe_key(&self) -> Option<String> {
        first_present(&self.url, &self.title)
    }
}

impl DedupeKey for JobPosting {
    /// Job lines scraped from one careers page share its URL, so the title
    /// is part of the key whenever both are known. A consequence: a posting
    /// with only a URL and one with the same URL plus a title have different
    /// keys and are both kept.
    fn dedupe_key(&self) -> Option<String> {
        let url = self.url.as_deref().filter(|u| !u.trim().is_empty());
        let title = self.title.as_deref().filter(|t| !t.trim().is_empty());
        match (url, title) {
            (Some(u), Some(t)) => Some(format!("{u}\n{t}")),
            (Some(v), None) | (None, Some(v)) => Some(v.to_string()),
            (None, None) => None,
        }
    }
}

impl DedupeKey for TechSignal {
    fn dedupe_key(&self) -> Option<String> {
        first_present(&self.name, &self.slug)
    }
}
