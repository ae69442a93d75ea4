//! Per-key fixed-window admission control.
//!
//! Each key owns a bucket `{window_start, count}` over a 60s window. When the
//! bucket is full the caller sleeps until the window resets and is then let
//! through without being re-checked. Several callers parked on the same key
//! therefore wake together and are all admitted, which can briefly exceed the
//! nominal per-minute rate. That burst is accepted.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

pub const WINDOW: Duration = Duration::from_secs(60);
const SAFETY_MARGIN: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy)]
struct Bucket {
    window_start: Instant,
    count: u32,
}

/// Bucket store shared by every run that holds the same instance.
/// Construct one per orchestrator or per tenant.
#[derive(Debug, Default)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve once the caller may make a request against `key`.
    pub async fn throttle(&self, key: &str, per_minute: u32) {
        let Some(wait) = self.admit(key, per_minute.max(1)) else {
            return;
        };
        debug!(
            key,
            per_minute,
            wait_ms = wait.as_millis() as u64,
            "Rate limit reached, waiting for window reset"
        );
        tokio::time::sleep(wait).await;
    }

    /// Count the call if the window has room, otherwise return how long to wait.
    fn admit(&self, key: &str, per_minute: u32) -> Option<Duration> {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            window_start: now,
            count: 0,
        });

        let elapsed = now.duration_since(bucket.window_start);
        if elapsed >= WINDOW {
            bucket.window_start = now;
            bucket.count = 0;
        }

        if bucket.count < per_minute {
            bucket.count += 1;
            return None;
        }

        Some(WINDOW.saturating_sub(now.duration_since(bucket.window_start)) + SAFETY_MARGIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn admits_per_minute_calls_immediately() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        for _ in 0..3 {
            limiter.throttle("website", 3).await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn fourth_call_waits_for_window_reset() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        for _ in 0..4 {
            limiter.throttle("website", 3).await;
        }
        assert!(start.elapsed() >= WINDOW, "elapsed {:?}", start.elapsed());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_only_covers_the_rest_of_the_window() {
        let limiter = RateLimiter::new();
        limiter.throttle("rss", 1).await;
        tokio::time::advance(Duration::from_secs(45)).await;

        let start = Instant::now();
        limiter.throttle("rss", 1).await;
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(15));
        assert!(waited < Duration::from_secs(16));
    }

    #[tokio::test(start_paused = true)]
    async fn keys_have_independent_buckets() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        limiter.throttle("rss", 1).await;
        limiter.throttle("jobs", 1).await;
        limiter.throttle("tech", 1).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_window_resets_the_count() {
        let limiter = RateLimiter::new();
        limiter.throttle("jobs", 2).await;
        limiter.throttle("jobs", 2).await;
        tokio::time::advance(WINDOW).await;

        let start = Instant::now();
        limiter.throttle("jobs", 2).await;
        limiter.throttle("jobs", 2).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
