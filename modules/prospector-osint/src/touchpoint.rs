use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use prospector_common::config::FALLBACK_PER_MINUTE;
use prospector_common::{with_retry, Fragment, OsintContext, OsintQuery, RateLimiter, RetryPolicy};
use typed_builder::TypedBuilder;

/// Backoff base for touchpoint-level retries.
pub const TOUCHPOINT_BASE_DELAY: Duration = Duration::from_millis(400);

/// Checks whether a required touchpoint's signal made it into the context.
pub type Predicate = fn(&OsintContext) -> bool;

pub fn always_satisfied(_: &OsintContext) -> bool {
    true
}

/// The body of a touchpoint: one signal class, gathered from the query.
///
/// "No data" is an empty fragment, not an error. Errors are reserved for
/// genuine fetch or parse failures.
#[async_trait]
pub trait Collect: Send + Sync {
    async fn collect(&self, query: &OsintQuery) -> anyhow::Result<Fragment>;
}

struct FnCollect<F>(F);

#[async_trait]
impl<F, Fut> Collect for FnCollect<F>
where
    F: Fn(OsintQuery) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Fragment>> + Send,
{
    async fn collect(&self, query: &OsintQuery) -> anyhow::Result<Fragment> {
        (self.0)(query.clone()).await
    }
}

/// Wrap an async closure as a touchpoint body.
pub fn from_fn<F, Fut>(f: F) -> Arc<dyn Collect>
where
    F: Fn(OsintQuery) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Fragment>> + Send + 'static,
{
    Arc::new(FnCollect(f))
}

/// A registered touchpoint. Rate, retry and satisfaction settings are fixed
/// at registration time.
#[derive(Clone, TypedBuilder)]
pub struct Touchpoint {
    #[builder(setter(into))]
    pub id: String,
    pub stage: u32,
    #[builder(default)]
    pub required: bool,
    #[builder(setter(into))]
    pub rate_key: String,
    #[builder(default = FALLBACK_PER_MINUTE)]
    pub per_minute: u32,
    #[builder(default = RetryPolicy::new(2, TOUCHPOINT_BASE_DELAY))]
    pub retry: RetryPolicy,
    #[builder(default = always_satisfied as Predicate)]
    pub satisfied: Predicate,
    pub collector: Arc<dyn Collect>,
}

impl Touchpoint {
    /// Throttle on the rate key, then run the body under the retry policy.
    pub async fn run(&self, query: &OsintQuery, limiter: &RateLimiter) -> anyhow::Result<Fragment> {
        limiter.throttle(&self.rate_key, self.per_minute).await;
        with_retry(self.retry, || self.collector.collect(query)).await
    }

    pub fn is_satisfied(&self, ctx: &OsintContext) -> bool {
        (self.satisfied)(ctx)
    }
}

impl fmt::Debug for Touchpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Touchpoint")
            .field("id", &self.id)
            .field("stage", &self.stage)
            .field("required", &self.required)
            .field("rate_key", &self.rate_key)
            .field("per_minute", &self.per_minute)
            .field("retry", &self.retry)
            .finish()
    }
}
