use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use prospector_common::{OsintContext, OsintError, OsintQuery, PipelineOptions, RateLimiter, Result};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::touchpoint::Touchpoint;

/// Runs registered touchpoints stage by stage into one context.
///
/// Stages run in ascending order and each settles, retry rounds included,
/// before the next starts. Within a stage, touchpoints run in batches of
/// `max_concurrency_per_stage`; a batch finishes completely before the next
/// begins. Results merge in registration order regardless of completion order.
pub struct Orchestrator {
    registry: Vec<Touchpoint>,
    options: PipelineOptions,
    limiter: Arc<RateLimiter>,
}

impl Orchestrator {
    pub fn new(registry: Vec<Touchpoint>, options: PipelineOptions) -> Self {
        Self {
            registry,
            options,
            limiter: Arc::new(RateLimiter::new()),
        }
    }

    /// Share a bucket store with other orchestrators (per tenant, per process).
    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Distinct stage ordinals, ascending.
    pub fn stages(&self) -> Vec<u32> {
        self.registry
            .iter()
            .map(|tp| tp.stage)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub async fn build_context(&self, query: &OsintQuery) -> Result<OsintContext> {
        let run_id = Uuid::new_v4();
        self.run(query)
            .instrument(info_span!("osint_run", %run_id))
            .await
    }

    async fn run(&self, query: &OsintQuery) -> Result<OsintContext> {
        info!(
            company = query.company_name.as_deref().unwrap_or(""),
            domain = query.domain.as_deref().unwrap_or(""),
            touchpoints = self.registry.len(),
            "Starting OSINT run"
        );
        let mut ctx = OsintContext::default();

        for stage in self.stages() {
            let touchpoints: Vec<&Touchpoint> =
                self.registry.iter().filter(|tp| tp.stage == stage).collect();
            self.run_batches(&touchpoints, self.options.batch_size(), query, &mut ctx)
                .await;

            let mut missing = unsatisfied(touchpoints.iter().copied().filter(|tp| tp.required), &ctx);
            let mut round = 0;
            while !missing.is_empty() && round < self.options.required_retry_rounds {
                round += 1;
                warn!(stage, round, missing = ?ids(&missing), "Retrying unsatisfied required touchpoints");
                self.run_batches(&missing, 1, query, &mut ctx).await;
                missing = unsatisfied(missing.into_iter(), &ctx);
            }

            if !missing.is_empty() {
                let missing = ids(&missing);
                if self.options.fail_on_required_miss {
                    error!(stage, ?missing, "Required touchpoints missing, aborting run");
                    return Err(OsintError::RequiredTouchpointsMissing { stage, missing });
                }
                warn!(stage, ?missing, "Required touchpoints missing, continuing with partial context");
            }
            info!(stage, touchpoints = touchpoints.len(), "Stage settled");
        }

        info!(
            news = ctx.news.len(),
            jobs = ctx.jobs.len(),
            tech = ctx.tech.len(),
            evidence = ctx.evidence.len(),
            "OSINT run complete"
        );
        Ok(ctx)
    }

    async fn run_batches(
        &self,
        touchpoints: &[&Touchpoint],
        batch_size: usize,
        query: &OsintQuery,
        ctx: &mut OsintContext,
    ) {
        for batch in touchpoints.chunks(batch_size.max(1)) {
            let results = join_all(batch.iter().map(|tp| tp.run(query, &self.limiter))).await;
            for (tp, result) in batch.iter().zip(results) {
                match result {
                    Ok(fragment) => ctx.merge(fragment),
                    Err(e) => {
                        warn!(touchpoint = tp.id.as_str(), error = %e, "Touchpoint failed");
                        ctx.record_touchpoint_error(&tp.id, &format!("{e:#}"));
                    }
                }
            }
            ctx.dedupe_signals();
        }
    }
}

fn unsatisfied<'a>(
    touchpoints: impl Iterator<Item = &'a Touchpoint>,
    ctx: &OsintContext,
) -> Vec<&'a Touchpoint> {
    touchpoints.filter(|tp| !tp.is_satisfied(ctx)).collect()
}

fn ids(touchpoints: &[&Touchpoint]) -> Vec<String> {
    touchpoints.iter().map(|tp| tp.id.clone()).collect()
}
