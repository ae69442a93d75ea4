pub mod collector;
pub mod orchestrator;
pub mod touchpoint;
pub mod touchpoints;

pub use collector::{Collector, CollectorStrategy, FallbackChain, SiteSweepCollector, StagedCollector};
pub use orchestrator::Orchestrator;
pub use touchpoint::{always_satisfied, from_fn, Collect, Predicate, Touchpoint, TOUCHPOINT_BASE_DELAY};
pub use touchpoints::default_registry;
