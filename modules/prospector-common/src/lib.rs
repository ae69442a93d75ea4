pub mod config;
pub mod dedupe;
pub mod error;
pub mod file_config;
pub mod limiter;
pub mod retry;
pub mod types;

pub use config::{Config, PipelineOptions, RateLimits};
pub use dedupe::{dedupe, dedupe_by_key, DedupeKey};
pub use error::{OsintError, Result};
pub use file_config::FileConfig;
pub use limiter::RateLimiter;
pub use retry::{with_retry, RetryPolicy};
pub use types::*;
