use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::file_config::FileConfig;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 LeadGenBot/1.0";

/// Per-minute budget for rate keys with no configured value.
pub const FALLBACK_PER_MINUTE: u32 = 15;

/// Rate key, environment override, default requests per minute.
const RATE_SETTINGS: &[(&str, &str, u32)] = &[
    ("identity", "RATE_LIMIT_IDENTITY_PER_MIN", 30),
    ("website", "RATE_LIMIT_WEBSITE_PER_MIN", 20),
    ("wikipedia", "RATE_LIMIT_WIKIPEDIA_PER_MIN", 20),
    ("opencorp", "RATE_LIMIT_OPEN_CORP_PER_MIN", 10),
    ("rss", "RATE_LIMIT_RSS_PER_MIN", 20),
    ("gdelt", "RATE_LIMIT_GDELT_PER_MIN", 30),
    ("jobs", "RATE_LIMIT_JOBS_PER_MIN", 20),
    ("social", "RATE_LIMIT_SOCIAL_PER_MIN", 20),
    ("tech", "RATE_LIMIT_TECH_PER_MIN", 15),
    ("proc", "RATE_LIMIT_PROC_PER_MIN", 10),
    ("archives", "RATE_LIMIT_ARCHIVES_PER_MIN", 10),
];

/// Stage orchestration knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOptions {
    pub max_concurrency_per_stage: usize,
    pub required_retry_rounds: u32,
    pub fail_on_required_miss: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_concurrency_per_stage: 4,
            required_retry_rounds: 1,
            fail_on_required_miss: true,
        }
    }
}

impl PipelineOptions {
    /// Batch size actually used; never below one.
    pub fn batch_size(&self) -> usize {
        self.max_concurrency_per_stage.max(1)
    }
}

/// Requests-per-minute budget per rate key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimits {
    per_key: BTreeMap<String, u32>,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            per_key: RATE_SETTINGS
                .iter()
                .map(|(key, _, default)| (key.to_string(), *default))
                .collect(),
        }
    }
}

impl RateLimits {
    /// Build limits from an arbitrary variable source (env, tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut limits = Self::default();
        for (key, var, default) in RATE_SETTINGS {
            let value = parse_or(var, lookup(var), *default);
            limits.set(key, value);
        }
        limits
    }

    pub fn per_minute(&self, key: &str) -> u32 {
        self.per_key.get(key).copied().unwrap_or(FALLBACK_PER_MINUTE)
    }

    pub fn set(&mut self, key: &str, per_minute: u32) {
        self.per_key.insert(key.to_string(), per_minute);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.per_key.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Engine configuration loaded from environment variables, optionally
/// overridden by a TOML file.
#[derive(Debug, Clone)]
pub struct Config {
    pub user_agent: String,
    /// Per-request timeout for the HTTP fetcher. `None` disables it, in which
    /// case a stalled server can hang its touchpoint indefinitely.
    pub fetch_timeout: Option<Duration>,
    pub pipeline: PipelineOptions,
    pub rate_limits: RateLimits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout: None,
            pipeline: PipelineOptions::default(),
            rate_limits: RateLimits::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = PipelineOptions::default();
        Self {
            user_agent: lookup("OSINT_USER_AGENT")
                .filter(|ua| !ua.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            fetch_timeout: lookup("OSINT_FETCH_TIMEOUT_SECS")
                .and_then(|v| parse_opt::<u64>("OSINT_FETCH_TIMEOUT_SECS", &v))
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            pipeline: PipelineOptions {
                max_concurrency_per_stage: parse_or(
                    "OSINT_MAX_CONCURRENCY_PER_STAGE",
                    lookup("OSINT_MAX_CONCURRENCY_PER_STAGE"),
                    defaults.max_concurrency_per_stage,
                ),
                required_retry_rounds: parse_or(
                    "OSINT_REQUIRED_RETRY_ROUNDS",
                    lookup("OSINT_REQUIRED_RETRY_ROUNDS"),
                    defaults.required_retry_rounds,
                ),
                fail_on_required_miss: parse_or(
                    "OSINT_FAIL_ON_REQUIRED_MISS",
                    lookup("OSINT_FAIL_ON_REQUIRED_MISS"),
                    defaults.fail_on_required_miss,
                ),
            },
            rate_limits: RateLimits::from_lookup(&lookup),
        }
    }

    /// Overlay values present in a TOML config file.
    pub fn apply_file(&mut self, file: FileConfig) {
        if let Some(ua) = file.fetch.user_agent {
            self.user_agent = ua;
        }
        if let Some(secs) = file.fetch.timeout_secs {
            self.fetch_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(n) = file.pipeline.max_concurrency_per_stage {
            self.pipeline.max_concurrency_per_stage = n;
        }
        if let Some(n) = file.pipeline.required_retry_rounds {
            self.pipeline.required_retry_rounds = n;
        }
        if let Some(fail) = file.pipeline.fail_on_required_miss {
            self.pipeline.fail_on_required_miss = fail;
        }
        for (key, per_minute) in file.rate_limits {
            self.rate_limits.set(&key, per_minute);
        }
    }

    pub fn log_redacted(&self) {
        info!("Config loaded:");
        info!("  OSINT_USER_AGENT: {}", self.user_agent);
        match self.fetch_timeout {
            Some(t) => info!("  OSINT_FETCH_TIMEOUT_SECS: {}", t.as_secs()),
            None => info!("  OSINT_FETCH_TIMEOUT_SECS: <not set, fetches may hang>"),
        }
        info!(
            max_concurrency_per_stage = self.pipeline.max_concurrency_per_stage,
            required_retry_rounds = self.pipeline.required_retry_rounds,
            fail_on_required_miss = self.pipeline.fail_on_required_miss,
            "  pipeline"
        );
        for (key, per_minute) in self.rate_limits.iter() {
            info!("  rate limit {key}: {per_minute}/min");
        }
    }
}

fn parse_opt<T: FromStr>(name: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(name, value = raw, "Ignoring unparseable config value");
            None
        }
    }
}

fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> T {
    raw.and_then(|v| parse_opt(name, &v)).unwrap_or(default)
}
