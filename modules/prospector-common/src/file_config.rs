use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// TOML-backed overrides. Every field is optional; absent values keep the
/// environment-derived setting.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub pipeline: PipelineFileConfig,
    #[serde(default)]
    pub fetch: FetchFileConfig,
    /// Rate key → requests per minute.
    #[serde(default)]
    pub rate_limits: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineFileConfig {
    pub max_concurrency_per_stage: Option<usize>,
    pub required_retry_rounds: Option<u32>,
    pub fail_on_required_miss: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchFileConfig {
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<FileConfig> {
    Ok(toml::from_str(content)?)
}
