use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use prospector_common::file_config::load_config;
use prospector_common::{Config, OsintQuery};
use prospector_osint::{Collector, CollectorStrategy};
use prospector_web::HttpFetcher;

#[derive(Parser)]
#[command(name = "prospector", about = "Collect public signals about a company")]
struct Cli {
    /// Company name
    #[arg(long)]
    company: Option<String>,

    /// Company domain, e.g. acme.com
    #[arg(long)]
    domain: Option<String>,

    /// Homepage URL (derived from the domain when omitted)
    #[arg(long)]
    homepage: Option<String>,

    /// Touchpoints run concurrently per batch
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Extra rounds for unsatisfied required touchpoints
    #[arg(long)]
    retry_rounds: Option<u32>,

    /// Keep going when required touchpoints stay unsatisfied
    #[arg(long)]
    allow_partial: bool,

    #[arg(long, value_enum, default_value_t = CollectorStrategy::Staged)]
    strategy: CollectorStrategy,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::from_default_env().add_directive("prospector=info".parse()?);
    if cli.json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let mut config = Config::from_env();
    if let Some(path) = &cli.config {
        config.apply_file(load_config(path)?);
    }
    if let Some(n) = cli.max_concurrency {
        config.pipeline.max_concurrency_per_stage = n;
    }
    if let Some(n) = cli.retry_rounds {
        config.pipeline.required_retry_rounds = n;
    }
    if cli.allow_partial {
        config.pipeline.fail_on_required_miss = false;
    }
    config.log_redacted();

    let query = OsintQuery {
        company_name: cli.company,
        domain: cli.domain,
        homepage_url: cli.homepage,
    };
    if query.company_name.is_none() && query.resolved_homepage().is_none() {
        anyhow::bail!("need at least --company, --domain or --homepage");
    }

    let fetcher = Arc::new(HttpFetcher::from_config(&config)?);
    let chain = cli.strategy.build(fetcher, &config);
    info!(strategy = ?cli.strategy, collectors = ?chain.names(), "Collecting");

    let ctx = chain.collect(&query).await?;
    println!("{}", serde_json::to_string_pretty(&ctx)?);
    Ok(())
}
