mod annotation;
mod cli;
mod config;
mod errors;
mod llm_client;
mod models;
mod tabular;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::annotation::BatchAnnotator;
use crate::cli::Cli;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::tabular::{load_table, save_table};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let mut config = Config::from_env()?;
    config.apply_overrides(cli.model, cli.delay_secs);

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting scorer v{}", env!("CARGO_PKG_VERSION"));

    let table = load_table(&cli.input, cli.delimiter)
        .with_context(|| format!("Could not load input table {}", cli.input.display()))?;
    if table.is_empty() {
        warn!("Input table {} has no rows", cli.input.display());
    }

    // Initialize LLM client
    let llm = LlmClient::new(config.vertex_settings()).context("Failed to build HTTP client")?;
    info!(
        "LLM client initialized (model: {}, project: {}, location: {})",
        config.model, config.project_id, config.location
    );

    let annotator = BatchAnnotator::new(Arc::new(llm), config.request_delay);
    let scored = annotator.run_pipeline(&table).await?;

    save_table(&scored, &cli.output, cli.delimiter)?;

    Ok(())
}
