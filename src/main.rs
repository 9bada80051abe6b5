//! fact-relay - deliver a batch of facts through the queued pipeline
//!
//! Builds a batch (the 10-fact sample by default, or a JSON file), pushes it
//! through a [`DeliveryPipeline`] backed by the HTTP transport, waits for
//! every fact to be attempted, then shuts the pipeline down.
//!
//! # Usage
//!
//! ```bash
//! # Deliver the sample batch
//! FACT_RELAY_TOKEN=... cargo run --release --bin fact-relay
//!
//! # Deliver facts from a file with a small queue
//! fact-relay --facts facts.json --capacity 4
//! ```
//!
//! # Environment Variables
//!
//! - `FACT_RELAY_CONFIG`: Path to a TOML config file
//! - `FACT_RELAY_TOKEN`: Bearer token (overrides the config file)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use fact_relay::sample::sample_batch;
use fact_relay::{DeliveryPipeline, Fact, HttpTransport, RelayConfig};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "fact-relay")]
#[command(about = "Deliver KPI facts to the remote service through a bounded queue")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (default: $FACT_RELAY_CONFIG, then ./fact_relay.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON file holding an array of facts to deliver instead of the sample batch
    #[arg(long, value_name = "FILE")]
    facts: Option<PathBuf>,

    /// Number of sample facts to generate when no --facts file is given
    #[arg(long, default_value = "10")]
    count: u32,

    /// Override the queue capacity
    #[arg(long)]
    capacity: Option<usize>,

    /// Override the per-request timeout
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,
}

fn load_facts(path: &Path) -> Result<Vec<Fact>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read facts file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse facts file {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let mut config = RelayConfig::resolve(args.config.as_deref())?;
    if let Some(capacity) = args.capacity {
        config.delivery.queue_capacity = capacity;
    }
    if let Some(secs) = args.timeout_secs {
        config.delivery.request_timeout_secs = secs;
    }
    config.validate()?;

    let facts = match &args.facts {
        Some(path) => load_facts(path)?,
        None => sample_batch(args.count),
    };

    info!(
        facts = facts.len(),
        url = %config.endpoint.save_fact_url,
        capacity = config.delivery.queue_capacity,
        timeout_secs = config.delivery.request_timeout_secs,
        "Starting fact delivery"
    );

    let transport = HttpTransport::new(&config.endpoint, config.delivery.request_timeout())
        .context("Failed to build HTTP client")?;
    let pipeline = DeliveryPipeline::new(Arc::new(transport), config.delivery.queue_capacity)?;

    pipeline.start()?;
    pipeline.enqueue(facts).await?;
    pipeline.wait().await;
    pipeline.close()?;
    pipeline.join().await?;

    info!("{}", pipeline.stats());
    println!("All facts sent successfully");
    Ok(())
}
