//! fact-query - fetch the facts of one indicator and print the raw response
//!
//! Sends a single query and prints status, headers and body verbatim. Any
//! failure ends the process with a non-zero exit code.
//!
//! ```bash
//! FACT_RELAY_TOKEN=... fact-query --indicator-to-mo-id 227373
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use fact_relay::sample::sample_query;
use fact_relay::{FactQuery, FactQueryClient, RelayConfig};

#[derive(Parser, Debug)]
#[command(name = "fact-query", about = "Fetch facts for a reporting period and print the raw response")]
struct CliArgs {
    /// Path to a TOML config file (default: $FACT_RELAY_CONFIG, then ./fact_relay.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// First day of the period (default: 2024-12-01)
    #[arg(long, value_name = "YYYY-MM-DD")]
    period_start: Option<String>,

    /// Last day of the period (default: 2024-12-31)
    #[arg(long, value_name = "YYYY-MM-DD")]
    period_end: Option<String>,

    /// Period granularity (default: month)
    #[arg(long)]
    period_key: Option<String>,

    /// Indicator to query (default: 227373)
    #[arg(long)]
    indicator_to_mo_id: Option<i64>,
}

impl CliArgs {
    fn query(&self) -> FactQuery {
        let defaults = sample_query();
        FactQuery {
            period_start: self.period_start.clone().unwrap_or(defaults.period_start),
            period_end: self.period_end.clone().unwrap_or(defaults.period_end),
            period_key: self.period_key.clone().unwrap_or(defaults.period_key),
            indicator_to_mo_id: self.indicator_to_mo_id.unwrap_or(defaults.indicator_to_mo_id),
        }
    }
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
    let config = RelayConfig::resolve(args.config.as_deref())?;
    let query = args.query();

    info!(url = %config.endpoint.get_facts_url, ?query, "Querying facts");

    let client = FactQueryClient::new(&config.endpoint, config.delivery.request_timeout())
        .context("Failed to build HTTP client")?;
    let raw = client.fetch(&query).await.context("Fact query failed")?;

    println!("HTTP Status: {}", raw.status);
    println!("Headers: {:?}", raw.headers);
    println!("\nRaw response body:");
    println!("{}", raw.body_text());
    Ok(())
}
