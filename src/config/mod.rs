//! Relay Configuration Module
//!
//! Endpoint URLs, bearer token, queue capacity and request timeout, loaded
//! from TOML and passed explicitly into the transport and the pipeline.
//!
//! ## Loading Order
//!
//! 1. `FACT_RELAY_CONFIG` environment variable (path to TOML file)
//! 2. `fact_relay.toml` in the current working directory
//! 3. Built-in defaults
//!
//! `FACT_RELAY_TOKEN`, when set, replaces the token from whichever source won.
//!
//! ```ignore
//! let config = RelayConfig::load();
//! let transport = HttpTransport::new(&config.endpoint, config.delivery.request_timeout())?;
//! let pipeline = DeliveryPipeline::new(Arc::new(transport), config.delivery.queue_capacity)?;
//! ```

mod relay_config;
pub mod defaults;

pub use relay_config::*;
