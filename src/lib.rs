//! fact-relay: queued delivery of KPI facts
//!
//! Facts are pushed onto a bounded in-memory queue and delivered one at a
//! time, as authenticated form POSTs, by a single background worker.
//!
//! ## Architecture
//!
//! - **Types**: the `Fact` record and the read-path `FactQuery`
//! - **Config**: endpoint URLs, token, queue capacity, request timeout
//! - **Transport**: one fact, one POST, success iff HTTP 200
//! - **Pipeline**: bounded queue, single worker, completion latch

pub mod config;
pub mod pipeline;
pub mod sample;
pub mod transport;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, RelayConfig};

// Re-export commonly used types
pub use types::{Fact, FactQuery};

// Re-export transport
pub use transport::{FactQueryClient, FactSink, HttpTransport, QueryError, RawResponse, TransportError};

// Re-export pipeline
pub use pipeline::{CompletionLatch, DeliveryOutcome, DeliveryPipeline, DeliveryStats, PipelineError};
