//! Transport - one fact, one authenticated form POST
//!
//! [`HttpTransport`] encodes a [`Fact`] as `application/x-www-form-urlencoded`,
//! attaches the bearer token and sends it with the configured timeout. The
//! outcome is classified by status: exactly 200 is success, anything else is
//! [`TransportError::Rejected`]. No retries happen at this layer.
//!
//! The delivery pipeline only sees the [`FactSink`] trait, so tests can drive
//! it with stubs instead of a live service.

pub mod query;

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::EndpointConfig;
use crate::types::Fact;

pub use query::{FactQueryClient, QueryError, RawResponse};

/// Transport errors, one variant per failure kind.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request could not be built (malformed URL or body).
    #[error("Failed to build request: {0}")]
    Build(#[source] reqwest::Error),
    /// The request did not complete (connect failure, timeout).
    #[error("HTTP error: {0}")]
    Network(#[source] reqwest::Error),
    /// The service answered with something other than 200.
    #[error("Server returned status {0}")]
    Rejected(reqwest::StatusCode),
    /// The sink panicked while handling the fact.
    #[error("Sink panicked: {0}")]
    Panicked(String),
}

impl TransportError {
    /// Status code of a rejected request, if any.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Rejected(status) => Some(*status),
            Self::Build(_) | Self::Network(_) | Self::Panicked(_) => None,
        }
    }
}

/// Destination for single facts.
///
/// Implementations make one delivery attempt per call and report the outcome;
/// they must not retry.
#[async_trait]
pub trait FactSink: Send + Sync {
    async fn send(&self, fact: &Fact) -> Result<(), TransportError>;
}

/// Build the shared HTTP client used by both the write and read paths.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

// ============================================================================
// HTTP Transport
// ============================================================================

/// Stateless HTTP sender for facts.
///
/// The inner `reqwest::Client` is shared across calls for its connection
/// pool and timeout; nothing else is kept between requests.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    save_fact_url: String,
    token: String,
}

impl HttpTransport {
    /// Create a transport with its own client.
    pub fn new(endpoint: &EndpointConfig, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self::with_client(build_http_client(timeout)?, endpoint))
    }

    /// Create a transport around an existing client.
    pub fn with_client(http: reqwest::Client, endpoint: &EndpointConfig) -> Self {
        Self {
            http,
            save_fact_url: endpoint.save_fact_url.clone(),
            token: endpoint.token.clone(),
        }
    }

    /// Build the POST for one fact without sending it.
    pub fn build_request(&self, fact: &Fact) -> Result<reqwest::Request, TransportError> {
        self.http
            .post(&self.save_fact_url)
            .bearer_auth(&self.token)
            .form(fact)
            .build()
            .map_err(TransportError::Build)
    }

    /// URL facts are sent to.
    pub fn save_fact_url(&self) -> &str {
        &self.save_fact_url
    }
}

#[async_trait]
impl FactSink for HttpTransport {
    async fn send(&self, fact: &Fact) -> Result<(), TransportError> {
        let request = self.build_request(fact)?;
        let resp = self
            .http
            .execute(request)
            .await
            .map_err(TransportError::Network)?;

        let status = resp.status();
        // Read the body to the end so the connection goes back to the pool.
        if let Err(e) = resp.bytes().await {
            debug!(status = %status, error = %e, "Failed to drain response body");
        }

        if status != reqwest::StatusCode::OK {
            return Err(TransportError::Rejected(status));
        }

        info!(fact = %fact, "Fact sent successfully");
        Ok(())
    }
}
