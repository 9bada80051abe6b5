//! Read path - fetch the facts of one indicator for a reporting period
//!
//! A single form-encoded POST; the response is returned untouched (status,
//! headers, raw body) for inspection. Nothing here parses the body.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::time::Duration;

use super::build_http_client;
use crate::config::EndpointConfig;
use crate::types::FactQuery;

/// Read-path errors. Every one of them ends the query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Failed to build query request: {0}")]
    Build(#[source] reqwest::Error),
    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("Error reading response body: {0}")]
    Body(#[source] reqwest::Error),
}

/// Unparsed response of a fact query.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Body as text, with invalid UTF-8 replaced.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Client for the get-facts endpoint.
#[derive(Clone)]
pub struct FactQueryClient {
    http: reqwest::Client,
    get_facts_url: String,
    token: String,
}

impl FactQueryClient {
    pub fn new(endpoint: &EndpointConfig, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            http: build_http_client(timeout)?,
            get_facts_url: endpoint.get_facts_url.clone(),
            token: endpoint.token.clone(),
        })
    }

    /// Build the query POST without sending it.
    pub fn build_request(&self, query: &FactQuery) -> Result<reqwest::Request, QueryError> {
        self.http
            .post(&self.get_facts_url)
            .bearer_auth(&self.token)
            .form(query)
            .build()
            .map_err(QueryError::Build)
    }

    /// Send the query and collect the whole response.
    ///
    /// Any status is returned as-is; only transport and body-read failures
    /// are errors.
    pub async fn fetch(&self, query: &FactQuery) -> Result<RawResponse, QueryError> {
        let request = self.build_request(query)?;
        let resp = self
            .http
            .execute(request)
            .await
            .map_err(QueryError::Request)?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await.map_err(QueryError::Body)?;

        Ok(RawResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_body() {
        let endpoint = EndpointConfig {
            get_facts_url: "http://localhost/get_facts".to_string(),
            token: "t0k".to_string(),
            ..EndpointConfig::default()
        };
        let client = FactQueryClient::new(&endpoint, Duration::from_secs(5)).unwrap();
        let query = FactQuery {
            period_start: "2024-12-01".to_string(),
            period_end: "2024-12-31".to_string(),
            period_key: "month".to_string(),
            indicator_to_mo_id: 227373,
        };

        let request = client.build_request(&query).unwrap();
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(
            std::str::from_utf8(body).unwrap(),
            "period_start=2024-12-01&period_end=2024-12-31&period_key=month&indicator_to_mo_id=227373"
        );
        assert_eq!(request.headers()[reqwest::header::AUTHORIZATION], "Bearer t0k");
        assert_eq!(request.url().as_str(), "http://localhost/get_facts");
    }

    #[test]
    fn test_body_text_is_lossy() {
        let raw = RawResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: vec![b'o', b'k', 0xff],
        };
        assert_eq!(raw.body_text(), "ok\u{fffd}");
    }
}
