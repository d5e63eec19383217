//! HTTP transport seam for event delivery.
//!
//! The delivery engine only talks to [`Transport`]. A call either returns a
//! [`DeliveryResponse`] (whatever the status code) or a [`TransportError`];
//! only the latter is retried.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use thiserror::Error;
use url::Url;

use crate::error::{NotifyError, Result};

/// User agent sent with every request
pub const USER_AGENT: &str = "healthcheck-event-action";

/// Failure below the HTTP status level: nothing usable came back.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// A fully prepared POST
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Response from the remote endpoint, as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl DeliveryResponse {
    /// Statuses up to and including 299 count as accepted
    pub fn is_success(&self) -> bool {
        self.status <= 299
    }
}

/// Sends one POST. Implementations must not retry on their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: &HttpRequest)
        -> std::result::Result<DeliveryResponse, TransportError>;
}

/// Settings for the reqwest-backed transport
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout. `None` keeps the client default (no timeout).
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// [`Transport`] over a pooled `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| NotifyError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(TransportConfig::default())
    }

    /// Shared client, reused by the identity token exchange
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(
        &self,
        request: &HttpRequest,
    ) -> std::result::Result<DeliveryResponse, TransportError> {
        let response = self
            .client
            .post(request.url.clone())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers = extract_headers(response.headers());
        let body = response.text().await?;

        tracing::debug!(status, "Received response");

        Ok(DeliveryResponse {
            status,
            headers,
            body,
        })
    }
}

fn extract_headers(header_map: &HeaderMap) -> HashMap<String, String> {
    header_map
        .iter()
        .filter_map(|(key, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (key.as_str().to_string(), v.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, CONTENT_TYPE};

    #[test]
    fn test_success_boundary() {
        let response = |status| DeliveryResponse {
            status,
            headers: HashMap::new(),
            body: String::new(),
        };
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(response(299).is_success());
        assert!(!response(300).is_success());
        assert!(!response(500).is_success());
    }

    #[test]
    fn test_extract_headers_skips_non_ascii() {
        let mut map = HeaderMap::new();
        map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        map.insert("x-bin", HeaderValue::from_bytes(b"\xff").unwrap());

        let headers = extract_headers(&map);
        assert_eq!(headers.get("content-type").unwrap(), "application/json");
        assert!(!headers.contains_key("x-bin"));
    }

    #[test]
    fn test_transport_builds_with_defaults() {
        assert!(ReqwestTransport::with_defaults().is_ok());
    }
}
