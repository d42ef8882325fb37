//! Single-attempt HTTP transport.
//!
//! A [`Transport`] performs exactly one request and reports either the
//! upstream `(status, body)` or a transient failure. Retries live one layer
//! up in [`super::retry`]. Non-2xx statuses are not failures at this level.

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use serde_json::{Map, Value};
use std::time::Duration;

use foldmcp_core::Error;

use super::retry::METHOD_NOT_ALLOWED_STATUS;
use super::tls::TlsContext;

/// Raw upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResult {
    pub status: u16,
    pub body: String,
}

impl TransportResult {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }
}

/// Network-level failure eligible for retry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The attempt did not complete within the timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Connection, DNS, TLS handshake, or body read failure.
    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { TransportError::Timeout(err.to_string()) } else { TransportError::Network(err.to_string()) }
    }
}

/// One request, one attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a GET or POST. Other methods are answered locally with 405.
    async fn send(
        &self, method: &Method, url: &str, params: Option<&Map<String, Value>>,
    ) -> Result<TransportResult, TransportError>;
}

/// Construction options for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { user_agent: "mcp-alphafold/0.1".to_string(), timeout: Duration::from_secs(10) }
    }
}

/// reqwest-backed transport.
///
/// Certificate verification uses the public web PKI unless a [`TlsContext`]
/// is supplied.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Build a transport with standard public-CA verification.
    pub fn new(config: &HttpConfig) -> Result<Self, Error> {
        Self::build(config, None)
    }

    /// Build a transport that presents a client certificate.
    pub fn with_tls(config: &HttpConfig, tls: &TlsContext) -> Result<Self, Error> {
        Self::build(config, Some(tls))
    }

    fn build(config: &HttpConfig, tls: Option<&TlsContext>) -> Result<Self, Error> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .http1_only()
            .gzip(true)
            .brotli(true)
            .deflate(true);

        if let Some(tls) = tls {
            builder = tls.apply(builder);
        }

        let http = builder
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self, method: &Method, url: &str, params: Option<&Map<String, Value>>,
    ) -> Result<TransportResult, TransportError> {
        let request = match *method {
            Method::GET => {
                let mut request = self.http.get(url);
                if let Some(params) = params {
                    request = request.query(&query_pairs(params));
                }
                request
            }
            Method::POST => {
                let body = params.cloned().unwrap_or_default();
                self.http.post(url).json(&body)
            }
            _ => {
                return Ok(TransportResult::new(METHOD_NOT_ALLOWED_STATUS, format!("Unsupported method: {method}")));
            }
        };

        let response = request.header(header::ACCEPT, "application/json, text/csv;q=0.9, */*;q=0.8").send().await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!("{} {} -> {} ({} bytes)", method, url, status, body.len());

        Ok(TransportResult { status, body })
    }
}

/// Flatten a parameter mapping into query pairs.
///
/// Strings go through verbatim, nulls are dropped, and everything else is
/// rendered as compact JSON text.
pub fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key.clone(), s.clone())),
            other => Some((key.clone(), other.to_string())),
        })
        .collect()
}
