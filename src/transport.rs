//! HTTP transport seam.
//!
//! The connector never talks to the network directly. Requests go through a
//! [`Transport`], so callers can swap in their own client (or a provider
//! simulator in tests). [`ReqwestTransport`] is the default.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sgverify_auth::HttpMethod;

use crate::config::ProxyConfig;

// ============================================================================
// Transport
// ============================================================================

/// One HTTP exchange with the provider. No retries; failures surface as-is.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: TransportRequest)
        -> Result<TransportResponse, TransportError>;
}

/// An outbound request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    /// Complete URL including any query string.
    pub url: String,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl TransportRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// First header value with the given name (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Response status and raw body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Network, timeout, proxy, or HTTP-status failure.
#[derive(Debug, Clone)]
pub struct TransportError {
    pub message: String,
    /// HTTP status when the provider answered with a non-success response.
    pub status: Option<u16>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else {
            err.to_string()
        };
        match err.status() {
            Some(status) => TransportError::with_status(message, status.as_u16()),
            None => TransportError::new(message),
        }
    }
}

// ============================================================================
// ReqwestTransport
// ============================================================================

/// [`Transport`] backed by `reqwest`.
///
/// The client, including any proxy, is built once and shared by every
/// request so connections are pooled.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_proxy(None)
    }

    /// Route every request through `proxy`, when given.
    pub fn with_proxy(proxy: Option<&ProxyConfig>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(proxy) = proxy {
            let mut outbound = reqwest::Proxy::all(proxy.url())?;
            if let Some(auth) = &proxy.auth {
                outbound = outbound.basic_auth(&auth.username, &auth.password);
            }
            builder = builder.proxy(outbound);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Use a caller-configured client as is.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}
