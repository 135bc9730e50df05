//! Outbound transport to the provider's token endpoint

use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use crate::{Error, Result};

/// Where the token request parameters travel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamEncoding {
    /// `application/x-www-form-urlencoded` request body
    FormBody,
    /// URL query string, empty body
    QueryString,
}

/// A single POST to the token endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct TokenRequest {
    /// Token endpoint URL
    pub url: String,
    /// Parameter placement
    pub encoding: ParamEncoding,
    /// Parameters in send order
    pub params: Vec<(&'static str, String)>,
}

impl TokenRequest {
    /// Value of the first parameter named `name`
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl std::fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<&str> = self.params.iter().map(|(k, _)| *k).collect();
        f.debug_struct("TokenRequest")
            .field("url", &self.url)
            .field("encoding", &self.encoding)
            .field("params", &keys)
            .finish()
    }
}

/// Provider response, relayed to the caller unchanged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    /// Provider status code
    pub status: StatusCode,
    /// Raw provider body
    pub body: Bytes,
}

impl UpstreamResponse {
    /// Body as text for diagnostics
    #[must_use]
    pub fn body_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Sends token requests to the identity provider
#[async_trait]
pub trait TokenTransport: Send + Sync {
    /// Perform the request and read the full response body
    ///
    /// Any non-transport outcome, including provider 4xx/5xx, is `Ok`.
    async fn send(&self, request: TokenRequest) -> Result<UpstreamResponse>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with request and connect timeouts
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (e.g. TLS backend failure).
    pub fn new(request_timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .user_agent(concat!("oauth-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TokenTransport for HttpTransport {
    async fn send(&self, request: TokenRequest) -> Result<UpstreamResponse> {
        let builder = self.client.post(&request.url);
        let builder = match request.encoding {
            ParamEncoding::FormBody => builder.form(&request.params),
            ParamEncoding::QueryString => builder
                .query(&request.params)
                .header(
                    reqwest::header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                ),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read token response: {e}")))?;

        debug!(status = %status, bytes = body.len(), "Token endpoint responded");
        Ok(UpstreamResponse { status, body })
    }
}
