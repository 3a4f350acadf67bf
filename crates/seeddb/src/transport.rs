//! Outbound HTTP seam
//!
//! The client only needs "GET this URL, give me the status and body", so the
//! network sits behind [`Transport`] and tests can count or script calls.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Status and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

impl Response {
    /// Build a response with the given status and body
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests to the remote API.
///
/// Implementations return `Ok` for any response that arrived, whatever its
/// status, and `Err` only when no response was received.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url`
    async fn get(&self, url: &str) -> Result<Response>;
}

/// [`Transport`] backed by a `reqwest` client carrying the identifying header
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport using `config`'s timeout and User-Agent
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent())
            .map_err(|e| Error::Config(format!("invalid User-Agent: {e}")))?;
        headers.insert(USER_AGENT, agent);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/xml, application/json;q=0.9"),
        );

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Response> {
        debug!(url = %url, "Fetching");
        let resp = self.http_client.get(url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(Response { status, body })
    }
}
