//! Client configuration

use std::time::Duration;

use serde::Deserialize;

/// Default server queried for identifiers and URL relations
pub const DEFAULT_SERVER_URL: &str = "https://musicbrainz.org";

/// Settings supplied when building a [`Client`](crate::Client)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base address of the remote API; trailing slashes are dropped
    pub server_url: String,
    /// Version reported in the identifying User-Agent header
    pub app_version: String,
    /// Ceiling on outgoing requests per second
    pub max_qps: f64,
    /// Requests that may be issued back to back before pacing kicks in
    pub burst: u32,
    /// Capacity of the identifier -> database ID cache
    pub id_cache_size: usize,
    /// Capacity of each per-kind URL -> relations cache
    pub relation_cache_size: usize,
    /// Capacity of each per-kind URL -> last miss cache
    pub miss_cache_size: usize,
    /// How long a 404 for a URL suppresses further lookups
    pub miss_ttl: Duration,
    /// Per-request transport timeout
    pub request_timeout: Duration,
    /// When false, relation lookups never touch the network
    pub allow_network: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            max_qps: 1.0,
            burst: 1,
            id_cache_size: 256,
            relation_cache_size: 256,
            miss_cache_size: 256,
            miss_ttl: Duration::from_secs(60),
            request_timeout: Duration::from_secs(15),
            allow_network: true,
        }
    }
}

impl ClientConfig {
    /// Point the client at a different server
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the version reported to the server
    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    /// Set the request rate ceiling
    pub fn with_max_qps(mut self, qps: f64) -> Self {
        self.max_qps = qps;
        self
    }

    /// Set the capacity used by every cache
    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.id_cache_size = size;
        self.relation_cache_size = size;
        self.miss_cache_size = size;
        self
    }

    /// Set how long 404s are remembered
    pub fn with_miss_ttl(mut self, ttl: Duration) -> Self {
        self.miss_ttl = ttl;
        self
    }

    /// Disallow relation lookups over the network
    pub fn offline(mut self) -> Self {
        self.allow_network = false;
        self
    }

    /// Identifying header value attached to every request
    pub fn user_agent(&self) -> String {
        format!(
            "formseed/{} ( https://github.com/formseed/formseed )",
            self.app_version
        )
    }
}
