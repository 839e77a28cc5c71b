//! Configuration for the RPC client

use std::time::Duration;

use courier_protocol::Encoding;

/// Configuration for an RPC client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the service host, for example `http://rpc.internal:9280`
    pub base_url: String,
    /// Optional URL namespace segment prepended to the service name
    pub namespace: Option<String>,
    /// Wire encoding for request payloads
    pub encoding: Encoding,
    /// Per-request timeout, covering connect through body download
    pub timeout: Duration,
    /// Maximum number of concurrent connections; calls beyond the cap
    /// wait for a slot
    pub max_connections: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9280".to_string(),
            namespace: None,
            encoding: Encoding::default(),
            timeout: Duration::from_secs(5),
            max_connections: 10,
        }
    }
}

impl ClientConfig {
    /// Create a new builder for client configuration
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Qualified service name used in endpoint paths: `ns.Service` when
    /// a namespace is set, the bare service name otherwise.
    pub fn qualified_service(&self, service: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}.{service}"),
            None => service.to_string(),
        }
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    namespace: Option<String>,
    encoding: Option<Encoding>,
    timeout: Option<Duration>,
    max_connections: Option<usize>,
}

impl ClientConfigBuilder {
    /// Set the base URL of the service host
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the URL namespace segment
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the request wire encoding
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the concurrent connection cap
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = Some(max);
        self
    }

    /// Build the client configuration
    pub fn build(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            namespace: self.namespace.or(defaults.namespace),
            encoding: self.encoding.unwrap_or(defaults.encoding),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            max_connections: self.max_connections.unwrap_or(defaults.max_connections),
        }
    }
}
