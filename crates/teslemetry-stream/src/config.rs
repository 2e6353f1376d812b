//! Stream client configuration with YAML support
//!
//! ```yaml
//! connection:
//!   access_token: "secret"
//!   server: "na.teslemetry.com"   # optional, discovered when absent
//!   vin: "5YJ3000000NEXUS01"      # optional, fleet-wide stream when absent
//!
//! timeouts:
//!   connect_ms: 5000
//!   read_ms: 30000
//!
//! reconnect:
//!   initial_delay_ms: 1000
//!   max_delay_ms: 60000
//!
//! parse_timestamp: true
//! debounce_ms: 1000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::streaming::DEFAULT_MAX_LINE_BYTES;

/// Default REST API base
pub const DEFAULT_API_BASE: &str = "https://api.teslemetry.com/api";

/// Default domain every streaming server must belong to
pub const DEFAULT_DOMAIN: &str = "teslemetry.com";

/// Telemetry stream configuration
///
/// Can be loaded from YAML or JSON, or constructed with [`StreamConfig::builder`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Connection settings
    pub connection: ConnectionConfig,

    /// Per-connection timeouts
    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    /// Reconnect backoff settings
    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Derive a millisecond `timestamp` field from `createdAt`
    #[serde(default)]
    pub parse_timestamp: bool,

    /// Coalescing window for configuration writes in milliseconds (default: 1s)
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,

    /// Events buffered between the reader and the dispatcher
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Longest stream line kept; longer lines are dropped (default: 1 MiB)
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

/// Connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Bearer token sent with every request
    pub access_token: String,

    /// Streaming server (host or URL). Discovered through the metadata
    /// endpoint when absent.
    #[serde(default)]
    pub server: Option<String>,

    /// Restrict the stream to a single vehicle
    #[serde(default)]
    pub vin: Option<String>,

    /// REST API base used for metadata and vehicle configuration
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Domain the streaming server must belong to. `None` disables the check.
    #[serde(default = "default_allowed_domain")]
    pub allowed_domain: Option<String>,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_allowed_domain() -> Option<String> {
    Some(DEFAULT_DOMAIN.to_string())
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Connect timeout in milliseconds (default: 5s)
    #[serde(default = "default_connect_timeout")]
    pub connect_ms: u64,

    /// Maximum silence on an open stream before it is treated as dead (default: 30s)
    #[serde(default = "default_read_timeout")]
    pub read_ms: u64,

    /// Timeout for non-streaming API requests (default: 30s)
    #[serde(default = "default_request_timeout")]
    pub request_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            connect_ms: default_connect_timeout(),
            read_ms: default_read_timeout(),
            request_ms: default_request_timeout(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    5_000
}

fn default_read_timeout() -> u64 {
    30_000
}

fn default_request_timeout() -> u64 {
    30_000
}

/// Reconnect backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// First delay after a failure, and the value a success resets to (default: 1s)
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Upper bound for the doubling delay (default: 60s)
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_initial_delay() -> u64 {
    1_000
}

fn default_max_delay() -> u64 {
    60_000
}

fn default_debounce() -> u64 {
    1_000
}

fn default_event_buffer() -> usize {
    256
}

fn default_max_line_bytes() -> usize {
    DEFAULT_MAX_LINE_BYTES
}

impl StreamConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::configuration(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Parse(e.to_string()))
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Parse(e.to_string()))
    }

    /// Serialize configuration to YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::Parse(e.to_string()))
    }

    /// Create a builder for programmatic configuration
    pub fn builder(access_token: impl Into<String>) -> StreamConfigBuilder {
        StreamConfigBuilder::new(access_token)
    }

    /// Check everything that can be checked without touching the network
    pub fn validate(&self) -> Result<()> {
        if self.connection.access_token.trim().is_empty() {
            return Err(Error::configuration("An access token is required"));
        }
        if matches!(&self.connection.vin, Some(vin) if vin.trim().is_empty()) {
            return Err(Error::configuration("VIN must not be empty"));
        }
        if self.max_line_bytes == 0 {
            return Err(Error::configuration("max_line_bytes must be positive"));
        }
        self.api_url()?;
        self.server_url()?;
        Ok(())
    }

    /// Parsed REST API base
    pub fn api_url(&self) -> Result<Url> {
        Ok(Url::parse(self.connection.api_base.trim_end_matches('/'))?)
    }

    /// Parsed and domain-checked streaming server, if one is configured
    pub fn server_url(&self) -> Result<Option<Url>> {
        match &self.connection.server {
            Some(server) => self.check_server(server).map(Some),
            None => Ok(None),
        }
    }

    /// Normalize a server host or URL and enforce the allowed domain
    pub fn check_server(&self, server: &str) -> Result<Url> {
        let url = if server.contains("://") {
            Url::parse(server)?
        } else {
            Url::parse(&format!("https://{}", server))?
        };

        if let Some(domain) = &self.connection.allowed_domain {
            let host = url.host_str().unwrap_or_default();
            if !host.ends_with(&format!(".{}", domain)) {
                return Err(Error::configuration(format!(
                    "Server must be on the {} domain, got {}",
                    domain, server
                )));
            }
        }

        Ok(url)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.connect_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.read_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.request_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Builder for StreamConfig
pub struct StreamConfigBuilder {
    config: StreamConfig,
}

impl StreamConfigBuilder {
    /// Create a new builder with default settings
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            config: StreamConfig {
                connection: ConnectionConfig {
                    access_token: access_token.into(),
                    server: None,
                    vin: None,
                    api_base: default_api_base(),
                    allowed_domain: default_allowed_domain(),
                },
                timeouts: TimeoutsConfig::default(),
                reconnect: ReconnectConfig::default(),
                parse_timestamp: false,
                debounce_ms: default_debounce(),
                event_buffer: default_event_buffer(),
                max_line_bytes: default_max_line_bytes(),
            },
        }
    }

    /// Set the streaming server
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.config.connection.server = Some(server.into());
        self
    }

    /// Restrict the stream to one vehicle
    pub fn vin(mut self, vin: impl Into<String>) -> Self {
        self.config.connection.vin = Some(vin.into());
        self
    }

    /// Set the REST API base
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.config.connection.api_base = api_base.into();
        self
    }

    /// Set (or with `None`, disable) the allowed server domain
    pub fn allowed_domain(mut self, domain: Option<&str>) -> Self {
        self.config.connection.allowed_domain = domain.map(String::from);
        self
    }

    /// Enable `createdAt` parsing
    pub fn parse_timestamp(mut self, enabled: bool) -> Self {
        self.config.parse_timestamp = enabled;
        self
    }

    /// Set the configuration write coalescing window
    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.debounce_ms = ms;
        self
    }

    /// Set the reconnect floor and cap
    pub fn reconnect_delays_ms(mut self, initial: u64, max: u64) -> Self {
        self.config.reconnect.initial_delay_ms = initial;
        self.config.reconnect.max_delay_ms = max;
        self
    }

    /// Set the stream read timeout
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.read_ms = ms;
        self
    }

    /// Set the longest stream line kept
    pub fn max_line_bytes(mut self, bytes: usize) -> Self {
        self.config.max_line_bytes = bytes;
        self
    }

    /// Set the request timeout for API calls
    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.request_ms = ms;
        self
    }

    /// Build the configuration
    pub fn build(self) -> StreamConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
connection:
  access_token: "secret123"
  vin: "5YJ3000000NEXUS01"

timeouts:
  read_ms: 10000

reconnect:
  max_delay_ms: 8000

parse_timestamp: true
"#;

        let config = StreamConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.connection.access_token, "secret123");
        assert_eq!(config.connection.vin.as_deref(), Some("5YJ3000000NEXUS01"));
        assert_eq!(config.connection.api_base, DEFAULT_API_BASE);
        assert_eq!(config.timeouts.read_ms, 10_000);
        assert_eq!(config.timeouts.connect_ms, 5_000);
        assert_eq!(config.reconnect.initial_delay_ms, 1_000);
        assert_eq!(config.reconnect.max_delay_ms, 8_000);
        assert_eq!(config.debounce_ms, 1_000);
        assert_eq!(config.max_line_bytes, DEFAULT_MAX_LINE_BYTES);
        assert!(config.parse_timestamp);
    }

    #[test]
    fn test_builder() {
        let config = StreamConfig::builder("token")
            .server("eu.teslemetry.com")
            .vin("VIN1")
            .debounce_ms(50)
            .reconnect_delays_ms(10, 80)
            .build();

        assert_eq!(config.connection.server.as_deref(), Some("eu.teslemetry.com"));
        assert_eq!(config.debounce(), Duration::from_millis(50));
        assert_eq!(config.reconnect.max_delay_ms, 80);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_domain_check() {
        let config = StreamConfig::builder("token").server("evil.example.com").build();
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        let config = StreamConfig::builder("token").server("na.teslemetry.com").build();
        let url = config.server_url().unwrap().unwrap();
        assert_eq!(url.as_str(), "https://na.teslemetry.com/");

        let config = StreamConfig::builder("token")
            .server("http://127.0.0.1:9000")
            .allowed_domain(None)
            .build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_token() {
        let config = StreamConfig::builder("  ").build();
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_to_yaml() {
        let config = StreamConfig::builder("test").vin("VIN1").build();

        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("access_token"));
        assert!(yaml.contains("VIN1"));
    }
}
