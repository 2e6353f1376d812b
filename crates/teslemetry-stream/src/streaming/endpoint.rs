//! Streaming server and API URL resolution

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::config::{StreamConfig, DEFAULT_DOMAIN};
use crate::error::{Error, Result};
use crate::transport::{ApiRequest, Transport};

/// Where to reach the API and the streaming server
///
/// Clones share the resolved server, so discovery happens once per stream.
#[derive(Debug, Clone)]
pub(crate) struct Endpoint {
    config: Arc<StreamConfig>,
    server: Arc<Mutex<Option<Url>>>,
}

impl Endpoint {
    /// Build from a validated configuration
    pub fn new(config: Arc<StreamConfig>) -> Result<Self> {
        let server = config.server_url()?;
        Ok(Self {
            config,
            server: Arc::new(Mutex::new(server)),
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn vin(&self) -> Option<&str> {
        self.config.connection.vin.as_deref()
    }

    /// The streaming server, if known
    pub fn server(&self) -> Option<Url> {
        self.server.lock().clone()
    }

    /// `{api}/metadata`
    pub fn metadata_url(&self) -> Result<Url> {
        self.api_url("metadata")
    }

    /// `{api}/config/{vin}`
    pub fn config_url(&self, vin: &str) -> Result<Url> {
        self.api_url(&format!("config/{}", vin))
    }

    fn api_url(&self, path: &str) -> Result<Url> {
        let base = self.config.api_url()?;
        Ok(Url::parse(&format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path
        ))?)
    }

    /// `{server}/sse/{vin}`, or `{server}/sse` for a fleet-wide stream
    pub fn stream_url(&self, server: &Url) -> Result<Url> {
        let base = server.as_str().trim_end_matches('/');
        let url = match self.vin() {
            Some(vin) => format!("{}/sse/{}", base, vin),
            None => format!("{}/sse", base),
        };
        Ok(Url::parse(&url)?)
    }

    /// Ask the metadata endpoint which region serves this token
    #[instrument(skip(self, transport))]
    pub async fn find_server(&self, transport: &dyn Transport) -> Result<Url> {
        let response = transport
            .request(ApiRequest::get(self.metadata_url()?))
            .await?;
        if !response.is_success() {
            let message = response
                .error_message()
                .unwrap_or_else(|| "metadata request failed".to_string());
            return Err(Error::server_error(response.status, message));
        }

        let region = response
            .body
            .get("region")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Parse("metadata response has no region".to_string()))?;
        let domain = self
            .config
            .connection
            .allowed_domain
            .as_deref()
            .unwrap_or(DEFAULT_DOMAIN);

        let server = self
            .config
            .check_server(&format!("{}.{}", region.to_lowercase(), domain))?;
        debug!(server = %server, "Discovered streaming server");
        *self.server.lock() = Some(server.clone());
        Ok(server)
    }

    /// The known server, discovering it first if needed
    pub async fn resolve(&self, transport: &dyn Transport) -> Result<Url> {
        match self.server() {
            Some(server) => Ok(server),
            None => self.find_server(transport).await,
        }
    }
}
