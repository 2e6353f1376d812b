//! reqwest-backed transport

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::{ApiRequest, ApiResponse, ByteStream, Method, Transport, TransportError};
use crate::config::StreamConfig;
use crate::error::{Error, Result};

/// Value of the `X-Library` header sent with every request
const LIBRARY_HEADER: &str = concat!("rust teslemetry-stream/", env!("CARGO_PKG_VERSION"));

/// HTTP transport with bearer token authentication
///
/// The underlying client only carries a connect timeout; API calls get a
/// per-request total timeout while streams run without one.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    request_timeout: Duration,
}

impl HttpTransport {
    /// Create a transport from a stream configuration
    pub fn new(config: &StreamConfig) -> Result<Self> {
        Self::with_token(
            &config.connection.access_token,
            config.connect_timeout(),
            config.request_timeout(),
        )
    }

    /// Create a transport that sends `Authorization: Bearer <token>`
    pub fn with_token(
        token: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let header_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| Error::configuration(format!("Invalid access token: {}", e)))?;
        headers.insert(AUTHORIZATION, header_value);
        headers.insert("X-Library", HeaderValue::from_static(LIBRARY_HEADER));

        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            request_timeout,
        })
    }

    /// Get a reference to the underlying HTTP client
    pub fn http_client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn request(&self, request: ApiRequest) -> std::result::Result<ApiResponse, TransportError> {
        let builder = match request.method {
            Method::Get => self.client.get(request.url),
            Method::Patch => self.client.patch(request.url),
            Method::Post => self.client.post(request.url),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder.timeout(self.request_timeout).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        debug!(status, "API response");
        Ok(ApiResponse::new(status, body))
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn open_stream(&self, url: &Url) -> std::result::Result<ByteStream, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        debug!(status = status.as_u16(), "Stream opened");
        Ok(Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(TransportError::from)),
        ))
    }
}
