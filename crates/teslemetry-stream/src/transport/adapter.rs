//! Transport trait and request/response types

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde_json::Value;
use url::Url;

use super::TransportError;

/// Raw body of an open stream, chunked as it arrives
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// HTTP methods used against the configuration resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Patch,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Patch => write!(f, "PATCH"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// A JSON API request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            body: None,
        }
    }

    pub fn patch(url: Url, body: Value) -> Self {
        Self {
            method: Method::Patch,
            url,
            body: Some(body),
        }
    }

    pub fn post(url: Url, body: Value) -> Self {
        Self {
            method: Method::Post,
            url,
            body: Some(body),
        }
    }
}

/// A JSON API response. Non-success statuses are returned, not raised, so
/// callers can inspect error bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed body; `Value::Null` when empty, a string when not JSON
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `error` field of the body, if present
    pub fn error_message(&self) -> Option<String> {
        match self.body.get("error") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }
}

/// Pluggable HTTP/SSE transport
///
/// Implementations attach authentication themselves; callers only supply
/// URLs and JSON bodies.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a JSON request and return the status with the parsed body
    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;

    /// Open a long-lived streamed GET
    ///
    /// A non-success status is reported as [`TransportError::Status`]. The
    /// returned body is owned by the caller; no read timeout is applied here.
    async fn open_stream(&self, url: &Url) -> Result<ByteStream, TransportError>;
}
