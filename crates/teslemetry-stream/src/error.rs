//! Error types for telemetry stream operations

use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for telemetry stream operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that cross the public boundary of the library
///
/// Steady-state streaming failures never show up here; they are handled by the
/// reconnect loop (see [`crate::streaming::StreamError`]).
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing setup (token, server, VIN)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The remote side has no telemetry configuration for this vehicle
    #[error("Vehicle {0} is not configured for streaming")]
    NotConfigured(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Transport-level failure
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Server returned an error response
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Failed to parse a response or document
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a server error from status code and message
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
