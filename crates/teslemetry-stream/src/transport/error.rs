//! Transport layer errors

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// DNS, TCP or TLS failure
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    /// Non-success status while opening a stream
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Failure while reading a response body
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::ConnectionFailed(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else if e.is_body() || e.is_decode() {
            Self::ReceiveFailed(e.to_string())
        } else {
            Self::ConnectionFailed(e.to_string())
        }
    }
}
