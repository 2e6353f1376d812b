//! Transport layer for the telemetry service
//!
//! The stream and the configuration synchronizer only talk to the network
//! through the [`Transport`] trait:
//! - [`HttpTransport`] for the real service (reqwest, bearer token auth)
//! - [`mock::MockTransport`] for tests
//!
//! # Example
//!
//! ```ignore
//! use teslemetry_stream::transport::{ApiRequest, HttpTransport, Transport};
//!
//! let transport = HttpTransport::new(&config)?;
//! let response = transport.request(ApiRequest::get(url)).await?;
//! ```

mod adapter;
pub mod error;
mod http;
pub mod mock;

pub use adapter::{ApiRequest, ApiResponse, ByteStream, Method, Transport};
pub use error::TransportError;
pub use http::HttpTransport;
