//! Telemetry event streaming
//!
//! The server sends one JSON object per `data:` line over a long-lived HTTP
//! response. [`ReconnectingStream`] keeps that response open, reconnecting
//! with exponential backoff, and yields decoded [`Event`]s.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use teslemetry_stream::{HttpTransport, ReconnectingStream, StreamConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StreamConfig::builder("token").vin("5YJ3000000NEXUS01").build();
//! let transport = Arc::new(HttpTransport::new(&config)?);
//! let mut stream = ReconnectingStream::new(config, transport)?;
//!
//! while let Some(event) = stream.next_event().await {
//!     println!("{}", event);
//! }
//! # Ok(())
//! # }
//! ```

mod backoff;
mod control;
pub(crate) mod endpoint;
mod parser;
mod reconnect;
mod types;

pub use backoff::Backoff;
pub use control::{ActiveState, StreamControl};
pub use parser::{parse_created_at, LineDecoder, DEFAULT_MAX_LINE_BYTES};
pub use reconnect::{ReconnectingStream, Step};
pub use types::{DecodeError, Event, EventKind, StreamError, StreamResult, StreamState};
