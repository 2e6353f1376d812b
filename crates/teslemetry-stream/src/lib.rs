//! Teslemetry Stream Client Library
//!
//! Listens to vehicle telemetry pushed by the Teslemetry streaming service and
//! manages which signals each vehicle streams.
//!
//! # Example
//!
//! ```rust,no_run
//! use teslemetry_stream::{StreamConfig, TeslemetryStream};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = StreamConfig::builder("token")
//!         .vin("5YJ3000000NEXUS01")
//!         .build();
//!     let stream = TeslemetryStream::new(config)?;
//!     stream.get_config().await?;
//!
//!     let vehicle = stream.vehicle().expect("single vehicle stream");
//!
//!     // Decoded signal values; the field is enabled on the server if needed
//!     let _battery = vehicle.listen("BatteryLevel", |level| {
//!         println!("Battery: {:?}", level);
//!     });
//!
//!     // Raw events
//!     let _all = stream.add_listener(|event| println!("{}", event), None);
//!
//!     tokio::signal::ctrl_c().await?;
//!     stream.close();
//!     Ok(())
//! }
//! ```
//!
//! # Lower level pieces
//!
//! - [`streaming::ReconnectingStream`] yields events without any listeners
//! - [`filter::Filter`] matches events structurally
//! - [`sync::ConfigSync`] coalesces configuration writes
//!
//! # Testing
//!
//! The `testing` module provides an in-process service:
//!
//! ```rust,ignore
//! use teslemetry_stream::testing::MockServer;
//!
//! let server = MockServer::start().await?;
//! let stream = TeslemetryStream::new(server.config_builder("token").vin("VIN1").build())?;
//! server.send_event(&json!({"vin": "VIN1", "data": {"BatteryLevel": 80}}));
//! ```

mod config;
pub mod dispatch;
mod error;
pub mod filter;
pub mod signals;
mod stream;
pub mod streaming;
pub mod sync;
pub mod testing;
pub mod transport;
mod vehicle;

pub use config::{
    ConnectionConfig, ReconnectConfig, StreamConfig, StreamConfigBuilder, TimeoutsConfig,
    DEFAULT_API_BASE, DEFAULT_DOMAIN,
};
pub use dispatch::{Disposer, ListenerId};
pub use error::{Error, Result};
pub use filter::Filter;
pub use stream::TeslemetryStream;
pub use vehicle::Vehicle;

// Re-export the commonly used types of the public modules
pub use signals::{Door, EnumValue, Location, SignalValue};
pub use streaming::{ActiveState, Event, EventKind, ReconnectingStream, StreamState};
pub use sync::{FieldConfig, FieldTable, SyncOutcome};
pub use transport::{HttpTransport, Transport};
