//! Stream client: one connection, many listeners
//!
//! [`TeslemetryStream`] owns the listener registry and a background pump. The
//! pump starts with the first listener. It runs a [`ReconnectingStream`] and
//! hands each event to a dispatcher task through a bounded channel, which
//! keeps delivery in wire order. Removing the last listener stops it, and so
//! does dropping the last client or vehicle handle.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};
use url::Url;

use crate::config::StreamConfig;
use crate::dispatch::{Disposer, ListenerRegistry};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::streaming::endpoint::Endpoint;
use crate::streaming::{ActiveState, Event, ReconnectingStream, StreamControl};
use crate::transport::{HttpTransport, Transport};
use crate::vehicle::Vehicle;

/// State shared by the client, its vehicles and the pump task
pub(crate) struct Hub {
    pub(crate) config: Arc<StreamConfig>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) endpoint: Endpoint,
    registry: Arc<ListenerRegistry>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl Hub {
    fn control(&self) -> &StreamControl {
        self.registry.control()
    }

    /// Register a listener and make sure the pump is running
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn add_listener(
        self: &Arc<Self>,
        callback: impl Fn(&Event) + Send + Sync + 'static,
        filter: Option<Filter>,
    ) -> Disposer {
        let registration = self.registry.insert(Box::new(callback), filter);
        self.ensure_running();
        registration.disposer
    }

    fn ensure_running(self: &Arc<Self>) {
        let mut pump = self.pump.lock();
        if pump.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        debug!("Starting stream pump");
        *pump = Some(tokio::spawn(Self::run(Arc::downgrade(self))));
    }

    fn is_running(&self) -> bool {
        self.pump
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Clear the pump slot unless the stream was re-activated meanwhile
    ///
    /// A listener added while the pump was stopping saw it still running and
    /// did not start another, so the pump has to keep going in that case.
    fn release_pump(&self) -> bool {
        let mut pump = self.pump.lock();
        if self.control().is_active() {
            return false;
        }
        pump.take();
        true
    }

    /// The pump only holds a weak reference so it cannot outlive every handle
    async fn run(hub: Weak<Self>) {
        let Some((mut stream, registry, buffer)) = hub.upgrade().map(|hub| {
            let stream = ReconnectingStream::from_parts(
                hub.transport.clone(),
                hub.endpoint.clone(),
                hub.control().clone(),
            );
            (stream, hub.registry.clone(), hub.config.event_buffer.max(1))
        }) else {
            return;
        };
        let (tx, mut rx) = mpsc::channel::<Event>(buffer);

        let dispatcher = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                registry.dispatch(&event);
            }
        });

        loop {
            match stream.next_event().await {
                Some(event) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                None => {
                    let released = hub.upgrade().map_or(true, |hub| hub.release_pump());
                    if released {
                        break;
                    }
                }
            }
        }

        drop(tx);
        let _ = dispatcher.await;
        debug!("Listen has finished");
    }
}

impl Drop for Hub {
    fn drop(&mut self) {
        if !self.registry.is_empty() {
            debug!("Last stream handle dropped, stopping");
        }
        self.control().stop();
    }
}

/// Telemetry stream client
///
/// Cheap to clone; clones share the connection, the listeners and the
/// vehicles.
#[derive(Clone)]
pub struct TeslemetryStream {
    hub: Arc<Hub>,
    vehicles: Arc<Mutex<HashMap<String, Vehicle>>>,
}

impl TeslemetryStream {
    /// Create a client using the reqwest transport
    pub fn new(config: StreamConfig) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(HttpTransport::new(&config)?);
        Self::with_transport(config, transport)
    }

    /// Create a client on top of any transport
    pub fn with_transport(config: StreamConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let endpoint = Endpoint::new(config.clone())?;

        let hub = Arc::new(Hub {
            config,
            transport,
            endpoint,
            registry: ListenerRegistry::new(StreamControl::new()),
            pump: Mutex::new(None),
        });
        let stream = Self {
            hub,
            vehicles: Arc::new(Mutex::new(HashMap::new())),
        };

        if let Some(vin) = stream.vin() {
            let vin = vin.to_string();
            stream.get_vehicle(&vin)?;
        }
        Ok(stream)
    }

    pub fn config(&self) -> &StreamConfig {
        &self.hub.config
    }

    /// VIN of a single-vehicle stream
    pub fn vin(&self) -> Option<&str> {
        self.hub.config.connection.vin.as_deref()
    }

    /// The streaming server, if configured or already discovered
    pub fn server(&self) -> Option<Url> {
        self.hub.endpoint.server()
    }

    /// Handle for one vehicle, created on first use
    ///
    /// A single-vehicle stream only hands out its own vehicle.
    pub fn get_vehicle(&self, vin: &str) -> Result<Vehicle> {
        if let Some(own) = self.vin() {
            if own != vin {
                return Err(Error::configuration(format!(
                    "Stream started in single vehicle mode for {}",
                    own
                )));
            }
        }

        let mut vehicles = self.vehicles.lock();
        if let Some(vehicle) = vehicles.get(vin) {
            return Ok(vehicle.clone());
        }
        let vehicle = Vehicle::new(vin, self.hub.clone())?;
        vehicles.insert(vin.to_string(), vehicle.clone());
        Ok(vehicle)
    }

    /// The vehicle of a single-vehicle stream
    pub fn vehicle(&self) -> Option<Vehicle> {
        let vin = self.vin()?;
        self.vehicles.lock().get(vin).cloned()
    }

    /// Discover the streaming server from the account's region
    pub async fn find_server(&self) -> Result<Url> {
        self.hub.endpoint.find_server(self.hub.transport.as_ref()).await
    }

    /// Resolve the server and load the single vehicle's configuration
    #[instrument(skip(self))]
    pub async fn get_config(&self) -> Result<()> {
        self.hub.endpoint.resolve(self.hub.transport.as_ref()).await?;
        if let Some(vehicle) = self.vehicle() {
            vehicle.get_config().await?;
        }
        Ok(())
    }

    /// Call `callback` for every event matching `filter`
    ///
    /// The first listener starts the stream; disposing the last one stops it.
    /// Must be called from within a Tokio runtime.
    pub fn add_listener(
        &self,
        callback: impl Fn(&Event) + Send + Sync + 'static,
        filter: Option<Filter>,
    ) -> Disposer {
        self.hub.add_listener(callback, filter)
    }

    /// Listen for account credit updates
    pub fn listen_credits(&self, callback: impl Fn(&Value) + Send + Sync + 'static) -> Disposer {
        self.add_listener(
            move |event| {
                if let Some(credits) = event.get("credits") {
                    callback(credits);
                }
            },
            Some(Filter::new().key("credits")),
        )
    }

    /// Listen for the account credit balance
    pub fn listen_balance(
        &self,
        callback: impl Fn(Option<i64>) + Send + Sync + 'static,
    ) -> Disposer {
        self.add_listener(
            move |event| {
                let balance = event
                    .get("credits")
                    .and_then(|credits| credits.get("balance"))
                    .and_then(Value::as_i64);
                callback(balance);
            },
            Some(Filter::new().nested("credits", Filter::new().key("balance"))),
        )
    }

    /// A standalone event stream over the same server and transport
    ///
    /// It has its own run/stop flag and ignores the listeners.
    pub fn events(&self) -> ReconnectingStream {
        ReconnectingStream::from_parts(
            self.hub.transport.clone(),
            self.hub.endpoint.clone(),
            StreamControl::new(),
        )
    }

    pub fn listener_count(&self) -> usize {
        self.hub.registry.len()
    }

    /// Whether the background pump is alive
    pub fn is_running(&self) -> bool {
        self.hub.is_running()
    }

    pub fn active_state(&self) -> ActiveState {
        self.hub.control().state()
    }

    /// Stop the background pump; listeners stay registered
    ///
    /// Adding another listener starts it again.
    pub fn close(&self) {
        self.hub.control().stop();
    }
}

impl std::fmt::Debug for TeslemetryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeslemetryStream")
            .field("vin", &self.vin())
            .field("server", &self.server().map(|s| s.to_string()))
            .field("listeners", &self.listener_count())
            .field("active", &self.active_state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{MockStream, MockTransport};
    use crate::transport::Method;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn config() -> StreamConfig {
        StreamConfig::builder("token")
            .server("na.teslemetry.com")
            .vin("VIN1")
            .build()
    }

    /// Let every spawned task run until idle
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[test]
    fn test_single_vehicle_mode() {
        let mock = Arc::new(MockTransport::new());
        let stream = TeslemetryStream::with_transport(config(), mock).unwrap();

        assert_eq!(stream.vehicle().unwrap().vin(), "VIN1");
        assert!(stream.get_vehicle("VIN1").is_ok());
        assert!(matches!(
            stream.get_vehicle("VIN2"),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_fleet_mode_creates_vehicles_on_demand() {
        let mock = Arc::new(MockTransport::new());
        let stream =
            TeslemetryStream::with_transport(StreamConfig::builder("token").build(), mock).unwrap();

        assert!(stream.vehicle().is_none());
        let a = stream.get_vehicle("VIN1").unwrap();
        let b = stream.get_vehicle("VIN1").unwrap();
        assert!(a.same_vehicle(&b));
        assert!(stream.get_vehicle("VIN2").is_ok());
    }

    #[test]
    fn test_rejects_foreign_server() {
        let mock = Arc::new(MockTransport::new());
        let config = StreamConfig::builder("token").server("evil.example.com").build();
        assert!(matches!(
            TeslemetryStream::with_transport(config, mock),
            Err(Error::Configuration(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_listener_lifecycle() {
        let mock = Arc::new(MockTransport::new());
        let (live, feed) = MockStream::live();
        mock.push_stream(live);
        let stream = TeslemetryStream::with_transport(config(), mock.clone()).unwrap();
        assert!(!stream.is_running());

        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        let disposer = stream.add_listener(
            move |_| {
                s.fetch_add(1, Ordering::SeqCst);
            },
            None,
        );
        assert!(stream.is_running());
        assert_eq!(stream.active_state(), ActiveState::Active);

        feed.send_event(&json!({"vin": "VIN1", "data": {"BatteryLevel": 1}}));
        feed.send_event(&json!({"vin": "VIN1", "data": {"BatteryLevel": 2}}));
        settle().await;
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        assert!(disposer.dispose());
        assert_eq!(stream.active_state(), ActiveState::Stopped);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!stream.is_running());
        assert!(!feed.is_open());
        assert_eq!(mock.stream_opens().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_last_handle_stops_pump() {
        let mock = Arc::new(MockTransport::new());
        let (live, feed) = MockStream::live();
        mock.push_stream(live);
        let stream = TeslemetryStream::with_transport(config(), mock.clone()).unwrap();
        let copy = stream.clone();

        let _disposer = stream.add_listener(|_| {}, None);
        settle().await;
        assert!(feed.is_open());

        drop(stream);
        settle().await;
        assert!(feed.is_open());

        drop(copy);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!feed.is_open());
        assert_eq!(mock.stream_opens().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listener_panic_does_not_stop_stream() {
        let mock = Arc::new(MockTransport::new());
        let (live, feed) = MockStream::live();
        mock.push_stream(live);
        let stream = TeslemetryStream::with_transport(config(), mock).unwrap();

        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        let _bad = stream.add_listener(|_| panic!("bad listener"), None);
        let _good = stream.add_listener(
            move |_| {
                s.fetch_add(1, Ordering::SeqCst);
            },
            None,
        );

        feed.send_event(&json!({"n": 1}));
        settle().await;
        feed.send_event(&json!({"n": 2}));
        settle().await;

        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert!(stream.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_last_listener() {
        let mock = Arc::new(MockTransport::new());
        let (first, _first_feed) = MockStream::live();
        let (second, second_feed) = MockStream::live();
        mock.push_stream(first);
        mock.push_stream(second);
        let stream = TeslemetryStream::with_transport(config(), mock.clone()).unwrap();

        let d = stream.add_listener(|_| {}, None);
        settle().await;
        d.dispose();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!stream.is_running());

        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        let _d = stream.add_listener(
            move |_| {
                s.fetch_add(1, Ordering::SeqCst);
            },
            None,
        );
        settle().await;
        second_feed.send_event(&json!({"n": 1}));
        settle().await;

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(mock.stream_opens().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_credits_and_balance() {
        let mock = Arc::new(MockTransport::new());
        let (live, feed) = MockStream::live();
        mock.push_stream(live);
        let stream = TeslemetryStream::with_transport(config(), mock).unwrap();

        let balance = Arc::new(Mutex::new(None));
        let b = balance.clone();
        let _credits = stream.listen_credits(|_| {});
        let _balance = stream.listen_balance(move |value| *b.lock() = value);

        feed.send_event(&json!({"credits": {"balance": 1234, "cost": 1}}));
        settle().await;
        assert_eq!(*balance.lock(), Some(1234));
    }

    #[tokio::test]
    async fn test_get_config() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(Method::Get, "/api/metadata", 200, json!({"region": "NA"}));
        mock.respond(
            Method::Get,
            "/api/config/VIN1",
            200,
            json!({"fields": {"BatteryLevel": null}, "prefer_typed": false}),
        );
        let config = StreamConfig::builder("token").vin("VIN1").build();
        let stream = TeslemetryStream::with_transport(config, mock).unwrap();

        stream.get_config().await.unwrap();
        assert_eq!(
            stream.server().map(|s| s.to_string()).as_deref(),
            Some("https://na.teslemetry.com/")
        );
        let fields = stream.vehicle().unwrap().fields().await;
        assert!(fields.contains_key("BatteryLevel"));
    }
}
