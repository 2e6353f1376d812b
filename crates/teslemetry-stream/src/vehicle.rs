//! Per-vehicle listening and configuration

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::dispatch::Disposer;
use crate::error::Result;
use crate::filter::Filter;
use crate::signals::{self, Door, SignalValue};
use crate::stream::Hub;
use crate::streaming::{Event, EventKind};
use crate::sync::{ConfigSync, FieldTable, SyncOutcome};

struct VehicleInner {
    vin: String,
    hub: Arc<Hub>,
    sync: ConfigSync,
}

/// One vehicle of a [`crate::TeslemetryStream`]
///
/// Owns the vehicle's streaming configuration and registers listeners filtered
/// to its VIN. Cheap to clone.
#[derive(Clone)]
pub struct Vehicle {
    inner: Arc<VehicleInner>,
}

impl Vehicle {
    pub(crate) fn new(vin: &str, hub: Arc<Hub>) -> Result<Self> {
        let url = hub.endpoint.config_url(vin)?;
        let sync = ConfigSync::new(hub.transport.clone(), url, vin, hub.config.debounce());
        Ok(Self {
            inner: Arc::new(VehicleInner {
                vin: vin.to_string(),
                hub,
                sync,
            }),
        })
    }

    pub fn vin(&self) -> &str {
        &self.inner.vin
    }

    /// Whether both handles refer to the same vehicle instance
    pub fn same_vehicle(&self, other: &Vehicle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Load the streaming configuration from the server
    pub async fn get_config(&self) -> Result<()> {
        self.inner.sync.load().await
    }

    /// The local view as `{fields, prefer_typed}`
    pub async fn config(&self) -> Value {
        self.inner.sync.config().await
    }

    /// Fields currently enabled
    pub async fn fields(&self) -> FieldTable {
        self.inner.sync.fields().await
    }

    /// Enable a field, optionally at a fixed interval in seconds
    pub async fn add_field(&self, field: &str, interval: Option<u64>) -> Result<SyncOutcome> {
        self.inner.sync.add_field(field, interval).await
    }

    pub async fn prefer_typed(&self, prefer_typed: bool) -> Result<SyncOutcome> {
        self.inner.sync.prefer_typed(prefer_typed).await
    }

    /// Stage an arbitrary configuration change through the debouncer
    pub async fn update_config(&self, diff: Value) -> Result<SyncOutcome> {
        self.inner.sync.update_config(diff).await
    }

    /// Merge a configuration document on the server right away
    pub async fn patch_config(&self, config: Value) -> Result<Value> {
        self.inner.sync.patch_config(config).await
    }

    /// Overwrite the configuration on the server right away
    pub async fn post_config(&self, config: Value) -> Result<Value> {
        self.inner.sync.post_config(config).await
    }

    /// Overwrite the enabled fields
    pub async fn replace_fields(&self, fields: FieldTable) -> Result<Value> {
        self.inner.sync.replace_fields(fields).await
    }

    /// Enable `field` in the background
    fn enable_field(&self, field: &str) {
        let vehicle = self.clone();
        let field = field.to_string();
        tokio::spawn(async move {
            if let Err(e) = vehicle.add_field(&field, None).await {
                warn!(vin = %vehicle.vin(), field = %field, error = %e, "Failed to enable streaming field");
            }
        });
    }

    /// Listen to every event for this vehicle matching `filter`
    pub fn add_listener(
        &self,
        callback: impl Fn(&Event) + Send + Sync + 'static,
        filter: Option<Filter>,
    ) -> Disposer {
        let filter = filter.unwrap_or_default().equals("vin", self.vin());
        self.inner.hub.add_listener(callback, Some(filter))
    }

    /// Listen to one signal, decoded according to the signal table
    ///
    /// The field is enabled on the server if it is not already. Signals that
    /// are not in the table are passed through as raw JSON.
    pub fn listen(
        &self,
        signal: &str,
        callback: impl Fn(Option<SignalValue>) + Send + Sync + 'static,
    ) -> Disposer {
        self.enable_field(signal);

        let kind = signals::lookup(signal).map(|spec| spec.kind);
        let name = signal.to_string();
        self.add_listener(
            move |event| {
                let raw = event.signal(&name).unwrap_or(&Value::Null);
                let value = match kind {
                    Some(kind) => SignalValue::decode(kind, raw),
                    None => SignalValue::decode_signal(&name, raw),
                };
                callback(value);
            },
            Some(Filter::new().nested("data", Filter::new().key(signal))),
        )
    }

    /// Listen to one door of the `DoorState` signal
    pub fn listen_door(
        &self,
        door: Door,
        callback: impl Fn(Option<bool>) + Send + Sync + 'static,
    ) -> Disposer {
        const DOOR_STATE: &str = "DoorState";
        self.enable_field(DOOR_STATE);

        self.add_listener(
            move |event| {
                let open = event
                    .signal(DOOR_STATE)
                    .and_then(|doors| doors.get(door.key()))
                    .and_then(Value::as_bool);
                callback(open);
            },
            Some(Filter::new().nested("data", Filter::new().key(DOOR_STATE))),
        )
    }

    /// Listen to one kind of top-level event (state, alerts, errors, ...)
    ///
    /// The callback receives the value under the event's marker key.
    pub fn listen_event(
        &self,
        kind: EventKind,
        callback: impl Fn(&Value) + Send + Sync + 'static,
    ) -> Disposer {
        let key = kind.key();
        self.add_listener(
            move |event| {
                if let Some(value) = event.get(key) {
                    callback(value);
                }
            },
            Some(Filter::new().key(key)),
        )
    }
}

impl std::fmt::Debug for Vehicle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vehicle").field("vin", &self.inner.vin).finish()
    }
}
