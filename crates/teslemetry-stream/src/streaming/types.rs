//! Types for the telemetry event stream

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::transport::TransportError;

/// One decoded telemetry record
///
/// An arbitrarily nested JSON object. Signal events carry a `vin` and a
/// `data` object of signal name to value; other events carry a top-level
/// marker such as `state` or `alerts` instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Map<String, Value>);

impl Event {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap a JSON value; `None` unless it is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Vehicle identifier
    pub fn vin(&self) -> Option<&str> {
        self.0.get("vin").and_then(|v| v.as_str())
    }

    /// The `data` object of a signal event
    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.0.get("data").and_then(|v| v.as_object())
    }

    /// Raw value of one signal
    pub fn signal(&self, name: &str) -> Option<&Value> {
        self.data().and_then(|data| data.get(name))
    }

    /// The `createdAt` string, if present
    pub fn created_at(&self) -> Option<&str> {
        self.0.get("createdAt").and_then(|v| v.as_str())
    }

    /// Millisecond epoch derived from `createdAt` (timestamp parsing mode only)
    pub fn timestamp(&self) -> Option<i64> {
        self.0.get("timestamp").and_then(|v| v.as_i64())
    }

    /// Which top-level marker this event carries
    pub fn kind(&self) -> Option<EventKind> {
        EventKind::ALL.into_iter().find(|kind| self.has(kind.key()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Event {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Top-level event markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Signal values under `data`
    Data,
    /// Online/asleep state changes
    State,
    Alerts,
    Errors,
    /// Full vehicle data snapshot
    VehicleData,
    /// Network status changes
    Connectivity,
    /// Account credit updates
    Credits,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::Data,
        EventKind::State,
        EventKind::Alerts,
        EventKind::Errors,
        EventKind::VehicleData,
        EventKind::Connectivity,
        EventKind::Credits,
    ];

    /// The top-level key that identifies this kind on the wire
    pub fn key(self) -> &'static str {
        match self {
            EventKind::Data => "data",
            EventKind::State => "state",
            EventKind::Alerts => "alerts",
            EventKind::Errors => "errors",
            EventKind::VehicleData => "vehicle_data",
            EventKind::Connectivity => "networkInterface",
            EventKind::Credits => "credits",
        }
    }
}

/// Lifecycle of a [`super::ReconnectingStream`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Connecting,
    Active,
    /// Waiting out a backoff delay
    Erroring,
    /// Stopped on request; terminal
    Closed,
}

/// Failure to turn one `data:` line into an [`Event`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid UTF-8 in stream line")]
    Utf8,

    #[error("Invalid event JSON: {0}")]
    Json(String),

    #[error("Event payload is not a JSON object")]
    NotAnObject,

    #[error("Invalid createdAt timestamp: {0}")]
    Timestamp(String),

    #[error("Stream line exceeds {0} bytes")]
    LineTooLong(usize),
}

/// Errors inside the reconnect loop
///
/// `Connection`, `Ended`, `Decode` and `Discovery` are recoverable and drive
/// the backoff path. `Stopped` and `NotConfigured` end the stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("Connection error: {0}")]
    Connection(#[from] TransportError),

    #[error("The stream was ended by the server")]
    Ended,

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The streaming server could not be resolved
    #[error("Server discovery failed: {0}")]
    Discovery(String),

    #[error("Vehicle {0} is not configured for streaming")]
    NotConfigured(String),

    #[error("Stream stopped")]
    Stopped,
}

impl StreamError {
    /// Whether the reconnect loop retries after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, StreamError::Stopped | StreamError::NotConfigured(_))
    }
}

/// Result type for streaming operations
pub type StreamResult<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: Value) -> Event {
        Event::from_value(value).unwrap()
    }

    #[test]
    fn test_signal_accessors() {
        let e = event(json!({
            "vin": "VIN1",
            "createdAt": "2024-01-01T00:00:00.123Z",
            "data": {"BatteryLevel": 42}
        }));

        assert_eq!(e.vin(), Some("VIN1"));
        assert_eq!(e.signal("BatteryLevel"), Some(&json!(42)));
        assert_eq!(e.signal("VehicleSpeed"), None);
        assert_eq!(e.created_at(), Some("2024-01-01T00:00:00.123Z"));
        assert_eq!(e.kind(), Some(EventKind::Data));
    }

    #[test]
    fn test_event_kind() {
        assert_eq!(event(json!({"vin": "V", "state": "online"})).kind(), Some(EventKind::State));
        assert_eq!(event(json!({"vin": "V", "alerts": []})).kind(), Some(EventKind::Alerts));
        assert_eq!(event(json!({"credits": {"balance": 3}})).kind(), Some(EventKind::Credits));
        assert_eq!(event(json!({"vin": "V"})).kind(), None);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(Event::from_value(json!([1, 2])).is_none());
    }

    #[test]
    fn test_recoverable() {
        assert!(StreamError::Ended.is_recoverable());
        assert!(StreamError::Decode(DecodeError::NotAnObject).is_recoverable());
        assert!(!StreamError::Stopped.is_recoverable());
        assert!(!StreamError::NotConfigured("V".into()).is_recoverable());
    }
}
