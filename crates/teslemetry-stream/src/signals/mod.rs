//! Signal table and typed value decoding
//!
//! Each streamable signal has a [`ValueKind`] that says how its raw JSON value
//! is turned into a [`SignalValue`]. The service is not strict about types
//! (numbers and booleans sometimes arrive as strings), so decoding coerces
//! where the intent is clear and yields `None` otherwise.

mod enums;
mod table;

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

pub use enums::*;
pub use table::SIGNALS;

/// How a signal's raw value is decoded
#[derive(Debug, Clone, Copy)]
pub enum ValueKind {
    Float,
    Int,
    Bool,
    Text,
    /// `{latitude, longitude}` object
    Location,
    /// Free-form object (e.g. `DoorState`)
    Object,
    Enum(&'static EnumTable),
}

impl ValueKind {
    /// Short name used in listings
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Float => "float",
            ValueKind::Int => "int",
            ValueKind::Bool => "bool",
            ValueKind::Text => "text",
            ValueKind::Location => "location",
            ValueKind::Object => "object",
            ValueKind::Enum(table) => table.prefix,
        }
    }
}

/// One entry of the signal table
#[derive(Debug, Clone, Copy)]
pub struct SignalSpec {
    pub name: &'static str,
    pub kind: ValueKind,
}

impl SignalSpec {
    pub const fn new(name: &'static str, kind: ValueKind) -> Self {
        Self { name, kind }
    }
}

/// Look up a signal by its wire name
pub fn lookup(name: &str) -> Option<&'static SignalSpec> {
    SIGNALS
        .binary_search_by(|spec| spec.name.cmp(name))
        .ok()
        .map(|index| &SIGNALS[index])
}

/// Closed set of labels for one enumerated signal type
#[derive(Debug)]
pub struct EnumTable {
    /// Prefix the wire values carry, e.g. `ShiftState`
    pub prefix: &'static str,
    /// Lowercase labels
    pub options: &'static [&'static str],
}

impl EnumTable {
    pub const fn new(prefix: &'static str, options: &'static [&'static str]) -> Self {
        Self { prefix, options }
    }

    /// Map a wire value onto a label
    ///
    /// Unprefixed values are accepted too. Anything outside the table comes
    /// back as [`EnumValue::Unknown`] with the raw text.
    pub fn get(&self, raw: &str) -> EnumValue {
        let suffix = raw.strip_prefix(self.prefix).unwrap_or(raw);
        self.options
            .iter()
            .copied()
            .find(|option| option.eq_ignore_ascii_case(suffix))
            .map(EnumValue::Known)
            .unwrap_or_else(|| EnumValue::Unknown(raw.to_string()))
    }
}

/// Result of an [`EnumTable`] lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EnumValue {
    Known(&'static str),
    Unknown(String),
}

impl EnumValue {
    /// The label, or the raw value when unmapped
    pub fn as_str(&self) -> &str {
        match self {
            EnumValue::Known(label) => label,
            EnumValue::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, EnumValue::Known(_))
    }
}

/// Geographic position
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Decoded value of one signal
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SignalValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Text(String),
    Location(Location),
    Object(Map<String, Value>),
    Enum(EnumValue),
    /// A value that did not fit its declared kind, passed through untouched
    Json(Value),
}

impl SignalValue {
    /// Decode `raw` as `kind`; `None` for null or values that cannot be coerced
    pub fn decode(kind: ValueKind, raw: &Value) -> Option<SignalValue> {
        if raw.is_null() {
            return None;
        }

        match kind {
            ValueKind::Float => match raw {
                Value::Number(n) => n.as_f64().map(SignalValue::Float),
                Value::String(s) => s.trim().parse().ok().map(SignalValue::Float),
                _ => None,
            },
            ValueKind::Int => match raw {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().map(|f| f as i64))
                    .map(SignalValue::Int),
                Value::String(s) => s.trim().parse().ok().map(SignalValue::Int),
                _ => None,
            },
            ValueKind::Bool => match raw {
                Value::Bool(b) => Some(SignalValue::Bool(*b)),
                Value::String(s) => Some(SignalValue::Bool(s == "true")),
                _ => None,
            },
            ValueKind::Text => match raw {
                Value::String(s) => Some(SignalValue::Text(s.clone())),
                other => Some(SignalValue::Json(other.clone())),
            },
            ValueKind::Location => {
                let latitude = raw.get("latitude").and_then(Value::as_f64)?;
                let longitude = raw.get("longitude").and_then(Value::as_f64)?;
                Some(SignalValue::Location(Location {
                    latitude,
                    longitude,
                }))
            }
            ValueKind::Object => raw.as_object().cloned().map(SignalValue::Object),
            ValueKind::Enum(table) => raw.as_str().map(|s| SignalValue::Enum(table.get(s))),
        }
    }

    /// Decode using the signal table; unknown signals pass through as JSON
    pub fn decode_signal(signal: &str, raw: &Value) -> Option<SignalValue> {
        match lookup(signal) {
            Some(spec) => Self::decode(spec.kind, raw),
            None if raw.is_null() => None,
            None => Some(SignalValue::Json(raw.clone())),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SignalValue::Float(f) => Some(*f),
            SignalValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SignalValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SignalValue::Text(s) => Some(s),
            SignalValue::Enum(e) => Some(e.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Float(v) => write!(f, "{}", v),
            SignalValue::Int(v) => write!(f, "{}", v),
            SignalValue::Bool(v) => write!(f, "{}", v),
            SignalValue::Text(v) => f.write_str(v),
            SignalValue::Location(l) => write!(f, "{:.6}, {:.6}", l.latitude, l.longitude),
            SignalValue::Object(map) => write!(f, "{}", Value::Object(map.clone())),
            SignalValue::Enum(e) => f.write_str(e.as_str()),
            SignalValue::Json(v) => write!(f, "{}", v),
        }
    }
}

/// Doors reported inside the `DoorState` object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Door {
    DriverFront,
    DriverRear,
    PassengerFront,
    PassengerRear,
    TrunkFront,
    TrunkRear,
}

impl Door {
    /// Key of this door within `DoorState`
    pub fn key(self) -> &'static str {
        match self {
            Door::DriverFront => "DriverFront",
            Door::DriverRear => "DriverRear",
            Door::PassengerFront => "PassengerFront",
            Door::PassengerRear => "PassengerRear",
            Door::TrunkFront => "TrunkFront",
            Door::TrunkRear => "TrunkRear",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_is_sorted() {
        assert!(SIGNALS.windows(2).all(|w| w[0].name < w[1].name));
    }

    #[test]
    fn test_lookup() {
        assert!(matches!(lookup("BatteryLevel").unwrap().kind, ValueKind::Float));
        assert!(matches!(lookup("Location").unwrap().kind, ValueKind::Location));
        assert!(matches!(lookup("Gear").unwrap().kind, ValueKind::Enum(_)));
        assert!(lookup("NotASignal").is_none());
    }

    #[test]
    fn test_enum_lookup() {
        assert_eq!(SHIFT_STATE.get("ShiftStateD"), EnumValue::Known("d"));
        assert_eq!(SHIFT_STATE.get("P"), EnumValue::Known("p"));
        assert_eq!(
            WINDOW_STATE.get("WindowStatePartiallyOpen"),
            EnumValue::Known("partiallyopen")
        );
        assert_eq!(
            SHIFT_STATE.get("ShiftStateWarp"),
            EnumValue::Unknown("ShiftStateWarp".to_string())
        );
    }

    #[test]
    fn test_string_coercions() {
        assert_eq!(
            SignalValue::decode(ValueKind::Float, &json!("12.5")),
            Some(SignalValue::Float(12.5))
        );
        assert_eq!(
            SignalValue::decode(ValueKind::Int, &json!("7")),
            Some(SignalValue::Int(7))
        );
        assert_eq!(
            SignalValue::decode(ValueKind::Bool, &json!("true")),
            Some(SignalValue::Bool(true))
        );
        assert_eq!(
            SignalValue::decode(ValueKind::Bool, &json!("false")),
            Some(SignalValue::Bool(false))
        );
        assert_eq!(SignalValue::decode(ValueKind::Float, &json!("n/a")), None);
        assert_eq!(SignalValue::decode(ValueKind::Float, &Value::Null), None);
    }

    #[test]
    fn test_location() {
        let value = SignalValue::decode(
            ValueKind::Location,
            &json!({"latitude": -33.8, "longitude": 151.2}),
        );
        assert_eq!(
            value,
            Some(SignalValue::Location(Location {
                latitude: -33.8,
                longitude: 151.2
            }))
        );
        assert_eq!(
            SignalValue::decode(ValueKind::Location, &json!({"latitude": 1.0})),
            None
        );
    }

    #[test]
    fn test_decode_signal() {
        assert_eq!(
            SignalValue::decode_signal("Gear", &json!("ShiftStateR")),
            Some(SignalValue::Enum(EnumValue::Known("r")))
        );
        assert_eq!(
            SignalValue::decode_signal("SomethingNew", &json!([1])),
            Some(SignalValue::Json(json!([1])))
        );
        assert_eq!(
            SignalValue::decode_signal("Odometer", &json!(1234.5))
                .and_then(|v| v.as_f64()),
            Some(1234.5)
        );
    }
}
