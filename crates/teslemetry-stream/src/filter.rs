//! Partial structural matching of events
//!
//! A [`Filter`] is shaped like a subset of an event. Every key in the filter
//! must be present in the event; `null` leaves only assert presence, other
//! leaves must be equal, objects recurse, and arrays of patterns require each
//! pattern to match at least one element of the event's array.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::streaming::Event;

/// Listener filter pattern
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(Map<String, Value>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` to be present with any value
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.insert(key.into(), Value::Null);
        self
    }

    /// Require `key` to equal `value`
    pub fn equals(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Require `key` to hold an object matching `filter`
    pub fn nested(mut self, key: impl Into<String>, filter: Filter) -> Self {
        self.0.insert(key.into(), Value::Object(filter.0));
        self
    }

    /// `None` unless `value` is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Whether `event` satisfies this pattern
    pub fn matches(&self, event: &Event) -> bool {
        match_map(&self.0, event.as_map())
    }
}

impl From<Map<String, Value>> for Filter {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Match an optional filter; no filter matches everything
pub fn matches(filter: Option<&Filter>, event: &Event) -> bool {
    filter.map_or(true, |f| f.matches(event))
}

fn match_map(pattern: &Map<String, Value>, target: &Map<String, Value>) -> bool {
    pattern.iter().all(|(key, expected)| match target.get(key) {
        Some(actual) => match_value(expected, actual),
        None => false,
    })
}

fn match_value(expected: &Value, actual: &Value) -> bool {
    match expected {
        Value::Null => true,
        Value::Object(pattern) => match actual {
            Value::Object(target) => match_map(pattern, target),
            _ => false,
        },
        Value::Array(patterns) => match actual {
            Value::Array(items) => patterns
                .iter()
                .all(|p| items.iter().any(|item| match_value(p, item))),
            _ => false,
        },
        Value::Number(a) => match actual {
            Value::Number(b) if a.is_f64() || b.is_f64() => a.as_f64() == b.as_f64(),
            Value::Number(b) => a == b,
            _ => false,
        },
        scalar => scalar == actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: Value) -> Event {
        Event::from_value(value).unwrap()
    }

    fn filter(value: Value) -> Filter {
        Filter::from_value(value).unwrap()
    }

    #[test]
    fn test_presence_and_equality() {
        let e = event(json!({"vin": "X", "data": {"BatteryLevel": 42, "VehicleSpeed": 0}}));

        assert!(filter(json!({"data": {"BatteryLevel": null}})).matches(&e));
        assert!(filter(json!({"vin": "X", "data": {"BatteryLevel": 42}})).matches(&e));
        assert!(!filter(json!({"data": {"BatteryLevel": 50}})).matches(&e));
        assert!(!filter(json!({"vin": "Y"})).matches(&e));
        assert!(!filter(json!({"data": {"Odometer": null}})).matches(&e));
        assert!(!filter(json!({"state": null})).matches(&e));
    }

    #[test]
    fn test_empty_and_absent_filters() {
        let e = event(json!({"vin": "X"}));
        assert!(Filter::new().matches(&e));
        assert!(matches(None, &e));
    }

    #[test]
    fn test_null_value_still_requires_key() {
        let e = event(json!({"vin": "X", "data": {"Gear": null}}));
        assert!(filter(json!({"data": {"Gear": null}})).matches(&e));
        assert!(!filter(json!({"data": {"Gear": "ShiftStateD"}})).matches(&e));
    }

    #[test]
    fn test_nested_pattern_against_scalar() {
        let e = event(json!({"data": 5}));
        assert!(!filter(json!({"data": {"BatteryLevel": null}})).matches(&e));
    }

    #[test]
    fn test_sequences() {
        let e = event(json!({
            "alerts": [
                {"name": "A", "audiences": ["Customer"]},
                {"name": "B", "audiences": ["Service"]}
            ]
        }));

        assert!(filter(json!({"alerts": [{"name": "A"}]})).matches(&e));
        assert!(filter(json!({"alerts": [{"name": "A"}, {"name": "B"}]})).matches(&e));
        assert!(!filter(json!({"alerts": [{"name": "A"}, {"name": "C"}]})).matches(&e));
        assert!(filter(json!({"alerts": []})).matches(&e));
        assert!(!filter(json!({"alerts": [{"name": "A"}]})).matches(&event(json!({"alerts": {}}))));
    }

    #[test]
    fn test_numbers_compare_by_value() {
        let e = event(json!({"data": {"BatteryLevel": 42.0}}));
        assert!(filter(json!({"data": {"BatteryLevel": 42}})).matches(&e));
    }

    #[test]
    fn test_builder() {
        let f = Filter::new()
            .equals("vin", "X")
            .nested("data", Filter::new().key("BatteryLevel"));
        assert_eq!(f, filter(json!({"vin": "X", "data": {"BatteryLevel": null}})));
        assert!(f.matches(&event(json!({"vin": "X", "data": {"BatteryLevel": 1}}))));
    }
}
