//! Debounced synchronization of a vehicle's streaming configuration
//!
//! Changes are deep-merged into a pending diff. Each change then waits out the
//! debounce window and, if the diff has not been flushed by another waiter in
//! the meantime, sends the whole diff in a single PATCH. The lock is held
//! across the write, so changes made while a write is in flight land in the
//! next one.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Settings for one streamed field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_seconds: Option<u64>,

    /// Settings this client does not interpret (e.g. `minimum_delta`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldConfig {
    pub fn interval(seconds: u64) -> Self {
        Self {
            interval_seconds: Some(seconds),
            extra: Map::new(),
        }
    }
}

/// Enabled fields by name; `None` means enabled with the server's default
/// interval
pub type FieldTable = BTreeMap<String, Option<FieldConfig>>;

/// Recorded interval of `field`, if it is enabled with one
pub fn field_interval(fields: &FieldTable, field: &str) -> Option<u64> {
    fields
        .get(field)
        .and_then(|config| config.as_ref())
        .and_then(|config| config.interval_seconds)
}

/// What a configuration change ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Already in the requested state; nothing was staged
    Unchanged,
    /// Another waiter flushed the diff this change was merged into
    Coalesced,
    /// This call wrote the diff and the server acknowledged it
    Flushed,
    /// The server reported an error; the diff is kept for the next write
    Rejected(String),
    /// The server neither acknowledged nor rejected the write; the diff is kept
    Unacknowledged,
}

#[derive(Debug, Default)]
struct SyncState {
    pending: Map<String, Value>,
    fields: FieldTable,
    prefer_typed: Option<bool>,
}

/// Local mirror and debounced writer of one vehicle's configuration
pub struct ConfigSync {
    transport: Arc<dyn Transport>,
    url: Url,
    vin: String,
    debounce: Duration,
    state: Mutex<SyncState>,
}

impl ConfigSync {
    pub fn new(
        transport: Arc<dyn Transport>,
        url: Url,
        vin: impl Into<String>,
        debounce: Duration,
    ) -> Self {
        Self {
            transport,
            url,
            vin: vin.into(),
            debounce,
            state: Mutex::new(SyncState::default()),
        }
    }

    /// Snapshot of the enabled fields
    pub async fn fields(&self) -> FieldTable {
        self.state.lock().await.fields.clone()
    }

    pub async fn prefer_typed_setting(&self) -> Option<bool> {
        self.state.lock().await.prefer_typed
    }

    /// Changes not yet acknowledged by the server
    pub async fn pending(&self) -> Map<String, Value> {
        self.state.lock().await.pending.clone()
    }

    /// The local view as `{fields, prefer_typed}`
    pub async fn config(&self) -> Value {
        let state = self.state.lock().await;
        json!({
            "fields": state.fields,
            "prefer_typed": state.prefer_typed,
        })
    }

    /// Load the configuration from the server
    ///
    /// A 404 means the vehicle has no configuration yet and leaves the local
    /// view empty.
    #[instrument(skip(self), fields(vin = %self.vin))]
    pub async fn load(&self) -> Result<()> {
        let response = self.transport.request(ApiRequest::get(self.url.clone())).await?;

        match response.status {
            200 => {
                let fields = match response.body.get("fields") {
                    Some(Value::Null) | None => FieldTable::new(),
                    Some(fields) => serde_json::from_value(fields.clone())
                        .map_err(|e| Error::Parse(format!("Invalid fields: {}", e)))?,
                };
                let prefer_typed = response
                    .body
                    .get("prefer_typed")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);

                let mut state = self.state.lock().await;
                state.fields = fields;
                state.prefer_typed = Some(prefer_typed);
                debug!(fields = state.fields.len(), prefer_typed, "Loaded streaming config");
                Ok(())
            }
            404 => {
                debug!("No streaming config yet");
                Ok(())
            }
            status => Err(server_error(&response, status)),
        }
    }

    /// Enable `field`, optionally at a fixed interval
    ///
    /// Nothing is sent if the field is already enabled at that interval, or
    /// at all when no interval is requested. An interval of zero stages the
    /// field with the server's default interval.
    pub async fn add_field(&self, field: &str, interval: Option<u64>) -> Result<SyncOutcome> {
        {
            let state = self.state.lock().await;
            if state.fields.contains_key(field)
                && (interval.is_none() || field_interval(&state.fields, field) == interval)
            {
                debug!(
                    field,
                    interval = ?field_interval(&state.fields, field),
                    "Streaming field already enabled"
                );
                return Ok(SyncOutcome::Unchanged);
            }
        }

        let value = match interval {
            Some(seconds) if seconds > 0 => json!({ "interval_seconds": seconds }),
            _ => Value::Null,
        };
        self.update_config(json!({ "fields": { field: value } })).await
    }

    /// Ask the server to send typed values instead of strings
    pub async fn prefer_typed(&self, prefer_typed: bool) -> Result<SyncOutcome> {
        if self.state.lock().await.prefer_typed == Some(prefer_typed) {
            return Ok(SyncOutcome::Unchanged);
        }
        self.update_config(json!({ "prefer_typed": prefer_typed })).await
    }

    /// Merge `diff` into the pending changes and flush after the debounce
    /// window
    ///
    /// Transport failures are returned and leave the diff pending.
    pub async fn update_config(&self, diff: Value) -> Result<SyncOutcome> {
        let Value::Object(diff) = diff else {
            return Err(Error::configuration("Configuration diff must be an object"));
        };

        deep_merge(&mut self.state.lock().await.pending, diff);

        tokio::time::sleep(self.debounce).await;

        let mut state = self.state.lock().await;
        if state.pending.is_empty() {
            return Ok(SyncOutcome::Coalesced);
        }

        let body = Value::Object(state.pending.clone());
        let response = self
            .transport
            .request(ApiRequest::patch(self.url.clone(), body))
            .await?;

        let rejection = response.error_message().or_else(|| {
            (!response.is_success()).then(|| format!("HTTP {}", response.status))
        });
        if let Some(message) = rejection {
            error!(vin = %self.vin, error = %message, "Error updating streaming config");
            return Ok(SyncOutcome::Rejected(message));
        }

        if !is_truthy(response.body.pointer("/response/updated_vehicles")) {
            warn!(vin = %self.vin, "Streaming config update was not acknowledged");
            return Ok(SyncOutcome::Unacknowledged);
        }

        info!(vin = %self.vin, "Updated vehicle streaming config");
        let pending = std::mem::take(&mut state.pending);
        if let Some(Value::Object(fields)) = pending.get("fields") {
            debug!(
                fields = %fields.keys().cloned().collect::<Vec<_>>().join(", "),
                "Configured streaming fields"
            );
            for (name, config) in fields {
                let config = match serde_json::from_value(config.clone()) {
                    Ok(config) => config,
                    Err(e) => {
                        warn!(
                            vin = %self.vin,
                            field = %name,
                            error = %e,
                            "Unreadable field config, recording it without an interval"
                        );
                        None
                    }
                };
                state.fields.insert(name.clone(), config);
            }
        }
        if let Some(prefer_typed) = pending.get("prefer_typed").and_then(Value::as_bool) {
            debug!(prefer_typed, "Configured streaming typed");
            state.prefer_typed = Some(prefer_typed);
        }

        Ok(SyncOutcome::Flushed)
    }

    /// PATCH a configuration document as-is and return the response body
    #[instrument(skip(self, config), fields(vin = %self.vin))]
    pub async fn patch_config(&self, config: Value) -> Result<Value> {
        let response = self
            .transport
            .request(ApiRequest::patch(self.url.clone(), config))
            .await?;
        Ok(response.body)
    }

    /// POST (overwrite) a configuration document and return the response body
    #[instrument(skip(self, config), fields(vin = %self.vin))]
    pub async fn post_config(&self, config: Value) -> Result<Value> {
        let response = self
            .transport
            .request(ApiRequest::post(self.url.clone(), config))
            .await?;
        Ok(response.body)
    }

    /// Overwrite the enabled fields; the local table follows on success
    pub async fn replace_fields(&self, fields: FieldTable) -> Result<Value> {
        let body = json!({ "fields": fields });
        let response = self
            .transport
            .request(ApiRequest::post(self.url.clone(), body))
            .await?;

        if response.is_success() && response.error_message().is_none() {
            info!(vin = %self.vin, fields = fields.len(), "Replaced streaming fields");
            self.state.lock().await.fields = fields;
        }
        Ok(response.body)
    }
}

impl std::fmt::Debug for ConfigSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigSync")
            .field("vin", &self.vin)
            .field("url", &self.url.as_str())
            .field("debounce", &self.debounce)
            .finish()
    }
}

fn server_error(response: &ApiResponse, status: u16) -> Error {
    let message = response
        .error_message()
        .unwrap_or_else(|| "unexpected response".to_string());
    Error::server_error(status, message)
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// Merge `source` into `target`: objects merge key by key, anything else
/// overwrites
pub fn deep_merge(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match value {
            Value::Object(source_map) => {
                let node = target
                    .entry(key)
                    .or_insert_with(|| Value::Object(Map::new()));
                if !node.is_object() {
                    *node = Value::Object(Map::new());
                }
                if let Value::Object(target_map) = node {
                    deep_merge(target_map, source_map);
                }
            }
            other => {
                target.insert(key, other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use crate::transport::Method;

    const PATH: &str = "/api/config/VIN1";

    fn sync(mock: &Arc<MockTransport>) -> ConfigSync {
        ConfigSync::new(
            mock.clone(),
            Url::parse("https://api.teslemetry.com/api/config/VIN1").unwrap(),
            "VIN1",
            Duration::from_secs(1),
        )
    }

    fn acknowledge(mock: &MockTransport) {
        mock.respond(
            Method::Patch,
            PATH,
            200,
            json!({"response": {"updated_vehicles": 1}}),
        );
    }

    fn patches(mock: &MockTransport) -> Vec<Value> {
        mock.requests_with(Method::Patch)
            .into_iter()
            .filter_map(|r| r.body)
            .collect()
    }

    #[test]
    fn test_deep_merge() {
        let mut target = json!({"fields": {"A": null, "B": {"interval_seconds": 5}}, "x": 1})
            .as_object()
            .cloned()
            .unwrap();
        let source = json!({"fields": {"A": {"interval_seconds": 10}, "C": null}, "x": {"y": 2}})
            .as_object()
            .cloned()
            .unwrap();

        deep_merge(&mut target, source);
        assert_eq!(
            Value::Object(target),
            json!({
                "fields": {
                    "A": {"interval_seconds": 10},
                    "B": {"interval_seconds": 5},
                    "C": null
                },
                "x": {"y": 2}
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_coalesces_writes() {
        let mock = Arc::new(MockTransport::new());
        acknowledge(&mock);
        let sync = sync(&mock);

        let (a, b, c) = tokio::join!(
            sync.add_field("BatteryLevel", Some(30)),
            sync.add_field("VehicleSpeed", None),
            sync.add_field("Gear", Some(0)),
        );
        let mut outcomes = vec![a.unwrap(), b.unwrap(), c.unwrap()];
        outcomes.sort_by_key(|o| format!("{:?}", o));
        assert_eq!(
            outcomes,
            vec![
                SyncOutcome::Coalesced,
                SyncOutcome::Coalesced,
                SyncOutcome::Flushed
            ]
        );

        assert_eq!(
            patches(&mock),
            vec![json!({"fields": {
                "BatteryLevel": {"interval_seconds": 30},
                "VehicleSpeed": null,
                "Gear": null
            }})]
        );

        let fields = sync.fields().await;
        assert_eq!(field_interval(&fields, "BatteryLevel"), Some(30));
        assert_eq!(fields.get("VehicleSpeed"), Some(&None));
        assert!(sync.pending().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_during_write_goes_into_next_write() {
        let mock = Arc::new(MockTransport::new());
        acknowledge(&mock);
        mock.respond_delayed(
            Method::Patch,
            PATH,
            Duration::from_secs(3),
            200,
            json!({"response": {"updated_vehicles": 1}}),
        );
        let sync = sync(&mock);
        let start = tokio::time::Instant::now();

        // B arrives while the PATCH carrying A is still in flight
        let (a, b) = tokio::join!(sync.add_field("A", None), async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            sync.add_field("B", None).await
        });

        assert_eq!(a.unwrap(), SyncOutcome::Flushed);
        assert_eq!(b.unwrap(), SyncOutcome::Flushed);
        assert_eq!(
            patches(&mock),
            vec![json!({"fields": {"A": null}}), json!({"fields": {"B": null}})]
        );
        // First write ends at 4s, B then waits out its own window
        assert_eq!(start.elapsed(), Duration::from_secs(5));

        let fields = sync.fields().await;
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert!(sync.pending().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreadable_field_config_recorded_without_interval() {
        let mock = Arc::new(MockTransport::new());
        acknowledge(&mock);
        let sync = sync(&mock);

        let outcome = sync
            .update_config(json!({"fields": {"A": {"interval_seconds": "x"}}}))
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Flushed);

        let fields = sync.fields().await;
        assert_eq!(fields.get("A"), Some(&None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_field_is_idempotent() {
        let mock = Arc::new(MockTransport::new());
        acknowledge(&mock);
        let sync = sync(&mock);

        assert_eq!(
            sync.add_field("BatteryLevel", Some(30)).await.unwrap(),
            SyncOutcome::Flushed
        );
        assert_eq!(
            sync.add_field("BatteryLevel", Some(30)).await.unwrap(),
            SyncOutcome::Unchanged
        );
        // No interval requested: enabled at any interval is enough
        assert_eq!(
            sync.add_field("BatteryLevel", None).await.unwrap(),
            SyncOutcome::Unchanged
        );
        assert_eq!(patches(&mock).len(), 1);

        // A different interval is a change
        assert_eq!(
            sync.add_field("BatteryLevel", Some(60)).await.unwrap(),
            SyncOutcome::Flushed
        );
        assert_eq!(patches(&mock).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_diff_is_retried() {
        let mock = Arc::new(MockTransport::new());
        acknowledge(&mock);
        mock.respond_once(Method::Patch, PATH, 200, json!({"error": "rate_limited"}));
        let sync = sync(&mock);

        assert_eq!(
            sync.add_field("BatteryLevel", None).await.unwrap(),
            SyncOutcome::Rejected("rate_limited".to_string())
        );
        assert!(sync.fields().await.is_empty());
        assert!(!sync.pending().await.is_empty());

        assert_eq!(
            sync.add_field("Odometer", None).await.unwrap(),
            SyncOutcome::Flushed
        );
        let writes = patches(&mock);
        assert_eq!(writes.len(), 2);
        assert_eq!(
            writes[1],
            json!({"fields": {"BatteryLevel": null, "Odometer": null}})
        );
        assert_eq!(sync.fields().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unacknowledged_write_keeps_diff() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(Method::Patch, PATH, 200, json!({"response": {"updated_vehicles": 0}}));
        let sync = sync(&mock);

        assert_eq!(
            sync.add_field("BatteryLevel", None).await.unwrap(),
            SyncOutcome::Unacknowledged
        );
        assert!(sync.fields().await.is_empty());
        assert!(!sync.pending().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefer_typed() {
        let mock = Arc::new(MockTransport::new());
        acknowledge(&mock);
        let sync = sync(&mock);

        assert_eq!(sync.prefer_typed(true).await.unwrap(), SyncOutcome::Flushed);
        assert_eq!(sync.prefer_typed_setting().await, Some(true));
        assert_eq!(sync.prefer_typed(true).await.unwrap(), SyncOutcome::Unchanged);
        assert_eq!(patches(&mock), vec![json!({"prefer_typed": true})]);
    }

    #[tokio::test]
    async fn test_load() {
        let mock = Arc::new(MockTransport::new());
        mock.respond_once(
            Method::Get,
            PATH,
            200,
            json!({
                "fields": {"BatteryLevel": {"interval_seconds": 60}, "Gear": null},
                "prefer_typed": true
            }),
        );
        let sync = sync(&mock);

        sync.load().await.unwrap();
        let fields = sync.fields().await;
        assert_eq!(field_interval(&fields, "BatteryLevel"), Some(60));
        assert_eq!(fields.get("Gear"), Some(&None));
        assert_eq!(sync.prefer_typed_setting().await, Some(true));

        // Unscripted now: 404 keeps what we have
        sync.load().await.unwrap();
        assert_eq!(sync.fields().await.len(), 2);

        mock.respond(Method::Get, PATH, 500, json!({"error": "boom"}));
        assert!(matches!(
            sync.load().await,
            Err(Error::Server { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_replace_fields() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(Method::Post, PATH, 200, json!({"response": {"updated_vehicles": 1}}));
        let sync = sync(&mock);

        let mut fields = FieldTable::new();
        fields.insert("Odometer".to_string(), Some(FieldConfig::interval(300)));
        sync.replace_fields(fields).await.unwrap();

        let posted = mock.requests_with(Method::Post);
        assert_eq!(
            posted[0].body,
            Some(json!({"fields": {"Odometer": {"interval_seconds": 300}}}))
        );
        assert_eq!(field_interval(&sync.fields().await, "Odometer"), Some(300));
    }
}
