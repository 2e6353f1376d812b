//! Test utilities for teslemetry-stream
//!
//! [`MockServer`] is a small in-process telemetry service: it serves the
//! metadata and vehicle configuration endpoints and an SSE stream that tests
//! push events into.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::config::{StreamConfig, StreamConfigBuilder};
use crate::error::Result;
use crate::sync::deep_merge;

/// A request the mock server received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
enum Frame {
    Data(String),
    Close,
}

struct MockState {
    region: Mutex<String>,
    configs: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<RecordedRequest>>,
    write_status: AtomicU16,
    connections: AtomicUsize,
    frames: broadcast::Sender<Frame>,
}

impl MockState {
    fn record(&self, method: &str, path: String, headers: &HeaderMap, body: Option<Value>) {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        self.requests.lock().push(RecordedRequest {
            method: method.to_string(),
            path,
            authorization,
            body,
        });
    }

    /// Status for the next configuration write, if it should fail
    fn write_failure(&self) -> Option<StatusCode> {
        let status = self.write_status.load(Ordering::SeqCst);
        if (200..300).contains(&status) {
            return None;
        }
        StatusCode::from_u16(status).ok()
    }
}

/// A telemetry service that automatically shuts down when dropped
pub struct MockServer {
    pub addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl MockServer {
    /// Bind to an ephemeral port and start serving
    ///
    /// # Example
    ///
    /// ```ignore
    /// use teslemetry_stream::testing::MockServer;
    /// use teslemetry_stream::TeslemetryStream;
    ///
    /// let server = MockServer::start().await?;
    /// let stream = TeslemetryStream::new(server.config_builder("token").vin("VIN1").build())?;
    /// ```
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (frames, _) = broadcast::channel(256);
        let state = Arc::new(MockState {
            region: Mutex::new("NA".to_string()),
            configs: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            write_status: AtomicU16::new(200),
            connections: AtomicUsize::new(0),
            frames,
        });

        let router = Router::new()
            .route("/api/metadata", get(metadata))
            .route(
                "/api/config/{vin}",
                get(get_config).patch(patch_config).post(post_config),
            )
            .route("/sse", get(fleet_stream))
            .route("/sse/{vin}", get(vehicle_stream))
            .with_state(state.clone());

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        Ok(Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL of the mock server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// REST API base to configure clients with
    pub fn api_base(&self) -> String {
        format!("{}/api", self.base_url())
    }

    /// A configuration builder pointed at this server
    pub fn config_builder(&self, access_token: &str) -> StreamConfigBuilder {
        StreamConfig::builder(access_token)
            .server(self.base_url())
            .api_base(self.api_base())
            .allowed_domain(None)
    }

    /// Region reported by the metadata endpoint
    pub fn set_region(&self, region: &str) {
        *self.state.region.lock() = region.to_string();
    }

    /// Seed the stored configuration of a vehicle
    pub fn set_config(&self, vin: &str, config: Value) {
        self.state.configs.lock().insert(vin.to_string(), config);
    }

    /// Stored configuration of a vehicle
    pub fn config(&self, vin: &str) -> Option<Value> {
        self.state.configs.lock().get(vin).cloned()
    }

    /// Answer configuration writes with `status` (2xx restores normal operation)
    pub fn set_write_status(&self, status: u16) {
        self.state.write_status.store(status, Ordering::SeqCst);
    }

    /// Every request received so far, streams included
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    /// Requests with the given method
    pub fn requests_with(&self, method: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    /// Number of stream connections accepted so far
    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    /// Number of streams currently attached
    pub fn subscribers(&self) -> usize {
        self.state.frames.receiver_count()
    }

    /// Send an event to every attached stream; returns how many received it
    pub fn send_event(&self, event: &Value) -> usize {
        self.send_data(&event.to_string())
    }

    /// Send a raw `data:` payload, which need not be valid JSON
    pub fn send_data(&self, data: &str) -> usize {
        self.state
            .frames
            .send(Frame::Data(data.to_string()))
            .unwrap_or(0)
    }

    /// End every attached stream, as a server restart would
    pub fn close_streams(&self) -> usize {
        self.state.frames.send(Frame::Close).unwrap_or(0)
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        // Open SSE responses would hold a graceful shutdown forever
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn metadata(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Json<Value> {
    state.record("GET", "/api/metadata".to_string(), &headers, None);
    let region = state.region.lock().clone();
    Json(json!({ "uid": "mock", "region": region }))
}

async fn get_config(
    State(state): State<Arc<MockState>>,
    Path(vin): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.record("GET", format!("/api/config/{}", vin), &headers, None);
    match state.configs.lock().get(&vin) {
        Some(config) => (StatusCode::OK, Json(config.clone())),
        None => (StatusCode::NOT_FOUND, Json(json!({ "error": "not_found" }))),
    }
}

async fn patch_config(
    State(state): State<Arc<MockState>>,
    Path(vin): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.record("PATCH", format!("/api/config/{}", vin), &headers, Some(body.clone()));
    if let Some(status) = state.write_failure() {
        return (status, Json(json!({ "error": "write rejected" })));
    }

    let mut configs = state.configs.lock();
    let config = configs.entry(vin).or_insert_with(|| json!({}));
    if let (Value::Object(target), Value::Object(diff)) = (config, body) {
        deep_merge(target, diff);
    }
    (StatusCode::OK, Json(json!({ "response": { "updated_vehicles": 1 } })))
}

async fn post_config(
    State(state): State<Arc<MockState>>,
    Path(vin): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.record("POST", format!("/api/config/{}", vin), &headers, Some(body.clone()));
    if let Some(status) = state.write_failure() {
        return (status, Json(json!({ "error": "write rejected" })));
    }

    state.configs.lock().insert(vin, body);
    (StatusCode::OK, Json(json!({ "response": { "updated_vehicles": 1 } })))
}

async fn fleet_stream(State(state): State<Arc<MockState>>, headers: HeaderMap) -> impl IntoResponse {
    state.record("GET", "/sse".to_string(), &headers, None);
    event_stream(&state)
}

async fn vehicle_stream(
    State(state): State<Arc<MockState>>,
    Path(vin): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.record("GET", format!("/sse/{}", vin), &headers, None);
    event_stream(&state)
}

fn event_stream(
    state: &MockState,
) -> Sse<impl futures::Stream<Item = std::result::Result<SseEvent, Infallible>>> {
    state.connections.fetch_add(1, Ordering::SeqCst);

    let stream = BroadcastStream::new(state.frames.subscribe())
        .take_while(|frame| !matches!(frame, Ok(Frame::Close)))
        .filter_map(|frame| match frame {
            Ok(Frame::Data(data)) => Some(Ok(SseEvent::default().data(data))),
            // Skip lagged messages
            _ => None,
        });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Wait for a condition with timeout
pub async fn wait_for<F, Fut>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;

    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_base_url_format() {
        let server = MockServer::start().await.unwrap();
        assert!(server.base_url().starts_with("http://127.0.0.1:"));
        assert_eq!(server.api_base(), format!("{}/api", server.base_url()));

        let config = server.config_builder("token").build();
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_send_without_subscribers() {
        let server = MockServer::start().await.unwrap();
        assert_eq!(server.subscribers(), 0);
        assert_eq!(server.send_event(&json!({"vin": "VIN1"})), 0);
    }
}
