//! Mock transport for testing
//!
//! API responses are scripted per method and path; streams are scripted as a
//! queue consumed one entry per connection attempt.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::Instant;
use url::Url;

use super::{ApiRequest, ApiResponse, ByteStream, Method, Transport, TransportError};

type Chunk = Result<Bytes, TransportError>;

/// What the next `open_stream` call produces
pub enum MockStream {
    /// The connection attempt fails
    Fail(TransportError),
    /// Each line is delivered as one chunk, then the body ends
    Lines(Vec<String>),
    /// Chunks are pushed by a [`LiveFeed`]; the body ends when it is dropped
    Live(mpsc::UnboundedReceiver<Chunk>),
    /// The body never yields anything
    Silent,
}

impl MockStream {
    /// A live stream and the feed that drives it
    pub fn live() -> (Self, LiveFeed) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::Live(rx), LiveFeed { tx })
    }

    /// A finite stream of `data:` lines built from JSON events
    pub fn events(events: &[Value]) -> Self {
        Self::Lines(events.iter().map(|e| format!("data: {}", e)).collect())
    }
}

/// Sender side of a [`MockStream::Live`] body
#[derive(Clone)]
pub struct LiveFeed {
    tx: mpsc::UnboundedSender<Chunk>,
}

impl LiveFeed {
    /// Push one raw line; returns false once the reader is gone
    pub fn send_line(&self, line: &str) -> bool {
        self.tx.send(Ok(Bytes::from(format!("{}\n", line)))).is_ok()
    }

    /// Push a `data:` line carrying `event`
    pub fn send_event(&self, event: &Value) -> bool {
        self.send_line(&format!("data: {}", event))
    }

    /// Push raw bytes without framing
    pub fn send_raw(&self, bytes: &'static [u8]) -> bool {
        self.tx.send(Ok(Bytes::from_static(bytes))).is_ok()
    }

    /// Make the next read fail
    pub fn fail(&self, error: TransportError) -> bool {
        self.tx.send(Err(error)).is_ok()
    }

    /// Whether the reading side still holds the body
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Scriptable [`Transport`] that records everything it is asked to do
#[derive(Default)]
pub struct MockTransport {
    sticky: Mutex<HashMap<(Method, String), ApiResponse>>,
    queued: Mutex<HashMap<(Method, String), VecDeque<(ApiResponse, Duration)>>>,
    requests: Mutex<Vec<ApiRequest>>,
    streams: Mutex<VecDeque<MockStream>>,
    stream_opens: Mutex<Vec<(Instant, Url)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every `method path` request with `status` and `body`
    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.sticky
            .lock()
            .insert((method, path.to_string()), ApiResponse::new(status, body));
    }

    /// Answer the next `method path` request with `status` and `body`, ahead of any
    /// sticky response
    pub fn respond_once(&self, method: Method, path: &str, status: u16, body: Value) {
        self.respond_delayed(method, path, Duration::ZERO, status, body);
    }

    /// Like [`Self::respond_once`], but the answer takes `delay` to arrive
    pub fn respond_delayed(
        &self,
        method: Method,
        path: &str,
        delay: Duration,
        status: u16,
        body: Value,
    ) {
        self.queued
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back((ApiResponse::new(status, body), delay));
    }

    /// Queue the outcome of the next connection attempt
    pub fn push_stream(&self, stream: MockStream) {
        self.streams.lock().push_back(stream);
    }

    /// All API requests seen so far
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    /// API requests with the given method
    pub fn requests_with(&self, method: Method) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method)
            .cloned()
            .collect()
    }

    /// Connection attempts with the (tokio) instant they happened at
    pub fn stream_opens(&self) -> Vec<(Instant, Url)> {
        self.stream_opens.lock().clone()
    }

    fn lookup(&self, method: Method, path: &str) -> (ApiResponse, Duration) {
        let key = (method, path.to_string());
        if let Some(queued) = self.queued.lock().get_mut(&key).and_then(|q| q.pop_front()) {
            return queued;
        }
        let response = self
            .sticky
            .lock()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| ApiResponse::new(404, json!({"error": "not_found"})));
        (response, Duration::ZERO)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let (response, delay) = self.lookup(request.method, request.url.path());
        self.requests.lock().push(request);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(response)
    }

    async fn open_stream(&self, url: &Url) -> Result<ByteStream, TransportError> {
        self.stream_opens.lock().push((Instant::now(), url.clone()));

        let next = self.streams.lock().pop_front();
        match next {
            None => Err(TransportError::ConnectionFailed(
                "no scripted stream".to_string(),
            )),
            Some(MockStream::Fail(e)) => Err(e),
            Some(MockStream::Lines(lines)) => {
                let chunks: Vec<Chunk> = lines
                    .into_iter()
                    .map(|line| Ok(Bytes::from(format!("{}\n", line))))
                    .collect();
                Ok(Box::pin(futures::stream::iter(chunks)))
            }
            Some(MockStream::Live(rx)) => Ok(Box::pin(futures::stream::unfold(
                rx,
                |mut rx| async move { rx.recv().await.map(|chunk| (chunk, rx)) },
            ))),
            Some(MockStream::Silent) => Ok(Box::pin(futures::stream::pending())),
        }
    }
}
