//! Auto-reconnecting event stream
//!
//! [`ReconnectingStream`] owns the connection to the streaming server and
//! turns it into an endless sequence of [`Event`]s. Connection failures,
//! read timeouts and server-side closes are retried with exponential backoff;
//! only a stop request (or a vehicle that is not configured for streaming)
//! ends the sequence.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tracing::{debug, error, info, warn};

use super::backoff::Backoff;
use super::control::StreamControl;
use super::endpoint::Endpoint;
use super::parser::LineDecoder;
use super::types::{DecodeError, Event, StreamError, StreamResult, StreamState};
use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::transport::{ByteStream, Transport, TransportError};
use url::Url;

/// Outcome of one [`ReconnectingStream::step`]
#[derive(Debug)]
pub enum Step {
    /// The next decoded event
    Event(Event),
    /// The connection failed; the backoff delay has already been waited out
    Retry { delay: Duration },
    /// Stopped; no further connection attempts
    Closed,
}

/// An open response body with its decode state
struct Connection {
    body: ByteStream,
    decoder: LineDecoder,
    pending: VecDeque<std::result::Result<Event, DecodeError>>,
    finished: bool,
}

impl Connection {
    fn new(body: ByteStream, decoder: LineDecoder) -> Self {
        Self {
            body,
            decoder,
            pending: VecDeque::new(),
            finished: false,
        }
    }
}

/// Restartable telemetry event stream
pub struct ReconnectingStream {
    transport: Arc<dyn Transport>,
    endpoint: Endpoint,
    control: StreamControl,
    backoff: Backoff,
    connection: Option<Connection>,
    state: StreamState,
    read_timeout: Duration,
}

impl ReconnectingStream {
    /// Create a stream with its own run/stop flag
    pub fn new(config: StreamConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let endpoint = Endpoint::new(Arc::new(config))?;
        Ok(Self::from_parts(transport, endpoint, StreamControl::new()))
    }

    pub(crate) fn from_parts(
        transport: Arc<dyn Transport>,
        endpoint: Endpoint,
        control: StreamControl,
    ) -> Self {
        let config = endpoint.config();
        let backoff = Backoff::from_config(&config.reconnect);
        let read_timeout = config.read_timeout();
        Self {
            transport,
            endpoint,
            control,
            backoff,
            connection: None,
            state: StreamState::Idle,
            read_timeout,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// The flag that stops this stream
    pub fn control(&self) -> &StreamControl {
        &self.control
    }

    /// Delay the next failure will wait before reconnecting
    pub fn backoff_delay(&self) -> Duration {
        self.backoff.current()
    }

    /// Mark the stream active and open a connection now
    ///
    /// Unlike the implicit connect inside [`Self::step`], errors are returned
    /// to the caller and no backoff is applied. Discovery failures come back
    /// as the error the metadata request produced.
    pub async fn connect(&mut self) -> Result<()> {
        self.control.activate();
        if !self.begin() {
            return Err(Error::Transport(TransportError::ConnectionFailed(
                "stream stopped".to_string(),
            )));
        }
        let url = match Self::stream_target(&self.endpoint, self.transport.as_ref()).await {
            Ok(url) => url,
            Err(e) => {
                self.state = StreamState::Idle;
                return Err(e);
            }
        };
        self.open_url(&url).await.map_err(|e| match e {
            StreamError::NotConfigured(vin) => Error::NotConfigured(vin),
            StreamError::Connection(e) => Error::Transport(e),
            other => Error::Transport(TransportError::ConnectionFailed(other.to_string())),
        })
    }

    async fn open(&mut self) -> StreamResult<()> {
        if !self.begin() {
            return Err(StreamError::Stopped);
        }
        let url = Self::stream_target(&self.endpoint, self.transport.as_ref())
            .await
            .map_err(|e| StreamError::Discovery(e.to_string()))?;
        self.open_url(&url).await
    }

    /// Drop any old connection and enter `Connecting`; false once stopped
    fn begin(&mut self) -> bool {
        if !self.control.start() {
            return false;
        }
        self.close();
        self.state = StreamState::Connecting;
        true
    }

    /// Stream URL, discovering the server first if needed
    async fn stream_target(endpoint: &Endpoint, transport: &dyn Transport) -> Result<Url> {
        let server = endpoint.resolve(transport).await?;
        endpoint.stream_url(&server)
    }

    async fn open_url(&mut self, url: &Url) -> StreamResult<()> {
        debug!(url = %url, "Connecting");
        let opened = tokio::select! {
            result = tokio::time::timeout(self.read_timeout, self.transport.open_stream(url)) => result,
            _ = self.control.stopped() => return Err(StreamError::Stopped),
        };

        let body = match opened {
            Ok(Ok(body)) => body,
            Ok(Err(TransportError::Status { status: 404, .. })) if self.endpoint.vin().is_some() => {
                let vin = self.endpoint.vin().unwrap_or_default().to_string();
                return Err(StreamError::NotConfigured(vin));
            }
            Ok(Err(e)) => return Err(StreamError::Connection(e)),
            Err(_) => {
                return Err(StreamError::Connection(TransportError::Timeout(format!(
                    "no response from {} within {:?}",
                    url, self.read_timeout
                ))))
            }
        };

        info!(url = %url, "Connected to telemetry stream");
        let config = self.endpoint.config();
        let decoder =
            LineDecoder::new(config.parse_timestamp).with_max_line_bytes(config.max_line_bytes);
        self.connection = Some(Connection::new(body, decoder));
        self.state = StreamState::Active;
        Ok(())
    }

    /// Release the connection if one is open
    pub fn close(&mut self) {
        if self.connection.take().is_some() {
            debug!("Disconnecting from telemetry stream");
            if self.state == StreamState::Active {
                self.state = StreamState::Idle;
            }
        }
    }

    /// Advance the state machine by one step
    ///
    /// Connects if needed, then reads until an event decodes. Failures close
    /// the connection and wait out the backoff delay before returning
    /// [`Step::Retry`]; the following call reconnects.
    pub async fn step(&mut self) -> Step {
        if self.control.is_stopped() {
            return self.shut_down();
        }

        if self.connection.is_none() {
            if let Err(e) = self.open().await {
                return self.recover(e).await;
            }
        }

        match self.read_event().await {
            Ok(event) => {
                self.backoff.reset();
                Step::Event(event)
            }
            Err(e) => self.recover(e).await,
        }
    }

    /// Next event, or `None` once the stream is stopped
    pub async fn next_event(&mut self) -> Option<Event> {
        loop {
            match self.step().await {
                Step::Event(event) => return Some(event),
                Step::Retry { .. } => continue,
                Step::Closed => return None,
            }
        }
    }

    /// Adapt into a [`Stream`] of events
    pub fn into_stream(self) -> impl Stream<Item = Event> + Send {
        futures::stream::unfold(self, |mut stream| async move {
            stream.next_event().await.map(|event| (event, stream))
        })
    }

    fn shut_down(&mut self) -> Step {
        self.close();
        self.state = StreamState::Closed;
        Step::Closed
    }

    async fn recover(&mut self, error: StreamError) -> Step {
        self.close();

        match error {
            StreamError::Stopped => self.shut_down(),
            StreamError::NotConfigured(vin) => {
                error!(vin = %vin, "Vehicle is not configured for streaming");
                self.control.stop();
                self.shut_down()
            }
            error => {
                warn!(error = %error, "Connection error");
                self.state = StreamState::Erroring;
                let delay = self.backoff.next_delay();
                debug!(?delay, "Reconnecting");
                if self.control.sleep(delay).await {
                    Step::Retry { delay }
                } else {
                    self.shut_down()
                }
            }
        }
    }

    /// Read until one line decodes to an event
    ///
    /// Lines that fail to decode are logged and skipped; the connection
    /// stays up.
    async fn read_event(&mut self) -> StreamResult<Event> {
        let read_timeout = self.read_timeout;

        loop {
            let connection = self.connection.as_mut().ok_or(StreamError::Ended)?;

            if let Some(decoded) = connection.pending.pop_front() {
                match decoded {
                    Ok(event) => return Ok(event),
                    Err(e) => {
                        warn!(error = %e, "Skipping malformed stream line");
                        continue;
                    }
                }
            }
            if connection.finished {
                return Err(StreamError::Ended);
            }

            let chunk = tokio::select! {
                chunk = tokio::time::timeout(read_timeout, connection.body.next()) => chunk,
                _ = self.control.stopped() => return Err(StreamError::Stopped),
            };

            match chunk {
                Ok(Some(Ok(bytes))) => {
                    let decoded = connection.decoder.feed(&bytes);
                    connection.pending.extend(decoded);
                }
                Ok(Some(Err(e))) => return Err(StreamError::Connection(e)),
                Ok(None) => {
                    connection.finished = true;
                    if let Some(last) = connection.decoder.finish() {
                        connection.pending.push_back(last);
                    }
                }
                Err(_) => {
                    return Err(StreamError::Connection(TransportError::Timeout(format!(
                        "no data for {:?}",
                        read_timeout
                    ))))
                }
            }
        }
    }
}

impl std::fmt::Debug for ReconnectingStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconnectingStream")
            .field("state", &self.state)
            .field("connected", &self.connection.is_some())
            .field("active", &self.control.state())
            .finish()
    }
}
