//! Line decoder for the telemetry stream
//!
//! Splits the response body into lines and decodes `data: <json>` lines into
//! events. Every other line (keepalives, comments, `event:`/`id:` fields) is
//! ignored.

use chrono::NaiveDateTime;
use serde_json::Value;
use tracing::trace;

use super::types::{DecodeError, Event};

/// Longest line kept by default (1 MiB)
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Incremental decoder over the raw bytes of a stream body
#[derive(Debug)]
pub struct LineDecoder {
    /// Bytes of the current, not yet terminated line
    buffer: Vec<u8>,
    /// Derive a millisecond `timestamp` from `createdAt`
    parse_timestamp: bool,
    max_line_bytes: usize,
    /// Dropping the rest of an oversized line up to its newline
    discarding: bool,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new(false)
    }
}

impl LineDecoder {
    pub fn new(parse_timestamp: bool) -> Self {
        Self {
            buffer: Vec::new(),
            parse_timestamp,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            discarding: false,
        }
    }

    /// Limit how many bytes a single line may hold
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Feed one chunk and decode every line it completes
    ///
    /// A line may be split across any number of chunks. Results are in wire
    /// order; a failed line does not affect the lines around it. A line longer
    /// than the limit yields one [`DecodeError::LineTooLong`] and is dropped.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<Event, DecodeError>> {
        let mut events = Vec::new();
        let mut rest = chunk;

        // Only the new bytes are scanned; the buffer never holds a newline
        while !rest.is_empty() {
            let Some(pos) = rest.iter().position(|&b| b == b'\n') else {
                self.append(rest, &mut events);
                break;
            };
            let (head, tail) = rest.split_at(pos);
            rest = &tail[1..];

            if self.discarding {
                self.discarding = false;
                continue;
            }
            if self.buffer.len() + head.len() > self.max_line_bytes {
                self.buffer.clear();
                events.push(Err(DecodeError::LineTooLong(self.max_line_bytes)));
                continue;
            }

            let decoded = if self.buffer.is_empty() {
                self.decode_line(head)
            } else {
                self.buffer.extend_from_slice(head);
                let line = std::mem::take(&mut self.buffer);
                let decoded = self.decode_line(&line);
                self.buffer = line;
                self.buffer.clear();
                decoded
            };
            if let Some(result) = decoded {
                events.push(result);
            }
        }
        events
    }

    /// Buffer the start of a line, or drop it once it outgrows the limit
    fn append(&mut self, bytes: &[u8], events: &mut Vec<Result<Event, DecodeError>>) {
        if self.discarding {
            return;
        }
        if self.buffer.len() + bytes.len() > self.max_line_bytes {
            self.buffer = Vec::new();
            self.discarding = true;
            events.push(Err(DecodeError::LineTooLong(self.max_line_bytes)));
            return;
        }
        self.buffer.extend_from_slice(bytes);
    }

    /// Decode whatever is left once the body has ended
    ///
    /// A final line without a terminating newline still counts.
    pub fn finish(&mut self) -> Option<Result<Event, DecodeError>> {
        self.discarding = false;
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        self.decode_line(&line)
    }

    /// Whether a partial line is waiting for more bytes
    pub fn has_partial(&self) -> bool {
        !self.buffer.is_empty()
    }

    fn decode_line(&self, line: &[u8]) -> Option<Result<Event, DecodeError>> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            return None;
        }

        let line = match std::str::from_utf8(line) {
            Ok(line) => line,
            Err(_) => return Some(Err(DecodeError::Utf8)),
        };

        match line.split_once(": ") {
            Some(("data", payload)) => Some(self.decode_payload(payload)),
            _ => {
                trace!(line, "Ignoring non-data line");
                None
            }
        }
    }

    fn decode_payload(&self, payload: &str) -> Result<Event, DecodeError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| DecodeError::Json(e.to_string()))?;
        let mut event = Event::from_value(value).ok_or(DecodeError::NotAnObject)?;

        if self.parse_timestamp {
            let created_at = event
                .created_at()
                .ok_or_else(|| DecodeError::Timestamp("missing createdAt".to_string()))?;
            let timestamp = parse_created_at(created_at)?;
            event.insert("timestamp", Value::from(timestamp));
        }

        Ok(event)
    }
}

/// Convert an ISO-8601 `createdAt` into milliseconds since the epoch
///
/// The whole-second part is read as UTC. Only the first three fraction digits
/// count and shorter fractions are right-padded, so `.5` is 500ms.
pub fn parse_created_at(created_at: &str) -> Result<i64, DecodeError> {
    let invalid = || DecodeError::Timestamp(created_at.to_string());

    let trimmed = created_at.trim_end_matches('Z');
    let (main, fraction) = match trimmed.split_once('.') {
        Some((main, fraction)) => (main, fraction),
        None => (trimmed, ""),
    };

    let seconds = NaiveDateTime::parse_from_str(main, "%Y-%m-%dT%H:%M:%S")
        .map_err(|_| invalid())?
        .and_utc()
        .timestamp();

    let digits: String = fraction.chars().take(3).collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let millis = if digits.is_empty() {
        0
    } else {
        format!("{:0<3}", digits).parse::<i64>().map_err(|_| invalid())?
    };

    Ok(seconds * 1000 + millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_data_line() {
        let mut decoder = LineDecoder::new(false);
        let events = decoder.feed(b"data: {\"vin\":\"X\",\"data\":{\"BatteryLevel\":42}}\n");

        assert_eq!(events.len(), 1);
        let event = events[0].as_ref().unwrap();
        assert_eq!(
            event.clone().into_value(),
            json!({"vin": "X", "data": {"BatteryLevel": 42}})
        );
        assert_eq!(event.timestamp(), None);
    }

    #[test]
    fn test_timestamp_parsing() {
        let mut decoder = LineDecoder::new(true);
        let events = decoder.feed(
            b"data: {\"vin\":\"X\",\"createdAt\":\"2024-01-01T00:00:00.123456\",\"data\":{}}\n",
        );

        let event = events[0].as_ref().unwrap();
        assert_eq!(event.timestamp(), Some(1_704_067_200_123));
    }

    #[test]
    fn test_parse_created_at() {
        assert_eq!(parse_created_at("2024-01-01T00:00:00"), Ok(1_704_067_200_000));
        assert_eq!(parse_created_at("2024-01-01T00:00:00Z"), Ok(1_704_067_200_000));
        assert_eq!(parse_created_at("2024-01-01T00:00:00.5Z"), Ok(1_704_067_200_500));
        assert_eq!(
            parse_created_at("2024-01-01T00:00:01.987654321Z"),
            Ok(1_704_067_201_987)
        );
        assert!(parse_created_at("yesterday").is_err());
        assert!(parse_created_at("2024-01-01T00:00:00.x1").is_err());
    }

    #[test]
    fn test_bad_timestamp_is_decode_error() {
        let mut decoder = LineDecoder::new(true);
        let events = decoder.feed(b"data: {\"createdAt\":\"soon\"}\ndata: {\"vin\":\"X\"}\n");

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Err(DecodeError::Timestamp(_))));
        assert!(matches!(events[1], Err(DecodeError::Timestamp(_))));
    }

    #[test]
    fn test_ignores_other_lines() {
        let mut decoder = LineDecoder::new(false);
        let events = decoder.feed(b": keepalive\nevent: update\nid: 7\n\nretry: 100\ndata\n");
        assert!(events.is_empty());
    }

    #[test]
    fn test_chunked_line() {
        let mut decoder = LineDecoder::new(false);

        assert!(decoder.feed(b"data: {\"vin\":").is_empty());
        assert!(decoder.has_partial());

        let events = decoder.feed(b"\"X\"}\r\ndata: {\"vin\":\"Y\"}\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap().vin(), Some("X"));
        assert_eq!(events[1].as_ref().unwrap().vin(), Some("Y"));
        assert!(!decoder.has_partial());
    }

    #[test]
    fn test_malformed_line_does_not_poison_neighbours() {
        let mut decoder = LineDecoder::new(false);
        let events = decoder.feed(b"data: {\"vin\":\ndata: [1,2]\ndata: {\"vin\":\"Z\"}\n");

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], Err(DecodeError::Json(_))));
        assert_eq!(events[1], Err(DecodeError::NotAnObject));
        assert_eq!(events[2].as_ref().unwrap().vin(), Some("Z"));
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut decoder = LineDecoder::new(false);
        assert!(decoder.feed(b"data: {\"vin\":\"X\"}").is_empty());

        let last = decoder.finish().unwrap().unwrap();
        assert_eq!(last.vin(), Some("X"));
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_oversized_line_is_dropped() {
        let mut decoder = LineDecoder::new(false).with_max_line_bytes(32);

        // A line that never ends is dropped once, without growing the buffer
        let chunk = [b'x'; 20];
        assert!(decoder.feed(&chunk).is_empty());
        assert_eq!(decoder.feed(&chunk), vec![Err(DecodeError::LineTooLong(32))]);
        assert!(!decoder.has_partial());
        for _ in 0..1000 {
            assert!(decoder.feed(&chunk).is_empty());
            assert!(!decoder.has_partial());
        }

        // The next line after the newline decodes normally
        let events = decoder.feed(b"xxx\ndata: {\"vin\":\"X\"}\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().vin(), Some("X"));
    }

    #[test]
    fn test_oversized_complete_line() {
        let mut decoder = LineDecoder::new(false).with_max_line_bytes(16);
        let events = decoder.feed(b"data: {\"vin\":\"0123456789\"}\ndata: {}\n");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], Err(DecodeError::LineTooLong(16)));
        assert!(events[1].is_ok());
    }

    #[test]
    fn test_invalid_utf8() {
        let mut decoder = LineDecoder::new(false);
        let events = decoder.feed(b"data: \xff\xfe\n");
        assert_eq!(events, vec![Err(DecodeError::Utf8)]);
    }
}
