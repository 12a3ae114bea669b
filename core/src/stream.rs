//! Decoded event streams.
//!
//! # Design
//! `EventStream` pulls bytes from a response body only when no parsed frame
//! is waiting, so memory use is bounded by one read buffer plus the frames a
//! single chunk completes. Dropping the stream drops the reader, which closes
//! the connection; there is no other cancellation handle.

use std::collections::VecDeque;
use std::io::{self, Read};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::sse::{EventStreamParser, SseFrame};

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Payload of a stream event.
///
/// Serializes as the bare JSON value or string it holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// `data` parsed as JSON.
    Json(Value),
    /// `data` that is empty or not valid JSON, passed through untouched.
    Raw(String),
}

impl Payload {
    pub fn decode(data: String) -> Self {
        if data.is_empty() {
            return Payload::Raw(data);
        }
        match serde_json::from_str(&data) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Raw(data),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            Payload::Raw(text) => Some(text),
            Payload::Json(_) => None,
        }
    }
}

/// A frame with its payload decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamEvent {
    pub event: String,
    /// `None` when the frame carried no `data:` line.
    pub data: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_ms: Option<u64>,
}

impl From<SseFrame> for StreamEvent {
    fn from(frame: SseFrame) -> Self {
        Self {
            event: frame.event,
            data: frame.data.map(Payload::decode),
            id: frame.id,
            retry_ms: frame.retry_ms,
        }
    }
}

/// Blocking iterator over the events of an open response body.
///
/// Yields events in the order the server sent them. The first error ends the
/// iteration, after every event completed before it.
pub struct EventStream {
    reader: Box<dyn Read>,
    parser: EventStreamParser,
    pending: VecDeque<SseFrame>,
    /// Raised while reading; yielded once `pending` drains.
    failure: Option<ApiError>,
    done: bool,
}

impl EventStream {
    pub fn new(reader: impl Read + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            parser: EventStreamParser::new(),
            pending: VecDeque::new(),
            failure: None,
            done: false,
        }
    }

    fn fill(&mut self) -> Result<(), ApiError> {
        let mut chunk = [0u8; READ_BUFFER_SIZE];
        loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => {
                    self.done = true;
                    if self.parser.finish() {
                        debug!("discarding unterminated event at end of stream");
                    }
                    return Ok(());
                }
                Ok(n) => {
                    return self.parser.feed(&chunk[..n], |frame| self.pending.push_back(frame));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(
                        ApiError::generic(format!("Error processing SSE stream: {e}")).with_source(e)
                    );
                }
            }
        }
    }
}

impl Iterator for EventStream {
    type Item = Result<StreamEvent, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                debug!(event = %frame.event, id = ?frame.id, "stream event");
                return Some(Ok(frame.into()));
            }
            if self.done {
                return self.failure.take().map(Err);
            }
            if let Err(err) = self.fill() {
                self.done = true;
                self.failure = Some(err);
            }
        }
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("pending", &self.pending.len())
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use serde_json::json;

    use super::*;

    /// Hands out the input a few bytes at a time, then optionally fails.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
        fail_at_end: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos >= self.data.len() {
                if self.fail_at_end {
                    return Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer reset"));
                }
                return Ok(0);
            }
            let end = (self.pos + self.step).min(self.data.len()).min(self.pos + buf.len());
            let n = end - self.pos;
            buf[..n].copy_from_slice(&self.data[self.pos..end]);
            self.pos = end;
            Ok(n)
        }
    }

    fn trickle(input: &str, step: usize, fail_at_end: bool) -> Trickle {
        Trickle {
            data: input.as_bytes().to_vec(),
            pos: 0,
            step,
            fail_at_end,
        }
    }

    #[test]
    fn decodes_json_and_passes_raw_text_through() {
        let input = "event: updates\ndata: {\"a\":1}\n\ndata: plain text\n\ndata:\n\nevent: end\n\n";
        let events: Vec<StreamEvent> = EventStream::new(Cursor::new(input))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].event, "updates");
        assert_eq!(events[0].data, Some(Payload::Json(json!({"a": 1}))));
        assert_eq!(events[0].id, None);
        assert_eq!(events[0].retry_ms, None);
        assert_eq!(events[1].data, Some(Payload::Raw("plain text".to_string())));
        assert_eq!(events[2].data, Some(Payload::Raw(String::new())));
        assert_eq!(events[3].event, "end");
        assert_eq!(events[3].data, None);
    }

    #[test]
    fn events_serialize_with_bare_payloads() {
        let event = StreamEvent {
            event: "values".to_string(),
            data: Some(Payload::Json(json!({"a": 1}))),
            id: None,
            retry_ms: None,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event": "values", "data": {"a": 1}})
        );

        let event = StreamEvent {
            event: "messages".to_string(),
            data: Some(Payload::Raw("tok".to_string())),
            id: Some("7".to_string()),
            retry_ms: Some(100),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event": "messages", "data": "tok", "id": "7", "retry_ms": 100})
        );
    }

    #[test]
    fn json_scalars_decode_as_json() {
        assert_eq!(Payload::decode("42".into()), Payload::Json(json!(42)));
        assert_eq!(Payload::decode("\"quoted\"".into()), Payload::Json(json!("quoted")));
        assert_eq!(Payload::decode("{broken".into()).as_raw(), Some("{broken"));
    }

    #[test]
    fn small_reads_yield_the_same_events() {
        let input = "id: 1\ndata: {\"n\":1}\n\nid: 2\ndata: {\"n\":2}\n\n";
        let whole: Vec<_> = EventStream::new(Cursor::new(input)).collect::<Result<_, _>>().unwrap();
        for step in 1..input.len() {
            let split: Vec<_> = EventStream::new(trickle(input, step, false))
                .collect::<Result<_, _>>()
                .unwrap();
            assert_eq!(split, whole, "step {step}");
        }
    }

    #[test]
    fn io_error_ends_stream_after_delivered_events() {
        let mut stream = EventStream::new(trickle("data: one\n\ndata: tw", 4, true));
        let first = stream.next().unwrap().unwrap();
        assert_eq!(first.data, Some(Payload::Raw("one".to_string())));
        let err = stream.next().unwrap().unwrap_err();
        assert!(err.message().starts_with("Error processing SSE stream"));
        assert!(err.status_code().is_none());
        assert!(stream.next().is_none());
    }

    #[test]
    fn malformed_utf8_is_reported() {
        let mut stream = EventStream::new(Cursor::new(b"data: \xc3\x28\n\n".to_vec()));
        let err = stream.next().unwrap().unwrap_err();
        assert!(err.message().starts_with("Malformed event stream"));
        assert!(stream.next().is_none());
    }

    #[test]
    fn events_before_malformed_line_in_same_chunk_are_delivered() {
        let mut stream = EventStream::new(Cursor::new(b"data: good\n\ndata: \xff\n\n".to_vec()));
        let first = stream.next().unwrap().unwrap();
        assert_eq!(first.data, Some(Payload::Raw("good".to_string())));
        let err = stream.next().unwrap().unwrap_err();
        assert!(err.message().starts_with("Malformed event stream"));
        assert!(stream.next().is_none());
    }

    #[test]
    fn unterminated_trailing_event_is_dropped() {
        let events: Vec<_> = EventStream::new(Cursor::new("data: a\n\ndata: b"))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(events.len(), 1);
    }
}
