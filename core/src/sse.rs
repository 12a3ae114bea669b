//! Incremental `text/event-stream` parser.
//!
//! # Design
//! The parser owns a byte buffer of input that has not yet formed a complete
//! line, plus the fields of the frame under construction. `feed` accepts any
//! chunking of the stream: a line is only interpreted once its terminator
//! has arrived, and UTF-8 is validated per complete line, so multi-byte
//! characters split across chunks are fine. Output depends only on the
//! concatenated input.

use bytes::{Buf, BytesMut};

use crate::error::ApiError;

const LF: u8 = b'\n';
const CR: u8 = b'\r';
const BOM: &[u8] = "\u{feff}".as_bytes();
const DEFAULT_EVENT: &str = "message";

/// One dispatched frame, before payload decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// `event:` value, `"message"` when the frame had none.
    pub event: String,
    /// `data:` lines joined by `\n`; `None` when the frame had no data line.
    pub data: Option<String>,
    pub id: Option<String>,
    /// Reconnection hint in milliseconds.
    pub retry_ms: Option<u64>,
}

#[derive(Debug, Default)]
struct FrameBuilder {
    event: Option<String>,
    data: Option<String>,
    id: Option<String>,
    retry_ms: Option<u64>,
    touched: bool,
}

impl FrameBuilder {
    fn apply(&mut self, name: &str, value: &str) {
        match name {
            "event" => self.event = Some(value.to_string()),
            "data" => match &mut self.data {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            },
            "id" => {
                if !value.contains('\0') {
                    self.id = Some(value.to_string());
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    // Digits only, so parse fails only on overflow.
                    if let Ok(ms) = value.parse() {
                        self.retry_ms = Some(ms);
                    }
                }
            }
            _ => return,
        }
        self.touched = true;
    }

    fn take(&mut self) -> Option<SseFrame> {
        let builder = std::mem::take(self);
        if !builder.touched {
            return None;
        }
        Some(SseFrame {
            event: builder
                .event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data: builder.data,
            id: builder.id,
            retry_ms: builder.retry_ms,
        })
    }
}

/// Stateful event-stream reassembler.
#[derive(Debug, Default)]
pub struct EventStreamParser {
    buffer: BytesMut,
    frame: FrameBuilder,
    started: bool,
}

impl EventStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk and call `emit` for every frame it completes, in order.
    ///
    /// Fails on a line that is not valid UTF-8. Frames emitted before the bad
    /// line have already been delivered.
    pub fn feed<F>(&mut self, chunk: &[u8], mut emit: F) -> Result<(), ApiError>
    where
        F: FnMut(SseFrame),
    {
        self.buffer.extend_from_slice(chunk);

        if !self.started {
            if self.buffer.len() < BOM.len() && BOM.starts_with(&self.buffer) {
                return Ok(());
            }
            if self.buffer.starts_with(BOM) {
                self.buffer.advance(BOM.len());
            }
            self.started = true;
        }

        while let Some((line_end, next_start)) = find_eol(&self.buffer) {
            let line = self.buffer.split_to(line_end).freeze();
            self.buffer.advance(next_start - line_end);

            let line = std::str::from_utf8(&line).map_err(|e| {
                ApiError::generic(format!("Malformed event stream: {e}")).with_source(e)
            })?;

            if line.is_empty() {
                if let Some(frame) = self.frame.take() {
                    emit(frame);
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }
            let (name, value) = match line.split_once(':') {
                Some((name, value)) => (name, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            self.frame.apply(name, value);
        }
        Ok(())
    }

    /// Signal end of input. A frame without its terminating blank line is
    /// discarded; returns `true` if anything was dropped.
    pub fn finish(&mut self) -> bool {
        let had_partial_line = !self.buffer.is_empty();
        self.buffer.clear();
        let had_frame = self.frame.take().is_some();
        had_partial_line || had_frame
    }
}

/// Locate the next line terminator.
///
/// Returns `(line_end, next_line_start)`, or `None` when no complete line is
/// buffered. A CR at the very end of the buffer is held back until we know
/// whether an LF follows.
fn find_eol(bytes: &[u8]) -> Option<(usize, usize)> {
    let pos = memchr::memchr2(CR, LF, bytes)?;
    match bytes[pos] {
        LF => Some((pos, pos + 1)),
        _ => match bytes.get(pos + 1) {
            None => None,
            Some(&LF) => Some((pos, pos + 2)),
            Some(_) => Some((pos, pos + 1)),
        },
    }
}
