//! Line-oriented event decoding for the host -> plugin direction.

use crate::protocol::{Event, ProtocolError, PROTOCOL_VERSION};
use serde_json::Value;
use std::io::BufRead;

/// What a single input line decoded to.
#[derive(Debug)]
pub enum DecodedLine {
    /// Empty or whitespace-only.
    Blank,
    /// Not something the runtime can use; skipped.
    Malformed(ProtocolError),
    Event(Event),
}

/// Decode one raw line (with or without its trailing newline).
///
/// Objects without a string `event` field decode to [`Event::Unknown`] so that
/// they are ignored like any other unrecognized kind.
pub fn decode_line(raw: &[u8]) -> DecodedLine {
    let Ok(text) = std::str::from_utf8(raw) else {
        return DecodedLine::Malformed(ProtocolError::InvalidUtf8);
    };
    let text = text.trim();
    if text.is_empty() {
        return DecodedLine::Blank;
    }

    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => return DecodedLine::Malformed(ProtocolError::Json(err)),
    };
    let Some(object) = value.as_object() else {
        return DecodedLine::Malformed(ProtocolError::NotAnObject);
    };

    if let Some(version) = object.get("v") {
        if version.as_u64() != Some(u64::from(PROTOCOL_VERSION)) {
            tracing::warn!(%version, "event carries an unsupported protocol version");
        }
    }
    if !object.get("event").is_some_and(Value::is_string) {
        return DecodedLine::Event(Event::Unknown);
    }

    match serde_json::from_value(value) {
        Ok(event) => DecodedLine::Event(event),
        Err(err) => DecodedLine::Malformed(ProtocolError::EventShape(err)),
    }
}

/// Reads events one line at a time, skipping blank and malformed lines.
pub struct EventReader<R> {
    input: R,
    buf: Vec<u8>,
    lines: u64,
    blank_lines: u64,
    malformed_lines: u64,
}

impl<R: BufRead> EventReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            buf: Vec::new(),
            lines: 0,
            blank_lines: 0,
            malformed_lines: 0,
        }
    }

    /// Block until the next usable event. Returns `Ok(None)` at end of input.
    pub fn next_event(&mut self) -> Result<Option<Event>, ProtocolError> {
        loop {
            self.buf.clear();
            let read = self
                .input
                .read_until(b'\n', &mut self.buf)
                .map_err(ProtocolError::Read)?;
            if read == 0 {
                return Ok(None);
            }
            self.lines += 1;

            match decode_line(&self.buf) {
                DecodedLine::Event(event) => return Ok(Some(event)),
                DecodedLine::Blank => self.blank_lines += 1,
                DecodedLine::Malformed(err) => {
                    self.malformed_lines += 1;
                    tracing::debug!(line = self.lines, error = %err, "skipping malformed input line");
                }
            }
        }
    }

    /// Lines consumed so far, including skipped ones.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    pub fn blank_lines(&self) -> u64 {
        self.blank_lines
    }

    pub fn malformed_lines(&self) -> u64 {
        self.malformed_lines
    }
}
