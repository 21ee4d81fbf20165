//! Incremental decoder for newline-delimited JSON bodies.
//!
//! Bytes arrive in arbitrary chunks. A chunk may end in the middle of a UTF-8
//! code point or in the middle of a JSON token, so both the byte-to-text step
//! and the text-to-line step carry state across calls to [`NdjsonDecoder::push`].

use serde_json::Value;

use crate::models::StreamEvent;

/// Outcome of decoding one complete line.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedLine {
    Event(StreamEvent),
    /// The line was not valid JSON, or was JSON that does not fit the event union.
    Malformed { line: String, error: String },
}

/// Splits a byte stream into complete lines and parses each one.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    utf8: Utf8Carry,
    buffer: String,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return the complete, non-blank lines it finished.
    pub fn push_lines(&mut self, chunk: &[u8]) -> Vec<String> {
        self.utf8.decode_into(chunk, &mut self.buffer);

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };

        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);

        complete
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Feed one chunk and parse every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<DecodedLine> {
        self.push_lines(chunk)
            .into_iter()
            .map(|line| match parse_line(&line) {
                Ok(event) => DecodedLine::Event(event),
                Err(error) => DecodedLine::Malformed { line, error },
            })
            .collect()
    }

    /// Text received after the last newline, not yet parsed.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// End of stream. Returns the unterminated tail, which is never parsed.
    pub fn finish(self) -> Option<String> {
        let mut tail = self.buffer;
        if self.utf8.has_partial() {
            tail.push(char::REPLACEMENT_CHARACTER);
        }
        if tail.is_empty() { None } else { Some(tail) }
    }
}

fn parse_line(line: &str) -> Result<StreamEvent, String> {
    let value: Value = serde_json::from_str(line).map_err(|e| e.to_string())?;
    StreamEvent::from_value(value).map_err(|e| e.to_string())
}

/// Bytes of a code point split across chunk boundaries.
#[derive(Debug, Default)]
struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    fn has_partial(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Decode as much of `pending + chunk` as possible into `out`.
    ///
    /// Invalid sequences become U+FFFD; a truncated sequence at the end is kept
    /// for the next call.
    fn decode_into(&mut self, chunk: &[u8], out: &mut String) {
        self.pending.extend_from_slice(chunk);
        let bytes = std::mem::take(&mut self.pending);
        let mut input = bytes.as_slice();

        loop {
            match std::str::from_utf8(input) {
                Ok(valid) => {
                    out.push_str(valid);
                    return;
                }
                Err(err) => {
                    let (valid, after) = input.split_at(err.valid_up_to());
                    // valid_up_to guarantees this prefix is well-formed
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());

                    match err.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            input = &after[bad..];
                        }
                        None => {
                            self.pending.extend_from_slice(after);
                            return;
                        }
                    }
                }
            }
        }
    }
}
