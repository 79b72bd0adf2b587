//! Incremental Server-Sent-Events decoding.
//!
//! Feeds on raw response chunks and yields complete events. Only the `data`
//! field matters to the gateway stream protocol — each event's data payload
//! is one JSON envelope — so `event`/`id`/`retry` fields are consumed and
//! ignored, as are comment lines (the usual keep-alive ping).

use std::collections::VecDeque;

use bytes::BytesMut;

/// One decoded event: the joined `data` payload.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct SseEvent {
    pub data: String,
}

/// Push-based SSE frame decoder.
///
/// Bytes go in via [`push`](Self::push); complete events come out via
/// [`next_event`](Self::next_event). An event is dispatched at its blank
/// line; a partial event at end of input is discarded, per the SSE
/// processing model.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buf: BytesMut,
    data_lines: Vec<String>,
    events: VecDeque<SseEvent>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes from the transport.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.scan();
    }

    /// Pop the next complete event, if any.
    pub fn next_event(&mut self) -> Option<SseEvent> {
        self.events.pop_front()
    }

    fn scan(&mut self) {
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let raw = self.buf.split_to(pos + 1);
            let mut line = &raw[..raw.len() - 1];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            let line = String::from_utf8_lossy(line).into_owned();
            self.process_line(&line);
        }
    }

    fn process_line(&mut self, line: &str) {
        if line.is_empty() {
            // Event boundary. A boundary without accumulated data is a no-op.
            if !self.data_lines.is_empty() {
                self.events.push_back(SseEvent {
                    data: self.data_lines.join("\n"),
                });
                self.data_lines.clear();
            }
            return;
        }
        if line.starts_with(':') {
            return; // comment / keep-alive
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data_lines.push(value.to_string());
        }
    }
}
