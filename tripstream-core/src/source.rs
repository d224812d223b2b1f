//! Event source: newline-delimited JSON [`RawEvent`]s from any reader.

use std::io::BufRead;

use crate::events::RawEvent;

/// Reads `RawEvent`s line by line.
///
/// Lines that fail to deserialize are logged and skipped: the transport is
/// assumed durable, but individual records may be garbage and must not take
/// the pipeline down. An I/O error ends the stream.
pub struct JsonLinesSource<R> {
    reader: R,
    line_no: u64,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line_no: 0 }
    }
}

impl<R: BufRead> Iterator for JsonLinesSource<R> {
    type Item = RawEvent;

    fn next(&mut self) -> Option<RawEvent> {
        let mut line = String::new();
        loop {
            line.clear();
            self.line_no += 1;
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(%err, "event source read failed, ending stream");
                    return None;
                }
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str(trimmed) {
                Ok(event) => return Some(event),
                Err(err) => {
                    tracing::warn!(line = self.line_no, %err, "skipping undecodable event");
                }
            }
        }
    }
}
