//! Result sinks.
//!
//! The pipeline hands every qualifying aggregate to a sink exactly once and
//! treats a sink error as fatal for the run; retries and durability live in
//! the external delivery layer.

use std::fmt::Display;
use std::io::Write;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use serde::Serialize;

/// Consumes emitted aggregate records.
pub trait Sink<T>: Send {
    /// Hand one record to the sink.
    fn publish(&mut self, record: T) -> Result<()>;

    /// Push any buffered records out. Called once at shutdown.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Buffered delivery-stream sink: records are formatted as text lines and
/// written out in batches.
pub struct DeliveryStreamSink<T, W> {
    writer: W,
    buffer: Vec<String>,
    batch_size: usize,
    _phantom: PhantomData<T>,
}

impl<T, W: Write> DeliveryStreamSink<T, W> {
    pub fn new(writer: W, batch_size: usize) -> Self {
        Self {
            writer,
            buffer: Vec::with_capacity(batch_size),
            batch_size,
            _phantom: PhantomData,
        }
    }
}

impl<T, W> Sink<T> for DeliveryStreamSink<T, W>
where
    T: Display + Send,
    W: Write + Send,
{
    fn publish(&mut self, record: T) -> Result<()> {
        self.buffer.push(record.to_string());
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        for line in self.buffer.drain(..) {
            writeln!(self.writer, "{line}")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Analytics-store sink: records are written as JSON lines.
pub struct AnalyticsSink<W> {
    writer: W,
}

impl<W: Write> AnalyticsSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<T, W> Sink<T> for AnalyticsSink<W>
where
    T: Serialize + Send,
    W: Write + Send,
{
    fn publish(&mut self, record: T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// In-memory sink that collects records behind a shared handle.
///
/// Intended for tests and embedding; the handle stays readable after the
/// pipeline has consumed the sink itself.
pub struct VecSink<T> {
    records: Arc<Mutex<Vec<T>>>,
}

impl<T> VecSink<T> {
    pub fn new() -> (Self, Arc<Mutex<Vec<T>>>) {
        let records = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                records: Arc::clone(&records),
            },
            records,
        )
    }
}

impl<T: Send> Sink<T> for VecSink<T> {
    fn publish(&mut self, record: T) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow!("result store poisoned"))?
            .push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::PickupCount;

    fn result(count: u64) -> PickupCount {
        PickupCount {
            position: "dr5reg".to_string(),
            pickup_count: count,
            window_end: 599_999,
        }
    }

    #[test]
    fn test_delivery_stream_sink_holds_partial_batch() {
        let mut out = Vec::new();
        {
            let mut sink = DeliveryStreamSink::new(&mut out, 2);
            sink.publish(result(2)).unwrap();
        }
        // Below the batch size and never flushed: nothing written.
        assert!(out.is_empty());
    }

    #[test]
    fn test_delivery_stream_sink_writes_full_batch() {
        let mut out = Vec::new();
        let mut sink = DeliveryStreamSink::new(&mut out, 2);
        sink.publish(result(2)).unwrap();
        sink.publish(result(3)).unwrap();
        drop(sink);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "dr5reg,2,599999\ndr5reg,3,599999\n"
        );
    }

    #[test]
    fn test_delivery_stream_sink_flushes_partial_batch() {
        let mut out = Vec::new();
        let mut sink = DeliveryStreamSink::new(&mut out, 100);
        sink.publish(result(2)).unwrap();
        sink.flush().unwrap();
        drop(sink);
        assert_eq!(String::from_utf8(out).unwrap(), "dr5reg,2,599999\n");
    }

    #[test]
    fn test_analytics_sink_writes_json_lines() {
        let mut out = Vec::new();
        let mut sink = AnalyticsSink::new(&mut out);
        sink.publish(result(2)).unwrap();
        Sink::<PickupCount>::flush(&mut sink).unwrap();
        drop(sink);
        let line = String::from_utf8(out).unwrap();
        let parsed: PickupCount = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(parsed, result(2));
    }

    #[test]
    fn test_vec_sink_collects_through_handle() {
        let (mut sink, handle) = VecSink::new();
        sink.publish(result(5)).unwrap();
        assert_eq!(handle.lock().unwrap().len(), 1);
    }
}
