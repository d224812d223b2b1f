//! Job configuration.

use std::time::Duration;

use crate::events::RawEvent;
use crate::time::{
    BoundedOutOfOrderness, ProcessingTimeWatermarks, PunctuatedWatermarks, WatermarkStrategy,
};

/// How timestamps and watermarks are derived from the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMode {
    /// Event time, watermarks driven by punctuation records in the stream.
    EventTime,
    /// Event time, watermarks trailing the maximum seen timestamp by a
    /// fixed delay. For feeds without embedded punctuation.
    BoundedOutOfOrder(Duration),
    /// Wall-clock arrival time.
    ProcessingTime,
}

impl TimeMode {
    /// Build the watermark strategy this mode stands for.
    pub fn strategy(&self) -> Box<dyn WatermarkStrategy<RawEvent>> {
        match self {
            TimeMode::EventTime => Box::new(PunctuatedWatermarks::new(
                |event: &RawEvent| event.timestamp(),
                |event: &RawEvent| event.punctuation(),
            )),
            TimeMode::BoundedOutOfOrder(max_delay) => Box::new(BoundedOutOfOrderness::new(
                *max_delay,
                |event: &RawEvent| event.timestamp(),
            )),
            TimeMode::ProcessingTime => Box::new(ProcessingTimeWatermarks),
        }
    }
}

/// Tunables of the aggregation job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Tumbling window length.
    pub window_length: Duration,
    /// Geohash cell precision in characters.
    pub geohash_precision: usize,
    /// Minimum pickups per (cell, window) before a hotspot is reported.
    pub min_pickup_count: u64,
    /// Minimum trips per (cell, airport, window) before duration stats are
    /// reported.
    pub min_trip_count: u64,
    pub time_mode: TimeMode,
    /// Number of worker threads owning keyed window state.
    pub parallelism: usize,
    /// Capacity of the channels between pipeline stages.
    pub channel_capacity: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            window_length: Duration::from_secs(600),
            geohash_precision: 6,
            min_pickup_count: 2,
            min_trip_count: 2,
            time_mode: TimeMode::EventTime,
            parallelism: 2,
            channel_capacity: 1024,
        }
    }
}
