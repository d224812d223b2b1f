//! # tripstream Core
//!
//! Event-time windowed aggregation over a stream of taxi-trip events.
//!
//! The crate turns a feed of geotagged trips into two derived metrics:
//! pickup hotspot counts per geohash cell, and summed/average trip
//! duration to the major airports per origin cell, both over tumbling
//! event-time windows.
//!
//! - [`types`] — Stream primitives: [`StreamElement`](types::StreamElement),
//!   [`StreamRecord`](types::StreamRecord), [`Watermark`](types::Watermark),
//!   and the [`StreamData`](types::StreamData) trait bound.
//! - [`events`] — The taxi domain: [`RawEvent`](events::RawEvent),
//!   [`TripEvent`](events::TripEvent), and the emitted result records.
//! - [`geo`] — Geohash cell encoding and bounding-box predicates.
//! - [`filter`] — The classifier chain that admits well-formed, in-region trips.
//! - [`time`] — Watermark strategies and the event-time timer service.
//! - [`window`] — Tumbling windows, triggers, and the keyed
//!   [`WindowOperator`](window::WindowOperator).
//! - [`aggregations`] — The two concrete window jobs.
//! - [`pipeline`] — The threaded runner wiring source, workers, and sinks.

pub mod aggregations;
pub mod channel;
pub mod config;
pub mod events;
pub mod filter;
pub mod geo;
pub mod partitioner;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod time;
pub mod types;
pub mod window;
