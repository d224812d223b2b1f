//! Taxi event types and the records the two aggregations emit.
//!
//! The input feed is newline-delimited JSON. Every object carries a `type`
//! discriminant: `trip` records describe a completed taxi ride, `watermark`
//! records are punctuation the producer embeds to signal event-time
//! progress. Anything else fails deserialization and is skipped upstream.

use serde::{Deserialize, Serialize};

use crate::types::EventTime;

/// One element of the raw input feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawEvent {
    Trip(TripEvent),
    Watermark(WatermarkEvent),
}

impl RawEvent {
    /// The event-time timestamp of this record.
    ///
    /// Trips are timestamped by their pickup; windows for both aggregations
    /// are assigned from this value.
    pub fn timestamp(&self) -> EventTime {
        match self {
            RawEvent::Trip(trip) => trip.pickup_datetime,
            RawEvent::Watermark(wm) => wm.watermark,
        }
    }

    /// The punctuation carried by this record, if any.
    pub fn punctuation(&self) -> Option<EventTime> {
        match self {
            RawEvent::Watermark(wm) => Some(wm.watermark),
            RawEvent::Trip(_) => None,
        }
    }
}

/// A completed taxi ride. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripEvent {
    pub trip_id: u64,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub dropoff_latitude: f64,
    pub dropoff_longitude: f64,
    pub pickup_datetime: EventTime,
    pub dropoff_datetime: EventTime,
}

/// Punctuation record: event time may advance to (at least) `watermark`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatermarkEvent {
    pub watermark: EventTime,
}

/// Destination airport of a trip, derived from its dropoff location.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum AirportCode {
    Jfk,
    Lga,
}

impl std::fmt::Display for AirportCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AirportCode::Jfk => f.write_str("JFK"),
            AirportCode::Lga => f.write_str("LGA"),
        }
    }
}

/// Pickup hotspot result: number of pickups in one cell during one window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PickupCount {
    /// Geohash cell of the pickup locations.
    pub position: String,
    pub pickup_count: u64,
    /// The window's maximum timestamp (`end - 1`).
    pub window_end: EventTime,
}

impl std::fmt::Display for PickupCount {
    /// Delivery-stream line format: cell, count, window end.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", self.position, self.pickup_count, self.window_end)
    }
}

/// Trip-duration result: summed and average minutes from one origin cell to
/// one airport during one window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripDuration {
    pub position: String,
    pub airport_code: AirportCode,
    pub sum_duration_minutes: i64,
    pub avg_duration_minutes: f64,
    /// The window's maximum timestamp (`end - 1`).
    pub window_end: EventTime,
}
