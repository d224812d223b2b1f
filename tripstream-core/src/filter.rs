//! Classifier chain for the raw event feed.
//!
//! Admission is a short-circuiting sequence of predicates; a record failing
//! any step is dropped silently (a filtering outcome, not an error):
//!
//! 1. trip-shaped variant (punctuation and anything else is not a trip)
//! 2. valid pickup and dropoff coordinates
//! 3. pickup inside the city

use crate::events::{RawEvent, TripEvent};
use crate::geo;

/// Per-reason drop counters, reported at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifierStats {
    pub accepted: u64,
    pub not_a_trip: u64,
    pub invalid_coordinates: u64,
    pub out_of_region: u64,
}

impl ClassifierStats {
    pub fn dropped(&self) -> u64 {
        self.not_a_trip + self.invalid_coordinates + self.out_of_region
    }
}

/// Discriminates the polymorphic input stream down to well-formed,
/// in-region trips.
#[derive(Debug, Default)]
pub struct TripClassifier {
    stats: ClassifierStats,
}

impl TripClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one raw event, returning the trip if it passes every gate.
    pub fn classify(&mut self, event: RawEvent) -> Option<TripEvent> {
        let trip = match event {
            RawEvent::Trip(trip) => trip,
            RawEvent::Watermark(_) => {
                self.stats.not_a_trip += 1;
                return None;
            }
        };

        if !geo::is_valid_coordinate(trip.pickup_latitude, trip.pickup_longitude)
            || !geo::is_valid_coordinate(trip.dropoff_latitude, trip.dropoff_longitude)
        {
            self.stats.invalid_coordinates += 1;
            tracing::trace!(trip_id = trip.trip_id, "dropping trip with invalid coordinates");
            return None;
        }

        if !geo::near_nyc(trip.pickup_latitude, trip.pickup_longitude) {
            self.stats.out_of_region += 1;
            tracing::trace!(trip_id = trip.trip_id, "dropping trip picked up outside the city");
            return None;
        }

        self.stats.accepted += 1;
        Some(trip)
    }

    pub fn stats(&self) -> ClassifierStats {
        self.stats
    }
}
