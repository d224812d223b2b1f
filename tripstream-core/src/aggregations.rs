//! The two window jobs this pipeline runs.
//!
//! Both key by the pickup geohash cell and use tumbling event-time windows
//! assigned from the pickup timestamp. Pickup counts gate on a minimum
//! count per cell; airport durations gate on more than one trip, since a
//! single ride is not a meaningful statistic.

use serde::{Deserialize, Serialize};

use crate::events::{AirportCode, PickupCount, TripDuration, TripEvent};
use crate::geo;
use crate::types::EventTime;
use crate::window::{AggregateFunction, TimeWindow};

/// Counts pickups per (cell, window); emits when the count reaches the
/// configured threshold.
pub struct PickupCountAgg {
    pub min_pickup_count: u64,
}

impl AggregateFunction<String, TripEvent, u64, PickupCount> for PickupCountAgg {
    fn create_accumulator(&self) -> u64 {
        0
    }

    fn add(&self, acc: &mut u64, _element: &TripEvent) {
        *acc += 1;
    }

    fn emits(&self, acc: &u64) -> bool {
        *acc >= self.min_pickup_count
    }

    fn get_result(&self, key: &String, window: &TimeWindow, acc: u64) -> PickupCount {
        PickupCount {
            position: key.clone(),
            pickup_count: acc,
            window_end: window.max_timestamp(),
        }
    }
}

/// One trip's contribution to the airport-duration job: origin cell,
/// destination airport, and the ride length in whole minutes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AirportLeg {
    pub position: String,
    pub airport_code: AirportCode,
    pub duration_minutes: i64,
    /// The trip's pickup time; windows are assigned from it, not the dropoff.
    pub pickup_time: EventTime,
}

/// Turn a trip into an airport leg, if its dropoff is near an airport.
///
/// Duration is truncated to whole minutes. A trip whose dropoff precedes
/// its pickup is malformed and yields no leg: merging a negative duration
/// would silently corrupt the window average.
pub fn airport_leg(trip: &TripEvent, precision: usize) -> Option<AirportLeg> {
    let airport_code = if geo::near_jfk(trip.dropoff_latitude, trip.dropoff_longitude) {
        AirportCode::Jfk
    } else if geo::near_lga(trip.dropoff_latitude, trip.dropoff_longitude) {
        AirportCode::Lga
    } else {
        return None;
    };

    let duration_ms = trip.dropoff_datetime - trip.pickup_datetime;
    if duration_ms < 0 {
        tracing::debug!(trip_id = trip.trip_id, "dropoff precedes pickup, dropping trip");
        return None;
    }

    Some(AirportLeg {
        position: geo::encode_cell(trip.pickup_latitude, trip.pickup_longitude, precision),
        airport_code,
        duration_minutes: duration_ms / 60_000,
        pickup_time: trip.pickup_datetime,
    })
}

/// Running sum and count of trip durations for one (cell, airport, window).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurationAcc {
    pub sum_minutes: i64,
    pub trip_count: u64,
}

/// Sums trip durations per (cell, airport, window); emits when more than
/// one trip contributed.
pub struct TripDurationAgg {
    pub min_trip_count: u64,
}

impl AggregateFunction<(String, AirportCode), AirportLeg, DurationAcc, TripDuration>
    for TripDurationAgg
{
    fn create_accumulator(&self) -> DurationAcc {
        DurationAcc::default()
    }

    fn add(&self, acc: &mut DurationAcc, element: &AirportLeg) {
        acc.sum_minutes += element.duration_minutes;
        acc.trip_count += 1;
    }

    fn emits(&self, acc: &DurationAcc) -> bool {
        acc.trip_count >= self.min_trip_count
    }

    fn get_result(
        &self,
        key: &(String, AirportCode),
        window: &TimeWindow,
        acc: DurationAcc,
    ) -> TripDuration {
        TripDuration {
            position: key.0.clone(),
            airport_code: key.1,
            sum_duration_minutes: acc.sum_minutes,
            avg_duration_minutes: acc.sum_minutes as f64 / acc.trip_count as f64,
            window_end: window.max_timestamp(),
        }
    }
}
