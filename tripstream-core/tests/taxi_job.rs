use std::time::Duration;

use tripstream_core::config::{JobConfig, TimeMode};
use tripstream_core::events::{AirportCode, RawEvent, TripEvent, WatermarkEvent};
use tripstream_core::pipeline::run_job;
use tripstream_core::sink::VecSink;

// Pickup coordinates that all encode to geohash cell "dr5reg" (lower
// Manhattan), and dropoff coordinates inside the JFK / LGA boxes.
const CITY_HALL: (f64, f64) = (40.712, -74.010);
const CITY_HALL_2: (f64, f64) = (40.711, -74.008);
const CITY_HALL_3: (f64, f64) = (40.714, -74.006);
const MIDTOWN: (f64, f64) = (40.7580, -73.9855);
const JFK_TERMINAL: (f64, f64) = (40.6413, -73.7781);
const LGA_TERMINAL: (f64, f64) = (40.7769, -73.8740);

fn trip(
    trip_id: u64,
    pickup: (f64, f64),
    dropoff: (f64, f64),
    pickup_ms: i64,
    dropoff_ms: i64,
) -> RawEvent {
    RawEvent::Trip(TripEvent {
        trip_id,
        pickup_latitude: pickup.0,
        pickup_longitude: pickup.1,
        dropoff_latitude: dropoff.0,
        dropoff_longitude: dropoff.1,
        pickup_datetime: pickup_ms,
        dropoff_datetime: dropoff_ms,
    })
}

fn watermark(ts: i64) -> RawEvent {
    RawEvent::Watermark(WatermarkEvent { watermark: ts })
}

fn run(
    config: &JobConfig,
    events: Vec<RawEvent>,
) -> (
    tripstream_core::pipeline::JobSummary,
    Vec<tripstream_core::events::PickupCount>,
    Vec<tripstream_core::events::TripDuration>,
) {
    let (pickup_sink, pickups) = VecSink::new();
    let (duration_sink, durations) = VecSink::new();
    let summary = run_job(config, events, pickup_sink, duration_sink).unwrap();
    let pickups = pickups.lock().unwrap().clone();
    let durations = durations.lock().unwrap().clone();
    (summary, pickups, durations)
}

#[test]
fn test_hotspot_three_pickups_in_one_cell() {
    // Three pickups in "dr5reg" at minutes 1, 3, 9; the window [0, 10min)
    // closes when the punctuation reaches minute 10.
    let events = vec![
        trip(1, CITY_HALL, MIDTOWN, 60_000, 360_000),
        trip(2, CITY_HALL_2, MIDTOWN, 180_000, 480_000),
        trip(3, CITY_HALL_3, MIDTOWN, 540_000, 840_000),
        watermark(600_000),
    ];

    let (summary, pickups, durations) = run(&JobConfig::default(), events);

    assert_eq!(pickups.len(), 1);
    assert_eq!(pickups[0].position, "dr5reg");
    assert_eq!(pickups[0].pickup_count, 3);
    assert_eq!(pickups[0].window_end, 599_999);

    assert!(durations.is_empty(), "no airport dropoffs in this stream");
    assert_eq!(summary.classifier.accepted, 3);
    assert_eq!(summary.pickup_windows_emitted, 1);
}

#[test]
fn test_airport_durations_sum_and_average() {
    // Two rides from "dr5reg" to JFK: 20 and 30 minutes.
    let events = vec![
        trip(1, CITY_HALL, JFK_TERMINAL, 60_000, 60_000 + 20 * 60_000),
        trip(2, CITY_HALL_2, JFK_TERMINAL, 120_000, 120_000 + 30 * 60_000),
        watermark(600_000),
    ];

    let (_, pickups, durations) = run(&JobConfig::default(), events);

    assert_eq!(durations.len(), 1);
    let stat = &durations[0];
    assert_eq!(stat.position, "dr5reg");
    assert_eq!(stat.airport_code, AirportCode::Jfk);
    assert_eq!(stat.sum_duration_minutes, 50);
    assert!((stat.avg_duration_minutes - 25.0).abs() < f64::EPSILON);
    assert_eq!(stat.window_end, 599_999);

    // The same two pickups also cross the hotspot threshold.
    assert_eq!(pickups.len(), 1);
    assert_eq!(pickups[0].pickup_count, 2);
}

#[test]
fn test_single_trip_emits_nothing() {
    // One pickup alone in its cell/window: below both thresholds.
    let events = vec![
        trip(1, CITY_HALL, JFK_TERMINAL, 60_000, 1_260_000),
        watermark(600_000),
    ];

    let (summary, pickups, durations) = run(&JobConfig::default(), events);

    assert!(pickups.is_empty());
    assert!(durations.is_empty());
    assert_eq!(summary.classifier.accepted, 1);
}

#[test]
fn test_separate_airports_aggregate_separately() {
    let events = vec![
        trip(1, CITY_HALL, JFK_TERMINAL, 60_000, 1_260_000),
        trip(2, CITY_HALL_2, JFK_TERMINAL, 120_000, 1_320_000),
        trip(3, CITY_HALL_3, LGA_TERMINAL, 180_000, 780_000),
        watermark(600_000),
    ];

    let (_, _, durations) = run(&JobConfig::default(), events);

    // Only the JFK pair qualifies; the lone LGA ride is gated out.
    assert_eq!(durations.len(), 1);
    assert_eq!(durations[0].airport_code, AirportCode::Jfk);
    assert_eq!(durations[0].sum_duration_minutes, 40);
}

#[test]
fn test_late_trip_is_dropped_and_never_refires() {
    let config = JobConfig {
        min_pickup_count: 1,
        ..JobConfig::default()
    };
    let events = vec![
        trip(1, CITY_HALL, MIDTOWN, 60_000, 360_000),
        watermark(600_000),
        // Late: its window [0, 10min) already fired.
        trip(2, CITY_HALL_2, MIDTOWN, 120_000, 420_000),
        watermark(1_200_000),
    ];

    let (summary, pickups, _) = run(&config, events);

    assert_eq!(pickups.len(), 1, "the fired window must not fire again");
    assert_eq!(pickups[0].pickup_count, 1);
    assert_eq!(summary.late_drops, 1);
}

#[test]
fn test_window_boundary_belongs_to_next_window() {
    let config = JobConfig {
        min_pickup_count: 1,
        ..JobConfig::default()
    };
    let events = vec![
        // Pickup exactly at minute 10: belongs to [10min, 20min), so the
        // punctuation at minute 10 does not make it late.
        watermark(600_000),
        trip(1, CITY_HALL, MIDTOWN, 600_000, 900_000),
        trip(2, CITY_HALL_2, MIDTOWN, 660_000, 960_000),
        watermark(1_200_000),
    ];

    let (summary, pickups, _) = run(&config, events);

    assert_eq!(summary.late_drops, 0);
    assert_eq!(pickups.len(), 1);
    assert_eq!(pickups[0].pickup_count, 2);
    assert_eq!(pickups[0].window_end, 1_199_999);
}

#[test]
fn test_malformed_and_out_of_region_events_are_filtered() {
    let events = vec![
        // Missing GPS fix.
        trip(1, (0.0, 0.0), MIDTOWN, 60_000, 360_000),
        // Chicago pickup.
        trip(2, (41.8781, -87.6298), MIDTOWN, 120_000, 420_000),
        // Dropoff before pickup: counted by the classifier as a valid trip,
        // but contributes no airport leg.
        trip(3, CITY_HALL, JFK_TERMINAL, 600_000, 540_000),
        watermark(1_200_000),
    ];

    let (summary, pickups, durations) = run(&JobConfig::default(), events);

    assert_eq!(summary.classifier.invalid_coordinates, 1);
    assert_eq!(summary.classifier.out_of_region, 1);
    assert_eq!(summary.classifier.accepted, 1);
    assert!(pickups.is_empty(), "one pickup is below the threshold");
    assert!(durations.is_empty(), "a negative-duration ride never merges");
}

#[test]
fn test_unclosed_windows_are_discarded_at_shutdown() {
    let config = JobConfig {
        min_pickup_count: 1,
        ..JobConfig::default()
    };
    // No punctuation at all: the window can never fire.
    let events = vec![
        trip(1, CITY_HALL, MIDTOWN, 60_000, 360_000),
        trip(2, CITY_HALL_2, MIDTOWN, 120_000, 420_000),
    ];

    let (summary, pickups, _) = run(&config, events);

    assert!(pickups.is_empty());
    assert_eq!(summary.open_windows_discarded, 1);
}

fn lcg_next(state: &mut u64) -> u64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    *state
}

fn gen_events(seed: u64, n: usize) -> Vec<RawEvent> {
    let pickups = [
        CITY_HALL,
        CITY_HALL_2,
        (40.7421, -73.9890), // dr5ru2
        (40.7580, -73.9855), // dr5ru7
        (40.7265, -73.9815), // dr5rsw
    ];
    let dropoffs = [MIDTOWN, JFK_TERMINAL, LGA_TERMINAL];

    let mut state = seed;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let pickup = pickups[(lcg_next(&mut state) as usize) % pickups.len()];
        let dropoff = dropoffs[(lcg_next(&mut state) as usize) % dropoffs.len()];
        let jitter = (lcg_next(&mut state) % 90_000) as i64 - 30_000;
        let pickup_ms = ((i as i64) * 20_000 + jitter).max(0);
        let ride_minutes = (lcg_next(&mut state) % 40) as i64 + 5;
        out.push(trip(
            i as u64,
            pickup,
            dropoff,
            pickup_ms,
            pickup_ms + ride_minutes * 60_000,
        ));
    }
    out
}

#[test]
fn test_parallel_run_matches_single_worker() {
    for seed in [11_u64, 97, 409] {
        let events = gen_events(seed, 240);

        // Bounded out-of-orderness derives watermarks from the data itself,
        // so both runs see the identical watermark schedule.
        let base = JobConfig {
            time_mode: TimeMode::BoundedOutOfOrder(Duration::from_secs(60)),
            ..JobConfig::default()
        };
        let serial = JobConfig {
            parallelism: 1,
            ..base.clone()
        };
        let parallel = JobConfig {
            parallelism: 3,
            ..base
        };

        let (_, mut pickups_a, mut durations_a) = run(&serial, events.clone());
        let (_, mut pickups_b, mut durations_b) = run(&parallel, events);

        let key_p = |p: &tripstream_core::events::PickupCount| {
            (p.window_end, p.position.clone(), p.pickup_count)
        };
        let key_d = |d: &tripstream_core::events::TripDuration| {
            (
                d.window_end,
                d.position.clone(),
                d.airport_code.to_string(),
                d.sum_duration_minutes,
            )
        };
        pickups_a.sort_by_key(key_p);
        pickups_b.sort_by_key(key_p);
        durations_a.sort_by_key(key_d);
        durations_b.sort_by_key(key_d);

        assert_eq!(pickups_a, pickups_b, "seed={seed}: hotspot results diverged");
        assert_eq!(
            durations_a, durations_b,
            "seed={seed}: duration results diverged"
        );
        assert!(
            !pickups_a.is_empty(),
            "seed={seed}: generator should produce qualifying windows"
        );
    }
}
