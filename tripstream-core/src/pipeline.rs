//! The threaded job runner.
//!
//! ```text
//! Ingest Thread (assign timestamps/watermarks, classify, partition)
//!     |
//!     | hash partition by pickup cell; watermarks broadcast
//!     v
//! Worker Threads (parallelism; each owns both window operators
//!                 for its share of the key space)
//!     |                          |
//!     v                          v
//! Pickup Collector          Duration Collector
//! (delivery sink)           (analytics sink)
//! ```
//!
//! Both jobs key by the pickup cell first, so a single routing serves them:
//! a worker exclusively owns all window state for its cells and no
//! cross-thread locking is needed. Each worker channel carries records and
//! watermarks in ingest order, so every worker observes a monotone
//! watermark sequence.
//!
//! Shutdown is best-effort: on `End`, accumulators of still-open windows
//! are counted and discarded, never flushed as partial results.

use std::thread;

use anyhow::{bail, Result};

use crate::aggregations::{airport_leg, AirportLeg, PickupCountAgg, TripDurationAgg};
use crate::channel::{local_channel, LocalChannelReceiver};
use crate::config::JobConfig;
use crate::events::{PickupCount, RawEvent, TripDuration, TripEvent};
use crate::filter::{ClassifierStats, TripClassifier};
use crate::geo;
use crate::partitioner::{HashPartitioner, Partitioner};
use crate::sink::Sink;
use crate::time::TimestampAssigner;
use crate::types::{StreamElement, StreamRecord};
use crate::window::{EventTimeTrigger, TumblingEventTimeWindows, WindowOperator};

/// Counters reported after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub events_ingested: u64,
    pub classifier: ClassifierStats,
    /// Records dropped because their window had already fired.
    pub late_drops: u64,
    /// Accumulators of windows still open at shutdown, discarded unfired.
    pub open_windows_discarded: u64,
    pub pickup_windows_emitted: u64,
    pub duration_windows_emitted: u64,
}

struct WorkerStats {
    late_drops: u64,
    open_windows_discarded: u64,
}

/// Run the full job over a bounded event stream, blocking until every
/// emitted result has been handed to its sink.
pub fn run_job<I, SP, SD>(
    config: &JobConfig,
    events: I,
    pickup_sink: SP,
    duration_sink: SD,
) -> Result<JobSummary>
where
    I: IntoIterator<Item = RawEvent>,
    I::IntoIter: Send + 'static,
    SP: Sink<PickupCount> + 'static,
    SD: Sink<TripDuration> + 'static,
{
    if config.parallelism == 0 {
        bail!("parallelism must be greater than 0");
    }

    let parallelism = config.parallelism;
    let precision = config.geohash_precision;

    // Channels: ingest -> workers.
    let mut worker_channels = Vec::with_capacity(parallelism);
    for _ in 0..parallelism {
        worker_channels.push(local_channel::<TripEvent>(config.channel_capacity));
    }
    let worker_senders: Vec<_> = worker_channels
        .iter()
        .map(|(sender, _)| sender.clone())
        .collect();
    let worker_receivers: Vec<_> = worker_channels
        .into_iter()
        .map(|(_, receiver)| receiver)
        .collect();

    // Channels: workers -> collectors.
    let (counts_tx, counts_rx) = local_channel::<PickupCount>(config.channel_capacity);
    let (durations_tx, durations_rx) = local_channel::<TripDuration>(config.channel_capacity);

    // Collectors own the sinks; they stop after an End from every worker.
    let counts_handle = spawn_collector(counts_rx, pickup_sink, parallelism);
    let durations_handle = spawn_collector(durations_rx, duration_sink, parallelism);

    // Workers own the keyed window state.
    let mut worker_handles = Vec::with_capacity(parallelism);
    for receiver in worker_receivers {
        let counts_tx = counts_tx.clone();
        let durations_tx = durations_tx.clone();
        let window_length = config.window_length;
        let min_pickup_count = config.min_pickup_count;
        let min_trip_count = config.min_trip_count;

        let handle = thread::spawn(move || -> Result<WorkerStats> {
            let mut pickup_op = WindowOperator::new(
                move |trip: &TripEvent| {
                    geo::encode_cell(trip.pickup_latitude, trip.pickup_longitude, precision)
                },
                |trip: &TripEvent| trip.pickup_datetime,
                TumblingEventTimeWindows::of(window_length),
                EventTimeTrigger,
                PickupCountAgg { min_pickup_count },
            );
            let mut duration_op = WindowOperator::new(
                |leg: &AirportLeg| (leg.position.clone(), leg.airport_code),
                |leg: &AirportLeg| leg.pickup_time,
                TumblingEventTimeWindows::of(window_length),
                EventTimeTrigger,
                TripDurationAgg { min_trip_count },
            );

            loop {
                match receiver.recv()? {
                    StreamElement::Record(rec) => {
                        let leg = airport_leg(&rec.value, precision);
                        let timestamp = rec.timestamp;

                        for out in pickup_op.process(StreamElement::Record(rec))? {
                            if let StreamElement::Record(result) = out {
                                counts_tx.send(StreamElement::Record(result))?;
                            }
                        }

                        if let Some(leg) = leg {
                            let elem = match timestamp {
                                Some(ts) => StreamElement::timestamped_record(leg, ts),
                                None => StreamElement::record(leg),
                            };
                            for out in duration_op.process(elem)? {
                                if let StreamElement::Record(result) = out {
                                    durations_tx.send(StreamElement::Record(result))?;
                                }
                            }
                        }
                    }

                    StreamElement::Watermark(wm) => {
                        for out in pickup_op.process(StreamElement::Watermark(wm))? {
                            if let StreamElement::Record(result) = out {
                                counts_tx.send(StreamElement::Record(result))?;
                            }
                        }
                        for out in duration_op.process(StreamElement::Watermark(wm))? {
                            if let StreamElement::Record(result) = out {
                                durations_tx.send(StreamElement::Record(result))?;
                            }
                        }
                    }

                    StreamElement::End => {
                        counts_tx.send(StreamElement::End)?;
                        durations_tx.send(StreamElement::End)?;
                        let open = pickup_op.open_windows() + duration_op.open_windows();
                        if open > 0 {
                            tracing::debug!(open, "discarding accumulators of unclosed windows");
                        }
                        return Ok(WorkerStats {
                            late_drops: pickup_op.late_drops() + duration_op.late_drops(),
                            open_windows_discarded: open as u64,
                        });
                    }
                }
            }
        });
        worker_handles.push(handle);
    }
    drop(counts_tx);
    drop(durations_tx);

    // Ingest: timestamp/watermark assignment, classification, routing.
    let strategy = config.time_mode.strategy();
    let events_iter = events.into_iter();
    let ingest_handle = thread::spawn(move || -> Result<(u64, ClassifierStats)> {
        let mut assigner = TimestampAssigner::new(strategy);
        let mut classifier = TripClassifier::new();
        let partitioner = HashPartitioner::new(move |trip: &TripEvent| {
            geo::encode_cell(trip.pickup_latitude, trip.pickup_longitude, precision)
        });

        let mut ingested = 0u64;
        for event in events_iter {
            ingested += 1;
            let (timestamp, watermark) = assigner.assign(&event);

            if let Some(trip) = classifier.classify(event) {
                let partition = partitioner.partition(&trip, parallelism);
                worker_senders[partition].send(StreamElement::Record(
                    StreamRecord::with_timestamp(trip, timestamp),
                ))?;
            }

            if let Some(wm) = watermark {
                // Time progress concerns every worker, not just one partition.
                for sender in &worker_senders {
                    sender.send(StreamElement::Watermark(wm))?;
                }
            }
        }

        for sender in &worker_senders {
            sender.send(StreamElement::End)?;
        }
        Ok((ingested, classifier.stats()))
    });

    let (events_ingested, classifier) = ingest_handle.join().unwrap()?;

    let mut late_drops = 0u64;
    let mut open_windows_discarded = 0u64;
    for handle in worker_handles {
        let stats = handle.join().unwrap()?;
        late_drops += stats.late_drops;
        open_windows_discarded += stats.open_windows_discarded;
    }

    let pickup_windows_emitted = counts_handle.join().unwrap()?;
    let duration_windows_emitted = durations_handle.join().unwrap()?;

    let summary = JobSummary {
        events_ingested,
        classifier,
        late_drops,
        open_windows_discarded,
        pickup_windows_emitted,
        duration_windows_emitted,
    };
    tracing::info!(
        ingested = summary.events_ingested,
        accepted = summary.classifier.accepted,
        dropped = summary.classifier.dropped(),
        late = summary.late_drops,
        hotspots = summary.pickup_windows_emitted,
        durations = summary.duration_windows_emitted,
        "job complete"
    );
    Ok(summary)
}

/// Drain one result stream into its sink until every worker has ended.
fn spawn_collector<T, S>(
    receiver: LocalChannelReceiver<T>,
    mut sink: S,
    expected_ends: usize,
) -> thread::JoinHandle<Result<u64>>
where
    T: Send + 'static,
    S: Sink<T> + 'static,
{
    thread::spawn(move || -> Result<u64> {
        let mut emitted = 0u64;
        let mut ends = 0usize;
        while ends < expected_ends {
            match receiver.recv()? {
                StreamElement::Record(rec) => {
                    sink.publish(rec.value)?;
                    emitted += 1;
                }
                StreamElement::Watermark(_) => {}
                StreamElement::End => ends += 1,
            }
        }
        sink.flush()?;
        Ok(emitted)
    })
}
