use super::*;

/// Extracts timestamps from stream elements and creates watermark generators.
///
/// Implement this trait to define time semantics for your data type. The
/// strategy is split into two responsibilities:
/// - `extract_timestamp`: pure function, called per element
/// - `create_watermark_generator`: factory, called once per pipeline at startup
pub trait WatermarkStrategy<T>: Send + Sync {
    /// Extract the event time timestamp (milliseconds) from an element.
    fn extract_timestamp(&self, element: &T) -> EventTime;

    /// Create a fresh [`WatermarkGenerator`] for this strategy.
    fn create_watermark_generator(&self) -> Box<dyn WatermarkGenerator<T>>;
}

/// Observes events and decides when to advance the watermark.
///
/// Called by the assigner after each element is processed.
pub trait WatermarkGenerator<T>: Send {
    /// Notify the generator that an event was observed with the given timestamp.
    fn on_event(&mut self, element: &T, timestamp: EventTime);

    /// Return the current watermark, or `None` if no watermark has been emitted yet.
    fn current_watermark(&self) -> Option<Watermark>;
}

// ── Punctuated ────────────────────────────────────────────────────────────────

/// Watermark strategy for streams that carry explicit punctuation records.
///
/// The watermark advances only when an element carries a punctuation, to the
/// maximum punctuation seen so far. Elements without punctuation never move
/// it — a stream whose producer stops punctuating leaves open windows
/// unfired, which is the source's contract, not remediated here.
pub struct PunctuatedWatermarks<T, TS, P> {
    timestamp_fn: TS,
    punctuation_fn: P,
    _phantom: PhantomData<T>,
}

impl<T, TS, P> PunctuatedWatermarks<T, TS, P>
where
    TS: Fn(&T) -> EventTime + Send + Sync,
    P: Fn(&T) -> Option<EventTime> + Send + Sync + Clone,
{
    /// Create a punctuated strategy from a timestamp extractor and a
    /// punctuation extractor.
    pub fn new(timestamp_fn: TS, punctuation_fn: P) -> Self {
        Self {
            timestamp_fn,
            punctuation_fn,
            _phantom: PhantomData,
        }
    }
}

impl<T, TS, P> WatermarkStrategy<T> for PunctuatedWatermarks<T, TS, P>
where
    T: Send + Sync,
    TS: Fn(&T) -> EventTime + Send + Sync,
    P: Fn(&T) -> Option<EventTime> + Send + Sync + Clone + 'static,
{
    fn extract_timestamp(&self, element: &T) -> EventTime {
        (self.timestamp_fn)(element)
    }

    fn create_watermark_generator(&self) -> Box<dyn WatermarkGenerator<T>> {
        Box::new(PunctuatedGenerator {
            punctuation_fn: self.punctuation_fn.clone(),
            high: EVENT_TIME_MIN,
        })
    }
}

struct PunctuatedGenerator<P> {
    punctuation_fn: P,
    high: EventTime,
}

impl<T, P> WatermarkGenerator<T> for PunctuatedGenerator<P>
where
    P: Fn(&T) -> Option<EventTime> + Send,
{
    fn on_event(&mut self, element: &T, _timestamp: EventTime) {
        if let Some(punctuation) = (self.punctuation_fn)(element) {
            if punctuation > self.high {
                self.high = punctuation;
            }
        }
    }

    fn current_watermark(&self) -> Option<Watermark> {
        if self.high == EVENT_TIME_MIN {
            // No punctuation seen yet; don't emit a watermark.
            return None;
        }
        Some(Watermark::new(self.high))
    }
}

// ── Bounded out-of-orderness ──────────────────────────────────────────────────

/// Watermark strategy for streams where events can arrive out of order by at
/// most `max_delay`.
///
/// The watermark is `max_seen_timestamp - max_delay`, which means the system
/// waits `max_delay` before closing any window. Use this for feeds without
/// embedded punctuation records.
pub struct BoundedOutOfOrderness<T, F> {
    max_delay_ms: i64,
    timestamp_fn: F,
    _phantom: PhantomData<T>,
}

impl<T, F: Fn(&T) -> EventTime + Send + Sync> BoundedOutOfOrderness<T, F> {
    /// Create a new strategy with the given maximum out-of-order delay and
    /// timestamp extractor.
    pub fn new(max_delay: Duration, timestamp_fn: F) -> Self {
        Self {
            max_delay_ms: max_delay.as_millis() as i64,
            timestamp_fn,
            _phantom: PhantomData,
        }
    }
}

impl<T, F> WatermarkStrategy<T> for BoundedOutOfOrderness<T, F>
where
    T: Send + Sync,
    F: Fn(&T) -> EventTime + Send + Sync,
{
    fn extract_timestamp(&self, element: &T) -> EventTime {
        (self.timestamp_fn)(element)
    }

    fn create_watermark_generator(&self) -> Box<dyn WatermarkGenerator<T>> {
        Box::new(BoundedOutOfOrdernessGenerator {
            max_delay_ms: self.max_delay_ms,
            max_seen_timestamp: EVENT_TIME_MIN,
        })
    }
}

struct BoundedOutOfOrdernessGenerator {
    max_delay_ms: i64,
    max_seen_timestamp: EventTime,
}

impl<T> WatermarkGenerator<T> for BoundedOutOfOrdernessGenerator {
    fn on_event(&mut self, _element: &T, timestamp: EventTime) {
        if timestamp > self.max_seen_timestamp {
            self.max_seen_timestamp = timestamp;
        }
    }

    fn current_watermark(&self) -> Option<Watermark> {
        if self.max_seen_timestamp == EVENT_TIME_MIN {
            return None;
        }
        Some(Watermark::new(self.max_seen_timestamp - self.max_delay_ms))
    }
}

// ── Processing time ───────────────────────────────────────────────────────────

/// Wall-clock strategy: every element is timestamped with its arrival time
/// and the watermark follows immediately behind.
///
/// Windows then close by arrival order, regardless of the timestamps the
/// records carry.
pub struct ProcessingTimeWatermarks;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> EventTime {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl<T: Send + Sync> WatermarkStrategy<T> for ProcessingTimeWatermarks {
    fn extract_timestamp(&self, _element: &T) -> EventTime {
        now_millis()
    }

    fn create_watermark_generator(&self) -> Box<dyn WatermarkGenerator<T>> {
        Box::new(ProcessingTimeGenerator {
            high: EVENT_TIME_MIN,
        })
    }
}

struct ProcessingTimeGenerator {
    high: EventTime,
}

impl<T> WatermarkGenerator<T> for ProcessingTimeGenerator {
    fn on_event(&mut self, _element: &T, timestamp: EventTime) {
        if timestamp > self.high {
            self.high = timestamp;
        }
    }

    fn current_watermark(&self) -> Option<Watermark> {
        if self.high == EVENT_TIME_MIN {
            return None;
        }
        Some(Watermark::new(self.high))
    }
}

// ── Assigner ──────────────────────────────────────────────────────────────────

/// Applies a [`WatermarkStrategy`] to a stream, one element at a time.
///
/// Owns the strategy's generator and enforces the monotonicity rule: the
/// watermark sequence handed downstream never moves backward, even if a
/// generator's value regresses. Each emitted watermark is strictly greater
/// than the previous one.
pub struct TimestampAssigner<T> {
    strategy: Box<dyn WatermarkStrategy<T>>,
    generator: Box<dyn WatermarkGenerator<T>>,
    last_emitted: EventTime,
}

impl<T> TimestampAssigner<T> {
    pub fn new(strategy: Box<dyn WatermarkStrategy<T>>) -> Self {
        let generator = strategy.create_watermark_generator();
        Self {
            strategy,
            generator,
            last_emitted: EVENT_TIME_MIN,
        }
    }

    /// Timestamp one element and return the watermark to emit after it, if
    /// progress was made.
    pub fn assign(&mut self, element: &T) -> (EventTime, Option<Watermark>) {
        let timestamp = self.strategy.extract_timestamp(element);
        self.generator.on_event(element, timestamp);

        let advance = match self.generator.current_watermark() {
            Some(wm) if wm.timestamp > self.last_emitted => {
                self.last_emitted = wm.timestamp;
                Some(wm)
            }
            _ => None,
        };
        (timestamp, advance)
    }

    /// The highest watermark emitted so far, or `EVENT_TIME_MIN` before the first.
    pub fn current_watermark(&self) -> EventTime {
        self.last_emitted
    }
}
