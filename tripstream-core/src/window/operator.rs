use super::*;

/// Core windowing operator.
///
/// Accepts [`StreamElement<T>`] items (records + watermarks) and emits
/// [`StreamElement<OUT>`] items when windows fire.
///
/// # Processing model
///
/// - **Records**: assigned to windows by the `WindowAssigner`, then folded
///   into a per-(key, window) accumulator via the `AggregateFunction`. A
///   record whose window has already fired is late: it is counted and
///   dropped, never merged.
/// - **Watermarks**: fire all windows whose `max_timestamp <= watermark`;
///   each fired window's accumulator is gated through `emits`, finalized if
///   it passes, and discarded either way. The watermark is re-emitted
///   downstream unchanged.
///
/// With the [`EventTimeTrigger`] this yields at most one result per
/// (key, window): firing removes the accumulator and the late-record drop
/// prevents it from being recreated.
pub struct WindowOperator<K, T, ACC, OUT, KF, TF, WA, TR, AGG>
where
    K: StreamData,
    T: StreamData,
    ACC: Clone + Send,
    OUT: StreamData,
    KF: Fn(&T) -> K + Send,
    TF: Fn(&T) -> EventTime + Send,
    WA: WindowAssigner<T>,
    TR: Trigger<T, TimeWindow>,
    AGG: AggregateFunction<K, T, ACC, OUT>,
{
    key_fn: KF,
    timestamp_fn: TF,
    assigner: WA,
    trigger: TR,
    agg: AGG,
    /// Accumulator arena: (key_bytes, window) -> (original key, accumulator).
    /// key_bytes is used as the HashMap key to allow O(1) lookup.
    /// The original key is kept alongside to avoid deserialization.
    accumulators: HashMap<(Vec<u8>, TimeWindow), (K, ACC)>,
    /// Event-time timers used to drive trigger callbacks.
    timer_service: TimerService,
    current_watermark: EventTime,
    late_drops: u64,
    _phantom: PhantomData<(T, OUT)>,
}

impl<K, T, ACC, OUT, KF, TF, WA, TR, AGG> WindowOperator<K, T, ACC, OUT, KF, TF, WA, TR, AGG>
where
    K: StreamData,
    T: StreamData,
    ACC: Clone + Send,
    OUT: StreamData,
    KF: Fn(&T) -> K + Send,
    TF: Fn(&T) -> EventTime + Send,
    WA: WindowAssigner<T>,
    TR: Trigger<T, TimeWindow>,
    AGG: AggregateFunction<K, T, ACC, OUT>,
{
    /// Create a new `WindowOperator`.
    ///
    /// - `key_fn`: extracts the grouping key from each element
    /// - `timestamp_fn`: extracts the event-time timestamp from an element
    ///   that arrives without one
    /// - `assigner`: assigns windows
    /// - `trigger`: controls when windows fire/purge
    /// - `agg`: folds elements, gates emission, finalizes results
    pub fn new(key_fn: KF, timestamp_fn: TF, assigner: WA, trigger: TR, agg: AGG) -> Self {
        Self {
            key_fn,
            timestamp_fn,
            assigner,
            trigger,
            agg,
            accumulators: HashMap::new(),
            timer_service: TimerService::new(),
            current_watermark: EVENT_TIME_MIN,
            late_drops: 0,
            _phantom: PhantomData,
        }
    }

    fn register_event_time_timer(&mut self, map_key: &(Vec<u8>, TimeWindow)) -> Result<()> {
        let timer_key = bincode::serialize(map_key)?;
        self.timer_service
            .register(timer_key, map_key.1.max_timestamp());
        Ok(())
    }

    fn delete_event_time_timer(&mut self, map_key: &(Vec<u8>, TimeWindow)) -> Result<()> {
        let timer_key = bincode::serialize(map_key)?;
        self.timer_service
            .delete(&timer_key, map_key.1.max_timestamp());
        Ok(())
    }

    fn apply_trigger_result(
        &mut self,
        map_key: (Vec<u8>, TimeWindow),
        trigger_result: TriggerResult,
        output: &mut Vec<StreamElement<OUT>>,
    ) -> Result<()> {
        if trigger_result.is_fire() {
            if let Some((key, acc)) = self.accumulators.remove(&map_key) {
                if !trigger_result.is_purge() {
                    // Fire without purge keeps the state for a later firing.
                    self.accumulators
                        .insert(map_key.clone(), (key.clone(), acc.clone()));
                } else {
                    self.delete_event_time_timer(&map_key)?;
                }
                if self.agg.emits(&acc) {
                    let result = self.agg.get_result(&key, &map_key.1, acc);
                    output.push(StreamElement::timestamped_record(
                        result,
                        map_key.1.max_timestamp(),
                    ));
                }
            }
            return Ok(());
        }

        if trigger_result.is_purge() {
            self.accumulators.remove(&map_key);
            self.delete_event_time_timer(&map_key)?;
        }
        Ok(())
    }

    /// Fire due event-time timers at `event_time`.
    ///
    /// Drains due timers, calls `trigger.on_event_time`, and applies
    /// fire/purge, emitting gated window results.
    pub fn on_timer(&mut self, event_time: EventTime) -> Result<Vec<StreamElement<OUT>>> {
        self.current_watermark = self.current_watermark.max(event_time);

        let mut trigger_results: Vec<((Vec<u8>, TimeWindow), TriggerResult)> = Vec::new();
        for (timer_key, fire_at) in self.timer_service.drain_due(event_time) {
            let map_key: (Vec<u8>, TimeWindow) = bincode::deserialize(&timer_key)?;
            let result = self.trigger.on_event_time(fire_at, &map_key.1);
            trigger_results.push((map_key, result));
        }

        let mut output: Vec<StreamElement<OUT>> = Vec::new();
        for (map_key, trigger_result) in trigger_results {
            self.apply_trigger_result(map_key, trigger_result, &mut output)?;
        }
        Ok(output)
    }

    /// Process one stream element and return any window results produced.
    ///
    /// - Records are folded into their window's accumulator; output is empty
    ///   unless a trigger fires immediately.
    /// - Watermarks advance event time, firing all expired windows and then
    ///   re-emitting the watermark so downstream consumers stay in sync.
    /// - `End` is forwarded; accumulators of still-open windows are dropped
    ///   with the operator (best-effort shutdown, no flush).
    pub fn process(&mut self, elem: StreamElement<T>) -> Result<Vec<StreamElement<OUT>>> {
        match elem {
            StreamElement::Record(rec) => {
                let key = (self.key_fn)(&rec.value);
                let key_bytes = bincode::serialize(&key)?;
                // Use timestamp from record, fall back to timestamp_fn.
                let ts = rec
                    .timestamp
                    .unwrap_or_else(|| (self.timestamp_fn)(&rec.value));
                let windows = self.assigner.assign_windows(&rec.value, ts);
                let mut output = Vec::new();
                for window in windows {
                    if self.current_watermark >= window.max_timestamp() {
                        // The window has already fired (or would fire
                        // immediately); merging now would break the
                        // one-result-per-window contract.
                        self.late_drops += 1;
                        tracing::trace!(timestamp = ts, %window, "dropping late record");
                        continue;
                    }

                    let map_key = (key_bytes.clone(), window.clone());
                    let entry = self
                        .accumulators
                        .entry(map_key.clone())
                        .or_insert_with(|| (key.clone(), self.agg.create_accumulator()));
                    self.agg.add(&mut entry.1, &rec.value);

                    // Default event-time semantics: a timer at window.max_timestamp().
                    self.register_event_time_timer(&map_key)?;

                    let trigger_result = self.trigger.on_element(&rec.value, ts, &window);
                    self.apply_trigger_result(map_key, trigger_result, &mut output)?;
                }
                Ok(output)
            }

            StreamElement::Watermark(wm) => {
                let mut output = self.on_timer(wm.timestamp)?;

                // Re-emit the watermark downstream so the pipeline keeps advancing.
                output.push(StreamElement::Watermark(wm));
                Ok(output)
            }

            StreamElement::End => Ok(vec![StreamElement::End]),
        }
    }

    /// Number of records dropped because their window had already fired.
    pub fn late_drops(&self) -> u64 {
        self.late_drops
    }

    /// Number of currently open (key, window) accumulators.
    pub fn open_windows(&self) -> usize {
        self.accumulators.len()
    }

    /// The operator's current event-time clock.
    pub fn current_watermark(&self) -> EventTime {
        self.current_watermark
    }
}
