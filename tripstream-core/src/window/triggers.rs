use super::*;

/// The result returned by a [`Trigger`] to control window evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerResult {
    /// Keep accumulating elements; do not fire the window yet.
    Continue,
    /// Evaluate the window and emit a result; keep the window state.
    Fire,
    /// Discard window state without emitting any result.
    Purge,
    /// Evaluate the window, emit a result, then discard state.
    FireAndPurge,
}

impl TriggerResult {
    /// Return true if the window should be evaluated.
    pub fn is_fire(self) -> bool {
        matches!(self, TriggerResult::Fire | TriggerResult::FireAndPurge)
    }

    /// Return true if the window state should be discarded after this result.
    pub fn is_purge(self) -> bool {
        matches!(self, TriggerResult::Purge | TriggerResult::FireAndPurge)
    }
}

/// Determines when a window should be evaluated (fired) and when its state
/// should be discarded (purged).
///
/// Called by `WindowOperator` on two paths:
/// - When an element arrives (`on_element`)
/// - When event time advances (`on_event_time`)
pub trait Trigger<T, W>: Send {
    /// Called for every element merged into a window.
    fn on_element(&mut self, element: &T, timestamp: EventTime, window: &W) -> TriggerResult;

    /// Called when event time (watermark) advances.
    fn on_event_time(&mut self, event_time: EventTime, window: &W) -> TriggerResult;
}

/// The default trigger for event-time windowing.
///
/// Fires when the watermark passes the window's maximum timestamp
/// (`window.end - 1`). After firing it also purges the window: late
/// elements are dropped upstream of the accumulator, so the state is
/// never needed again.
#[derive(Clone, Default)]
pub struct EventTimeTrigger;

impl<T: Send, W: Send + Sync> Trigger<T, W> for EventTimeTrigger
where
    W: AsRef<TimeWindow>,
{
    fn on_element(&mut self, _element: &T, _timestamp: EventTime, _window: &W) -> TriggerResult {
        // No per-element action needed; the watermark timer drives firing.
        TriggerResult::Continue
    }

    fn on_event_time(&mut self, event_time: EventTime, window: &W) -> TriggerResult {
        // Fire (and purge) as soon as the watermark covers the entire window.
        if event_time >= window.as_ref().max_timestamp() {
            TriggerResult::FireAndPurge
        } else {
            TriggerResult::Continue
        }
    }
}
