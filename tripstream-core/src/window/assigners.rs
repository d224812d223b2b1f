use super::*;

/// Assigns one or more [`TimeWindow`]s to each stream element based on its
/// event-time timestamp.
///
/// Only tumbling windows are provided; the trait is the seam where other
/// window shapes would plug in.
pub trait WindowAssigner<T>: Send + Sync {
    /// Return the windows that contain the element with the given timestamp.
    fn assign_windows(&self, element: &T, timestamp: EventTime) -> Vec<TimeWindow>;
}

/// Fixed-size, non-overlapping event-time windows aligned to multiples of `size`.
///
/// A timestamp exactly on a boundary belongs to the window starting there.
#[derive(Clone)]
pub struct TumblingEventTimeWindows {
    size_ms: i64,
    offset_ms: i64,
}

impl TumblingEventTimeWindows {
    /// Create tumbling windows of the given `size`, aligned to the epoch.
    pub fn of(size: Duration) -> Self {
        Self {
            size_ms: size.as_millis() as i64,
            offset_ms: 0,
        }
    }

    /// Create tumbling windows with a non-zero alignment `offset`.
    pub fn of_with_offset(size: Duration, offset: Duration) -> Self {
        Self {
            size_ms: size.as_millis() as i64,
            offset_ms: offset.as_millis() as i64,
        }
    }
}

impl<T: Send + Sync> WindowAssigner<T> for TumblingEventTimeWindows {
    fn assign_windows(&self, _element: &T, timestamp: EventTime) -> Vec<TimeWindow> {
        let start = timestamp - (timestamp - self.offset_ms).rem_euclid(self.size_ms);
        vec![TimeWindow::new(start, start + self.size_ms)]
    }
}
