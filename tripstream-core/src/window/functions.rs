use super::*;

/// Incremental aggregation function.
///
/// The accumulator is updated on each incoming element, so only `O(1)`
/// state is kept per (key, window) instead of the element list.
///
/// `emits` is the post-aggregation gate: when a window fires, its result is
/// produced only if the accumulator passes. The accumulator is discarded
/// either way.
pub trait AggregateFunction<K, IN, ACC, OUT>: Send {
    /// Create a fresh accumulator for a new (key, window) pair.
    fn create_accumulator(&self) -> ACC;

    /// Fold one element into the accumulator.
    fn add(&self, acc: &mut ACC, element: &IN);

    /// Whether a fired window's accumulator yields a result at all.
    fn emits(&self, _acc: &ACC) -> bool {
        true
    }

    /// Convert the final accumulator into the window result.
    fn get_result(&self, key: &K, window: &TimeWindow, acc: ACC) -> OUT;
}
