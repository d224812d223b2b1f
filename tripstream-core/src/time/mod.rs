use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::types::{EventTime, Watermark};

mod timer_service;
mod watermark;

pub use timer_service::*;
pub use watermark::*;

/// Minimum possible event time. Used as the initial "no watermark" sentinel.
pub const EVENT_TIME_MIN: EventTime = i64::MIN;

/// Maximum possible event time. Used to represent no upper bound.
pub const EVENT_TIME_MAX: EventTime = i64::MAX;

#[cfg(test)]
#[path = "tests/time_tests.rs"]
mod tests;
