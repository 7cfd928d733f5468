//! Activity aggregation - accumulates editor edit events between flushes.

mod aggregator;

pub use aggregator::{ActivityAggregator, ActivitySnapshot, EventKind, DEBOUNCE_WINDOW_SECS};
