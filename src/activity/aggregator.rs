//! The activity aggregator.
//!
//! A small piece of shared, lock-protected state that accumulates discrete
//! edit events between flush ticks. Event sources (asset added/removed/
//! renamed, object saved) call [`ActivityAggregator::record`] from whatever
//! threads the host delivers callbacks on; the periodic flush calls
//! [`ActivityAggregator::take_snapshot`], which atomically copies and resets
//! the counters. Network I/O never happens under the lock.

use std::str::FromStr;
use std::sync::Mutex;

use crate::error::WakabeatError;

/// Minimum spacing in seconds between accepted events. Events arriving
/// sooner after the last accepted event (of any kind) are dropped. The
/// window is global per aggregator, not per event kind: a flurry of mixed
/// add/remove/save events collapses to whichever one lands first.
pub const DEBOUNCE_WINDOW_SECS: i64 = 2;

/// Sentinel entity name when no save was recorded this period.
const NO_ENTITY: &str = "None";

/// A discrete editor edit event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Add,
    Remove,
    Rename,
    Save,
}

impl FromStr for EventKind {
    type Err = WakabeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(EventKind::Add),
            "remove" => Ok(EventKind::Remove),
            "rename" => Ok(EventKind::Rename),
            "save" => Ok(EventKind::Save),
            other => Err(WakabeatError::Feed(format!(
                "unknown event kind '{}'",
                other
            ))),
        }
    }
}

/// Counters and debounce state guarded by the aggregator's lock.
#[derive(Debug)]
struct AggregatedActivity {
    dirty: bool,
    add_count: u32,
    delete_count: u32,
    rename_count: u32,
    save_count: u32,
    last_saved_entity: String,
    last_event_timestamp: i64,
}

impl AggregatedActivity {
    fn new() -> Self {
        Self {
            dirty: false,
            add_count: 0,
            delete_count: 0,
            rename_count: 0,
            save_count: 0,
            last_saved_entity: NO_ENTITY.to_string(),
            last_event_timestamp: 0,
        }
    }
}

/// An immutable copy of one flush period's activity, taken at reset time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySnapshot {
    pub add_count: u32,
    pub delete_count: u32,
    pub rename_count: u32,
    pub save_count: u32,
    pub last_saved_entity: String,
}

impl ActivitySnapshot {
    /// True iff any save event landed in this period.
    pub fn is_write(&self) -> bool {
        self.save_count > 0
    }

    /// Aggregate "lines" figure for the rich schema (adds plus saves).
    pub fn lines(&self) -> u32 {
        self.add_count + self.save_count
    }
}

/// Accumulates edit events and hands out snapshot-and-reset copies.
///
/// Created once at service startup and shared (behind `Arc`) between the
/// event feed and the heartbeat service. Supports concurrent recorders and
/// a concurrent snapshotting reader; the single internal mutex is held only
/// for in-memory mutation.
pub struct ActivityAggregator {
    state: Mutex<AggregatedActivity>,
}

impl ActivityAggregator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AggregatedActivity::new()),
        }
    }

    /// Record one edit event at `timestamp` (unix seconds).
    ///
    /// Events inside the debounce window of the last accepted event are
    /// dropped without mutating anything. Never fails; a poisoned lock
    /// (a panicked recorder) is unrecoverable for telemetry counters, so
    /// the poisoned state is reused as-is.
    pub fn record(&self, kind: EventKind, timestamp: i64, entity: Option<&str>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if timestamp - state.last_event_timestamp < DEBOUNCE_WINDOW_SECS {
            return;
        }
        state.last_event_timestamp = timestamp;
        state.dirty = true;

        match kind {
            EventKind::Add => state.add_count += 1,
            EventKind::Remove => state.delete_count += 1,
            EventKind::Rename => state.rename_count += 1,
            EventKind::Save => {
                state.save_count += 1;
                if let Some(name) = entity {
                    state.last_saved_entity = name.to_string();
                }
            }
        }
    }

    /// Atomically copy and reset the accumulated state.
    ///
    /// Returns `None` when clean (the common case: one flag read under the
    /// lock, no allocation). When dirty, every counter is zeroed and the
    /// dirty flag cleared in the same critical section that produces the
    /// snapshot, so an event recorded concurrently lands in exactly one
    /// snapshot: this one or the next.
    pub fn take_snapshot(&self) -> Option<ActivitySnapshot> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if !state.dirty {
            return None;
        }

        let snapshot = ActivitySnapshot {
            add_count: state.add_count,
            delete_count: state.delete_count,
            rename_count: state.rename_count,
            save_count: state.save_count,
            last_saved_entity: state.last_saved_entity.clone(),
        };

        state.add_count = 0;
        state.delete_count = 0;
        state.rename_count = 0;
        state.save_count = 0;
        state.last_saved_entity = NO_ENTITY.to_string();
        state.dirty = false;

        Some(snapshot)
    }

    /// Whether unflushed activity exists. Test/diagnostic accessor.
    pub fn is_dirty(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .dirty
    }
}

impl Default for ActivityAggregator {
    fn default() -> Self {
        Self::new()
    }
}
