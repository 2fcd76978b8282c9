//! Status and progress derivation.
//!
//! Explicit flags outrank the time window: `closed`, then `paused`, then the
//! position of `now` relative to `[start, stop)`.

use moveflow_types::{RawRecord, StreamStatus};

use crate::resolver::{resolve_bool, resolve_u64, FieldSpec};

/// A stream's release window in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: u64,
    pub stop: u64,
}

impl TimeWindow {
    /// Both ends non-zero and `stop > start`.
    pub fn new(start: u64, stop: u64) -> Option<Self> {
        (start != 0 && stop != 0 && stop > start).then_some(Self { start, stop })
    }

    /// Window of a record, if it resolves to a valid one.
    pub fn of(record: &RawRecord) -> Option<Self> {
        let start = resolve_u64(&record.fields, &FieldSpec::START)?;
        let stop = resolve_u64(&record.fields, &FieldSpec::STOP)?;
        Self::new(start, stop)
    }

    pub fn status_at(&self, now: u64) -> StreamStatus {
        if now < self.start {
            StreamStatus::NotStarted
        } else if now >= self.stop {
            StreamStatus::Completed
        } else {
            StreamStatus::Active
        }
    }

    /// Elapsed share of the window, floored, in `[0, 100]`.
    pub fn percent_at(&self, now: u64) -> u64 {
        if now < self.start {
            return 0;
        }
        if now >= self.stop {
            return 100;
        }
        let elapsed = u128::from(now - self.start);
        let total = u128::from(self.stop - self.start);
        ((elapsed * 100) / total).min(100) as u64
    }
}

/// Derive the lifecycle state of a record at `now`.
///
/// Returns `None` for event-derived records that carry neither flags nor a
/// full window.
pub fn derive_status(record: &RawRecord, now: u64) -> Option<StreamStatus> {
    let closed = resolve_bool(&record.fields, &FieldSpec::CLOSED);
    let paused = resolve_bool(&record.fields, &FieldSpec::PAUSED);

    if closed == Some(true) {
        return Some(StreamStatus::Closed);
    }
    if paused == Some(true) {
        return Some(StreamStatus::Paused);
    }
    if let Some(window) = TimeWindow::of(record) {
        return Some(window.status_at(now));
    }
    if record.is_event_derived() && closed.is_none() && paused.is_none() {
        return None;
    }
    Some(StreamStatus::Active)
}

/// Derive progress as `"N%"`, or `None` when the window is unusable.
pub fn derive_progress(record: &RawRecord, now: u64) -> Option<String> {
    if resolve_bool(&record.fields, &FieldSpec::CLOSED) == Some(true) {
        return Some("100%".to_string());
    }
    TimeWindow::of(record).map(|w| format!("{}%", w.percent_at(now)))
}
