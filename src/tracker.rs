//! Output tracking for boundary wrappers.
//!
//! # Responsibilities
//! - Record every value a wrapper writes through its output operation
//! - Hand out independent, append-only records per subscription
//!
//! # Design Decisions
//! - Observer list attached at subscription time; emitting with no
//!   subscribers is free apart from a lock
//! - Each tracker owns its record; trackers attached to the same
//!   wrapper never share history

use std::sync::{Arc, Mutex};

/// Subscription point embedded in a boundary wrapper.
///
/// The wrapper calls [`emit`](OutputListener::emit) for every value it
/// writes; every tracker created by [`track`](OutputListener::track)
/// before that point records the value.
pub struct OutputListener<T> {
    trackers: Mutex<Vec<Arc<Mutex<Vec<T>>>>>,
}

impl<T: Clone> OutputListener<T> {
    pub fn new() -> Self {
        Self {
            trackers: Mutex::new(Vec::new()),
        }
    }

    /// Attach a new, independent tracker.
    pub fn track(&self) -> OutputTracker<T> {
        let records = Arc::new(Mutex::new(Vec::new()));
        self.trackers.lock().unwrap().push(records.clone());
        OutputTracker { records }
    }

    pub fn is_tracking(&self) -> bool {
        !self.trackers.lock().unwrap().is_empty()
    }

    /// Append `value` to every attached tracker.
    pub fn emit(&self, value: T) {
        let trackers = self.trackers.lock().unwrap();
        for records in trackers.iter() {
            records.lock().unwrap().push(value.clone());
        }
    }
}

impl<T: Clone> Default for OutputListener<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered, append-only record of everything written through a
/// wrapper's output operation since the tracker was attached.
pub struct OutputTracker<T> {
    records: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone> OutputTracker<T> {
    /// Snapshot of the recorded values, in write order.
    pub fn data(&self) -> Vec<T> {
        self.records.lock().unwrap().clone()
    }

    /// Take the recorded values, leaving the tracker empty.
    pub fn clear(&self) -> Vec<T> {
        std::mem::take(&mut *self.records.lock().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_emitted_values_in_order() {
        let listener = OutputListener::new();
        let tracker = listener.track();

        listener.emit("one");
        listener.emit("two");

        assert_eq!(tracker.data(), ["one", "two"]);
    }

    #[test]
    fn ignores_values_emitted_before_tracking_started() {
        let listener = OutputListener::new();
        listener.emit("early");

        let tracker = listener.track();
        listener.emit("late");

        assert_eq!(tracker.data(), ["late"]);
    }

    #[test]
    fn trackers_are_independent() {
        let listener = OutputListener::new();
        let first = listener.track();
        let second = listener.track();

        listener.emit(1);
        first.clear();
        listener.emit(2);

        assert_eq!(first.data(), [2]);
        assert_eq!(second.data(), [1, 2]);
    }

    #[test]
    fn clear_takes_the_recorded_values() {
        let listener = OutputListener::new();
        let tracker = listener.track();

        listener.emit("kept");
        assert_eq!(tracker.clear(), ["kept"]);
        assert!(tracker.data().is_empty());
    }
}
