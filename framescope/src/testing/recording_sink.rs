use std::sync::{Arc, Mutex};

use crate::{Event, EventType, Sink, internal::lock};

/// A sink keeping every event it receives.
///
/// Clones share the same record, so a test keeps one clone and installs
/// another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events received so far, in delivery order.
    pub fn events(&self) -> Vec<Event> {
        lock(&self.events).clone()
    }

    /// Events of one type, in delivery order.
    pub fn events_of(&self, event_type: EventType) -> Vec<Event> {
        lock(&self.events)
            .iter()
            .filter(|e| e.event_type() == event_type)
            .copied()
            .collect()
    }

    /// Number of events of one type received so far.
    pub fn count(&self, event_type: EventType) -> usize {
        lock(&self.events)
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }

    pub fn len(&self) -> usize {
        lock(&self.events).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.events).is_empty()
    }

    pub fn clear(&self) {
        lock(&self.events).clear();
    }
}

impl Sink for RecordingSink {
    fn log(&self, event: &Event) {
        lock(&self.events).push(*event);
    }
}
