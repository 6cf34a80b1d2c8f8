//! Event sink adapters.

use crate::errors::EventError;
use crate::ports::EventSink;
use parking_lot::RwLock;
use shared_bus::{EventPublisher, InMemoryEventBus, SwitchEvent};

/// Publishing to the shared bus fails when nobody listens, so callers can
/// tell dropped notifications apart.
impl EventSink for InMemoryEventBus {
    fn notify(&self, event: SwitchEvent) -> Result<(), EventError> {
        match self.publish(event) {
            0 => Err(EventError::NoSubscribers),
            _ => Ok(()),
        }
    }
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: RwLock<Vec<SwitchEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SwitchEvent> {
        self.events.read().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }
}

impl EventSink for RecordingEventSink {
    fn notify(&self, event: SwitchEvent) -> Result<(), EventError> {
        self.events.write().push(event);
        Ok(())
    }
}
