//! In-memory event notifier.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

use crate::core::{EventNotifier, TriageError};
use crate::util::now_ms;

/// One published event.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    /// Event name.
    pub name: String,
    /// Event payload.
    pub payload: serde_json::Value,
    /// Publication time, Unix milliseconds.
    pub published_at_ms: u128,
}

/// Keeps the most recent events in a bounded buffer. Clones share the buffer.
#[derive(Debug, Clone)]
pub struct InMemoryNotifier {
    events: Arc<Mutex<VecDeque<PublishedEvent>>>,
    max_events: usize,
}

impl Default for InMemoryNotifier {
    fn default() -> Self {
        Self::new(1_024)
    }
}

impl InMemoryNotifier {
    /// Notifier keeping at most `max_events`.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            max_events,
        }
    }

    /// Snapshot of stored events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<PublishedEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Stored events with the given name.
    #[must_use]
    pub fn named(&self, name: &str) -> Vec<PublishedEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.name == name)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventNotifier for InMemoryNotifier {
    async fn publish(&self, event: &str, payload: serde_json::Value) -> Result<(), TriageError> {
        trace!(event, "publish");
        let mut events = self.events.lock();
        if self.max_events == 0 {
            return Ok(());
        }
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(PublishedEvent {
            name: event.to_owned(),
            payload,
            published_at_ms: now_ms(),
        });
        Ok(())
    }
}
