//! Audit trail of queue and assignment decisions.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::util::PatientId;

/// What happened to a patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    /// Entered the queue.
    Enqueued,
    /// Matched to staff.
    Assigned,
    /// Left the queue without an assignment.
    Removed,
    /// Record status changed.
    StatusChanged,
    /// Remote classification failed and local rules decided.
    ClassifierFallback,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Enqueued => "enqueued",
            Self::Assigned => "assigned",
            Self::Removed => "removed",
            Self::StatusChanged => "status_changed",
            Self::ClassifierFallback => "classifier_fallback",
        };
        f.write_str(s)
    }
}

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Patient concerned.
    pub patient_id: PatientId,
    /// Action taken.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub payload: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// Bounded in-memory sink. Clones share the same buffer.
#[derive(Debug, Clone)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Stored events for one patient, oldest first.
    #[must_use]
    pub fn events_for(&self, patient_id: &PatientId) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| &e.patient_id == patient_id)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        let mut events = self.events.lock();
        if self.max_events == 0 {
            return;
        }
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&mut self, _event: AuditEvent) {}
}

/// Build an event with a fresh id, stamped at `created_at_ms`.
///
/// Callers pass the time from the same clock that stamps queue entries.
pub fn build_audit_event(
    patient_id: PatientId,
    action: AuditAction,
    payload: Option<String>,
    created_at_ms: u128,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        patient_id,
        action,
        created_at_ms,
        payload,
    }
}
