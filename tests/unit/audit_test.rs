//! Tests for audit sinks

use triage_scheduler::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);
    let event = build_audit_event("P-1".into(), AuditAction::Enqueued, Some("Critical at position 1".into()), 1_000);
    sink.record(event);

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].patient_id.as_str(), "P-1");
    assert_eq!(events[0].action, AuditAction::Enqueued);
    assert_eq!(events[0].payload.as_deref(), Some("Critical at position 1"));
    assert_eq!(events[0].created_at_ms, 1_000);
}

#[test]
fn test_audit_sink_bounded() {
    let mut sink = InMemoryAuditSink::new(3);
    for i in 0..5 {
        sink.record(build_audit_event(format!("P-{i}").into(), AuditAction::Removed, None, i));
    }
    let events = sink.events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].patient_id.as_str(), "P-2");
}

#[test]
fn test_audit_event_ids_unique() {
    let a = build_audit_event("P-1".into(), AuditAction::Assigned, None, 0);
    let b = build_audit_event("P-1".into(), AuditAction::Assigned, None, 0);
    assert_ne!(a.event_id, b.event_id);
    assert_eq!(AuditAction::ClassifierFallback.to_string(), "classifier_fallback");
}
