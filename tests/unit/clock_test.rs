//! Tests for clocks and identifiers

use std::time::Duration;

use triage_scheduler::util::{minutes_between, Clock, ManualClock, PatientId, SystemClock};

#[test]
fn test_manual_clock_advances_shared_time() {
    let clock = ManualClock::new(1_000);
    let observer = clock.clone();
    clock.advance(Duration::from_millis(500));
    clock.advance_minutes(2);
    assert_eq!(observer.now_ms(), 1_000 + 500 + 120_000);
    clock.set(42);
    assert_eq!(observer.now_ms(), 42);
}

#[test]
fn test_minutes_between_saturates() {
    assert!((minutes_between(0, 90_000) - 1.5).abs() < f64::EPSILON);
    assert!(minutes_between(90_000, 0).abs() < f64::EPSILON);
}

#[test]
fn test_system_clock_is_recent() {
    assert!(SystemClock.now_ms() > 1_600_000_000_000);
}

#[test]
fn test_generated_patient_ids() {
    let a = PatientId::generate();
    let b = PatientId::generate();
    assert!(a.as_str().starts_with("P-"));
    assert_ne!(a, b);
    assert_eq!(serde_json::to_string(&PatientId::from("P-1")).unwrap(), "\"P-1\"");
}
