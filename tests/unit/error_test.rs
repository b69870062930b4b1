//! Tests for error types

use triage_scheduler::core::{PatientStatus, TriageError};

#[test]
fn test_error_display() {
    let err = TriageError::DuplicatePatient("P-1".into());
    assert_eq!(err.to_string(), "patient P-1 is already queued");

    let err = TriageError::InvalidTransition {
        from: PatientStatus::Assigned,
        to: PatientStatus::Queued,
    };
    assert_eq!(err.to_string(), "invalid status transition from Assigned to Queued");

    let err = TriageError::StaffUnavailable("d7".into());
    assert_eq!(err.to_string(), "staff member d7 not found or not available");

    assert_eq!(TriageError::ServiceStopped.to_string(), "triage service stopped");
}

#[test]
fn test_invalid_input_class() {
    assert!(TriageError::InvalidInput("x".into()).is_invalid_input());
    assert!(TriageError::DuplicatePatient("p".into()).is_invalid_input());
    assert!(TriageError::StaffUnavailable("d".into()).is_invalid_input());
    assert!(TriageError::UnknownPatient("p".into()).is_invalid_input());
    assert!(!TriageError::QueueFull("full".into()).is_invalid_input());
    assert!(!TriageError::Backend("down".into()).is_invalid_input());
    assert!(!TriageError::ServiceStopped.is_invalid_input());
}

#[test]
fn test_error_into_anyhow() {
    fn app() -> triage_scheduler::core::AppResult<()> {
        Err(TriageError::QueueFull("1000 waiting".into()))?;
        Ok(())
    }
    let err = app().unwrap_err();
    assert_eq!(err.to_string(), "queue full: 1000 waiting");
    assert!(err.downcast_ref::<TriageError>().is_some());
}
