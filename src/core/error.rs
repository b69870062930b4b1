//! Error types for triage and scheduling operations.

use thiserror::Error;

use crate::core::PatientStatus;
use crate::util::{PatientId, StaffId};

/// Errors produced by triage components.
#[derive(Debug, Error)]
pub enum TriageError {
    /// Request data failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The patient already has a queue entry.
    #[error("patient {0} is already queued")]
    DuplicatePatient(PatientId),
    /// Status change is not allowed.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: PatientStatus,
        /// Requested status.
        to: PatientStatus,
    },
    /// Requested staff member is unknown or not available.
    #[error("staff member {0} not found or not available")]
    StaffUnavailable(StaffId),
    /// No record exists for the patient.
    #[error("patient {0} not found")]
    UnknownPatient(PatientId),
    /// Queue is at its configured depth.
    #[error("queue full: {0}")]
    QueueFull(String),
    /// Collaborator failure with context.
    #[error("backend error: {0}")]
    Backend(String),
    /// The scheduler loop is no longer running.
    #[error("triage service stopped")]
    ServiceStopped,
}

impl TriageError {
    /// True for errors caused by the caller's request rather than system state.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::DuplicatePatient(_)
                | Self::InvalidTransition { .. }
                | Self::StaffUnavailable(_)
                | Self::UnknownPatient(_)
        )
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
