//! Patient record status and the transitions the scheduler accepts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::TriageError;

/// Lifecycle status stored on the patient record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientStatus {
    /// Registered, not yet triaged.
    Waiting,
    /// Triaged and holding a queue entry.
    Queued,
    /// Matched to a doctor.
    Assigned,
    /// Being seen.
    InProgress,
    /// Treatment finished.
    Completed,
    /// Left the facility.
    Discharged,
}

impl PatientStatus {
    const fn rank(self) -> u8 {
        match self {
            Self::Waiting => 0,
            Self::Queued => 1,
            Self::Assigned => 2,
            Self::InProgress => 3,
            Self::Completed => 4,
            Self::Discharged => 5,
        }
    }

    /// Whether a patient in this status must not hold a queue entry.
    #[must_use]
    pub const fn leaves_queue(self) -> bool {
        self.rank() >= Self::Assigned.rank()
    }

    /// Check a requested change.
    ///
    /// Transitions only move forward, and `Discharged` is reachable only from
    /// `Completed`. Re-applying the current status is accepted.
    ///
    /// # Errors
    ///
    /// [`TriageError::InvalidTransition`] when the change is not allowed.
    pub fn check_transition(self, to: Self) -> Result<(), TriageError> {
        let forward = to.rank() >= self.rank();
        let discharge_ok =
            !matches!(to, Self::Discharged) || matches!(self, Self::Completed | Self::Discharged);
        if forward && discharge_ok {
            Ok(())
        } else {
            Err(TriageError::InvalidTransition { from: self, to })
        }
    }

    /// Display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::Queued => "Queued",
            Self::Assigned => "Assigned",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Discharged => "Discharged",
        }
    }
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
