//! Interfaces to the systems the scheduler reports to and reads from.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{Assignment, ContactSummary, PatientStatus, Severity, StaffMember, TriageError, Vitals};
use crate::util::PatientId;

/// Data needed to open a patient record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPatientRecord {
    /// Contact details.
    pub contact: ContactSummary,
    /// Vitals at registration.
    pub vitals: Vitals,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// Persisted patient record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Record id.
    pub id: PatientId,
    /// Contact details.
    pub contact: ContactSummary,
    /// Vitals at registration.
    pub vitals: Vitals,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Tier once classified.
    pub severity: Option<Severity>,
    /// Lifecycle status.
    pub status: PatientStatus,
    /// Staff match, once assigned.
    pub assignment: Option<Assignment>,
    /// Last reported queue position.
    pub queue_position: Option<usize>,
    /// Creation time, Unix milliseconds.
    pub registered_at_ms: u128,
    /// Last update time, Unix milliseconds.
    pub updated_at_ms: u128,
    /// Set when the status first becomes Completed.
    pub completed_at_ms: Option<u128>,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordUpdate {
    /// New tier.
    pub severity: Option<Severity>,
    /// New status.
    pub status: Option<PatientStatus>,
    /// New assignment.
    pub assignment: Option<Assignment>,
    /// New queue position.
    pub queue_position: Option<usize>,
    /// Completion stamp.
    pub completed_at_ms: Option<u128>,
}

/// Patient record persistence.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a record in status Waiting and return its id.
    async fn create_record(&self, record: NewPatientRecord) -> Result<PatientId, TriageError>;

    /// Apply a partial update. Unknown ids fail with [`TriageError::UnknownPatient`].
    async fn update_record(&self, id: &PatientId, update: RecordUpdate) -> Result<(), TriageError>;

    /// Fetch a record.
    async fn get_record(&self, id: &PatientId) -> Result<Option<PatientRecord>, TriageError>;

    /// Remove a record. Returns whether one existed.
    async fn delete_record(&self, id: &PatientId) -> Result<bool, TriageError>;
}

/// Source of staff availability.
#[async_trait]
pub trait StaffDirectory: Send + Sync {
    /// Staff currently free to take a patient. Called fresh for every pass.
    async fn list_available_staff(&self) -> Result<Vec<StaffMember>, TriageError>;
}

/// Fire-and-forget event publication.
#[async_trait]
pub trait EventNotifier: Send + Sync {
    /// Publish `payload` under `event`.
    async fn publish(&self, event: &str, payload: serde_json::Value) -> Result<(), TriageError>;
}

/// Event names published by the service.
pub mod events {
    /// A patient entered the queue.
    pub const PATIENT_QUEUED: &str = "patientQueued";
    /// A patient was matched to staff.
    pub const PATIENT_ASSIGNED: &str = "patientAssigned";
    /// A patient's status changed.
    pub const PATIENT_STATUS_UPDATED: &str = "patientStatusUpdated";
    /// Queue contents changed outside a registration.
    pub const QUEUE_UPDATED: &str = "queueUpdated";
}
