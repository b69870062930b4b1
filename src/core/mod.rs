//! Core triage abstractions: classification, scoring, queueing and matching.

pub mod audit;
pub mod classifier;
pub mod collaborators;
pub mod error;
pub mod estimator;
pub mod priority;
pub mod queue;
pub mod resource_pool;
pub mod scheduler;
pub mod severity;
pub mod status;
pub mod vitals;

pub use audit::{
    build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, NoopAuditSink,
};
pub use classifier::{
    build_prompt, Band, Classification, ClassificationSource, ClassifierError, ClassifierStrategy,
    LocalRules, RemoteClassifier, SeverityClassifier, TierBands,
};
pub use collaborators::{
    events, EventNotifier, NewPatientRecord, PatientRecord, RecordStore, RecordUpdate,
    StaffDirectory,
};
pub use error::{AppResult, TriageError};
pub use estimator::WaitTimeEstimator;
pub use priority::PriorityFunction;
pub use queue::{
    ContactSummary, PatientRef, Placement, QueueBoardRow, QueueEntry, QueueStats, TriageQueue,
};
pub use resource_pool::{ResourcePool, StaffMember, StaffRole, StaffRoster};
pub use scheduler::{AssignedStaff, Assignment, AssignmentScheduler};
pub use severity::{Severity, SeverityTable};
pub use status::PatientStatus;
pub use vitals::{BloodPressure, ClinicalReading, Vitals};
