//! In-memory patient record store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::core::{NewPatientRecord, PatientRecord, PatientStatus, RecordStore, RecordUpdate, TriageError};
use crate::util::{Clock, PatientId, SystemClock};

/// Record store kept in a hash map, for development and tests.
#[derive(Clone)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<PatientId, PatientRecord>>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl InMemoryRecordStore {
    /// Empty store stamping records with `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// True when no record exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Every record, oldest registration first.
    #[must_use]
    pub fn all(&self) -> Vec<PatientRecord> {
        let mut out: Vec<_> = self.records.read().values().cloned().collect();
        out.sort_by(|a, b| a.registered_at_ms.cmp(&b.registered_at_ms).then_with(|| a.id.cmp(&b.id)));
        out
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create_record(&self, record: NewPatientRecord) -> Result<PatientId, TriageError> {
        let id = PatientId::generate();
        let now = self.clock.now_ms();
        self.records.write().insert(
            id.clone(),
            PatientRecord {
                id: id.clone(),
                contact: record.contact,
                vitals: record.vitals,
                notes: record.notes,
                severity: None,
                status: PatientStatus::Waiting,
                assignment: None,
                queue_position: None,
                registered_at_ms: now,
                updated_at_ms: now,
                completed_at_ms: None,
            },
        );
        Ok(id)
    }

    async fn update_record(&self, id: &PatientId, update: RecordUpdate) -> Result<(), TriageError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(id)
            .ok_or_else(|| TriageError::UnknownPatient(id.clone()))?;
        if let Some(severity) = update.severity {
            record.severity = Some(severity);
        }
        if let Some(status) = update.status {
            record.status = status;
        }
        if let Some(assignment) = update.assignment {
            record.assignment = Some(assignment);
        }
        if let Some(position) = update.queue_position {
            record.queue_position = Some(position);
        }
        if let Some(completed) = update.completed_at_ms {
            record.completed_at_ms = Some(completed);
        }
        record.updated_at_ms = self.clock.now_ms();
        Ok(())
    }

    async fn get_record(&self, id: &PatientId) -> Result<Option<PatientRecord>, TriageError> {
        Ok(self.records.read().get(id).cloned())
    }

    async fn delete_record(&self, id: &PatientId) -> Result<bool, TriageError> {
        Ok(self.records.write().remove(id).is_some())
    }
}
