//! Ordered collection of waiting patients.
//!
//! Entries are kept sorted by priority score (descending), then entry time, then
//! insertion sequence, which makes the order total and FIFO among equal scores.
//! Scores only change on [`TriageQueue::rerank`], which every ordered read performs first.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{
    PriorityFunction, ResourcePool, Severity, SeverityTable, TriageError, Vitals,
    WaitTimeEstimator,
};
use crate::util::{minutes_between, Clock, PatientId};

/// Contact details copied from the patient record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSummary {
    /// Full name.
    pub name: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Email address.
    pub email: Option<String>,
}

/// Handle to a patient owned by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRef {
    /// Record-store id.
    pub id: PatientId,
    /// Contact snapshot.
    pub contact: ContactSummary,
    /// Free-text notes.
    pub notes: Option<String>,
}

impl PatientRef {
    /// Reference with only an id and a name.
    pub fn new(id: impl Into<PatientId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            contact: ContactSummary {
                name: name.into(),
                ..ContactSummary::default()
            },
            notes: None,
        }
    }
}

/// A waiting patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Patient handle.
    pub patient: PatientRef,
    /// Vitals at enqueue time.
    pub vitals: Vitals,
    /// Tier fixed at enqueue.
    pub severity: Severity,
    /// Enqueue time, Unix milliseconds.
    pub entry_time_ms: u128,
    /// Score as of the last rerank.
    pub priority_score: f64,
    /// Insertion counter.
    pub sequence: u64,
}

impl QueueEntry {
    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .priority_score
            .total_cmp(&self.priority_score)
            .then(self.entry_time_ms.cmp(&other.entry_time_ms))
            .then(self.sequence.cmp(&other.sequence))
    }
}

/// Where a newly queued patient landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// 1-based queue position.
    pub position: usize,
    /// Estimated minutes until seen.
    pub estimated_wait_minutes: u64,
    /// Tier the entry was queued under.
    pub severity: Severity,
}

/// Aggregate queue statistics. All zero for an empty queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Entries queued.
    pub count: usize,
    /// Mean minutes waited.
    pub avg_wait_minutes: f64,
    /// Shortest wait.
    pub min_wait_minutes: f64,
    /// Longest wait.
    pub max_wait_minutes: f64,
    /// Entries per tier.
    pub count_by_severity: SeverityTable<usize>,
}

/// One row of the waiting-room board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueBoardRow {
    /// 1-based position.
    pub position: usize,
    /// Patient id.
    pub patient_id: PatientId,
    /// Patient name.
    pub name: String,
    /// Tier.
    pub severity: Severity,
    /// Current score.
    pub priority_score: f64,
    /// Minutes waited so far.
    pub wait_minutes: f64,
    /// Estimated minutes still to wait.
    pub estimated_remaining_minutes: u64,
}

/// Priority queue of waiting patients.
pub struct TriageQueue {
    entries: Vec<QueueEntry>,
    priority: PriorityFunction,
    estimator: WaitTimeEstimator,
    clock: Arc<dyn Clock>,
    next_sequence: u64,
    max_depth: usize,
}

impl fmt::Debug for TriageQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriageQueue")
            .field("len", &self.entries.len())
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

impl TriageQueue {
    /// Empty queue holding at most `max_depth` entries.
    #[must_use]
    pub fn new(
        priority: PriorityFunction,
        estimator: WaitTimeEstimator,
        clock: Arc<dyn Clock>,
        max_depth: usize,
    ) -> Self {
        Self {
            entries: Vec::new(),
            priority,
            estimator,
            clock,
            next_sequence: 0,
            max_depth,
        }
    }

    /// Current time according to the injected clock.
    #[must_use]
    pub fn now_ms(&self) -> u128 {
        self.clock.now_ms()
    }

    /// Insert a classified patient and report where it landed.
    ///
    /// # Errors
    ///
    /// [`TriageError::DuplicatePatient`] when the id is already queued and
    /// [`TriageError::QueueFull`] at the configured depth.
    pub fn enqueue(
        &mut self,
        patient: PatientRef,
        vitals: Vitals,
        severity: Severity,
        pool: &ResourcePool,
    ) -> Result<Placement, TriageError> {
        if self.contains(&patient.id) {
            return Err(TriageError::DuplicatePatient(patient.id));
        }
        if self.entries.len() >= self.max_depth {
            return Err(TriageError::QueueFull(format!(
                "{} patients waiting (max {})",
                self.entries.len(),
                self.max_depth
            )));
        }
        let id = patient.id.clone();
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.push(QueueEntry {
            patient,
            vitals,
            severity,
            entry_time_ms: self.clock.now_ms(),
            priority_score: self.priority.score(severity, 0.0),
            sequence,
        });
        self.rerank();

        let idx = self
            .index_of(&id)
            .ok_or_else(|| TriageError::Backend(format!("patient {id} vanished after insert")))?;
        let placement = Placement {
            position: idx + 1,
            estimated_wait_minutes: self.estimate_at(idx, pool),
            severity,
        };
        debug!(patient_id = %id, position = placement.position, severity = %severity, "queued");
        Ok(placement)
    }

    /// Remove an entry. Others keep their relative order.
    pub fn dequeue(&mut self, id: &PatientId) -> Option<QueueEntry> {
        let idx = self.index_of(id)?;
        Some(self.entries.remove(idx))
    }

    /// Recompute every score from the clock and re-sort.
    pub fn rerank(&mut self) {
        let now = self.clock.now_ms();
        for entry in &mut self.entries {
            let waited = minutes_between(entry.entry_time_ms, now);
            entry.priority_score = self.priority.score(entry.severity, waited);
        }
        self.entries.sort_by(QueueEntry::rank_cmp);
    }

    /// Rerank, then clone the first `n` entries.
    pub fn peek_top(&mut self, n: usize) -> Vec<QueueEntry> {
        self.rerank();
        self.entries.iter().take(n).cloned().collect()
    }

    /// 1-based position as of the last rerank.
    #[must_use]
    pub fn position_of(&self, id: &PatientId) -> Option<usize> {
        self.index_of(id).map(|i| i + 1)
    }

    /// Whether `id` is queued.
    #[must_use]
    pub fn contains(&self, id: &PatientId) -> bool {
        self.index_of(id).is_some()
    }

    /// Number of waiting entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nobody is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rerank, then clone every entry in order.
    pub fn snapshot_all(&mut self) -> Vec<QueueEntry> {
        self.rerank();
        self.entries.clone()
    }

    /// Wait statistics at the current time.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> QueueStats {
        if self.entries.is_empty() {
            return QueueStats::default();
        }
        let now = self.clock.now_ms();
        let mut stats = QueueStats {
            count: self.entries.len(),
            min_wait_minutes: f64::INFINITY,
            ..QueueStats::default()
        };
        let mut total = 0.0;
        for entry in &self.entries {
            let waited = minutes_between(entry.entry_time_ms, now);
            total += waited;
            stats.min_wait_minutes = stats.min_wait_minutes.min(waited);
            stats.max_wait_minutes = stats.max_wait_minutes.max(waited);
            *stats.count_by_severity.get_mut(entry.severity) += 1;
        }
        stats.avg_wait_minutes = total / stats.count as f64;
        stats
    }

    /// Remaining-wait estimate for a queued patient, using the current order.
    #[must_use]
    pub fn estimate_for(&self, id: &PatientId, pool: &ResourcePool) -> Option<u64> {
        self.index_of(id).map(|idx| self.estimate_at(idx, pool))
    }

    /// Rerank, then describe every entry for display.
    pub fn board(&mut self, pool: &ResourcePool) -> Vec<QueueBoardRow> {
        self.rerank();
        let now = self.clock.now_ms();
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, e)| QueueBoardRow {
                position: idx + 1,
                patient_id: e.patient.id.clone(),
                name: e.patient.contact.name.clone(),
                severity: e.severity,
                priority_score: e.priority_score,
                wait_minutes: minutes_between(e.entry_time_ms, now),
                estimated_remaining_minutes: self.estimate_at(idx, pool),
            })
            .collect()
    }

    /// Board rows for one tier, positions still relative to the whole queue.
    pub fn by_severity(&mut self, severity: Severity, pool: &ResourcePool) -> Vec<QueueBoardRow> {
        self.board(pool)
            .into_iter()
            .filter(|row| row.severity == severity)
            .collect()
    }

    fn index_of(&self, id: &PatientId) -> Option<usize> {
        self.entries.iter().position(|e| &e.patient.id == id)
    }

    fn estimate_at(&self, idx: usize, pool: &ResourcePool) -> u64 {
        let ahead: Vec<Severity> = self.entries[..idx].iter().map(|e| e.severity).collect();
        self.estimator
            .estimate(self.entries[idx].severity, &ahead, pool)
    }
}
