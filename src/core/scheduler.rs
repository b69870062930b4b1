//! Matching of queued patients to available staff.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::{QueueEntry, Severity, StaffMember, StaffRoster, TriageError, TriageQueue};
use crate::util::{PatientId, StaffId};

/// Staff member named in an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedStaff {
    /// Directory id.
    pub id: StaffId,
    /// Display name.
    pub name: String,
}

impl From<&StaffMember> for AssignedStaff {
    fn from(member: &StaffMember) -> Self {
        Self {
            id: member.id.clone(),
            name: member.name.clone(),
        }
    }
}

/// A patient matched to staff. Not retained by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Matched patient.
    pub patient_id: PatientId,
    /// Tier the patient was queued under.
    pub severity: Severity,
    /// Attending doctor.
    pub doctor: AssignedStaff,
    /// Accompanying nurse, critical cases only.
    pub nurse: Option<AssignedStaff>,
    /// Doctor's room, if any.
    pub room_number: Option<String>,
    /// Match time, Unix milliseconds.
    pub assigned_at_ms: u128,
}

/// Threshold-gated batch matcher.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentScheduler {
    min_queue_threshold: usize,
}

impl AssignmentScheduler {
    /// Matcher that only batches once `min_queue_threshold` patients are waiting.
    #[must_use]
    pub const fn new(min_queue_threshold: usize) -> Self {
        Self { min_queue_threshold }
    }

    /// Configured admission threshold.
    #[must_use]
    pub const fn min_queue_threshold(&self) -> usize {
        self.min_queue_threshold
    }

    /// Match the highest-priority entries to the roster's doctors.
    ///
    /// Returns nothing when the queue is below the threshold or no doctor is available;
    /// the queue is left untouched in both cases. Matched entries are removed.
    pub fn try_assign(&self, queue: &mut TriageQueue, roster: &mut StaffRoster) -> Vec<Assignment> {
        if queue.len() < self.min_queue_threshold {
            debug!(
                queue_len = queue.len(),
                threshold = self.min_queue_threshold,
                "below assignment threshold"
            );
            return Vec::new();
        }
        self.assign_all(queue, roster)
    }

    /// Match the highest-priority entries to the roster's doctors regardless of the
    /// threshold. Used for staff-initiated batches.
    pub fn assign_all(&self, queue: &mut TriageQueue, roster: &mut StaffRoster) -> Vec<Assignment> {
        let top = queue.peek_top(roster.doctor_count());
        let mut out = Vec::with_capacity(top.len());
        for entry in top {
            let Some(doctor) = roster.pop_doctor() else {
                break;
            };
            out.push(Self::commit(queue, roster, &entry, &doctor));
        }
        if !out.is_empty() {
            info!(assigned = out.len(), remaining = queue.len(), "batch assignment");
        }
        out
    }

    /// Give the top entry to one specific doctor, ignoring the threshold.
    ///
    /// An empty queue yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// [`TriageError::StaffUnavailable`] when the doctor is not an available doctor in
    /// `roster`.
    pub fn assign_next(
        &self,
        queue: &mut TriageQueue,
        roster: &mut StaffRoster,
        doctor_id: &StaffId,
    ) -> Result<Option<Assignment>, TriageError> {
        let doctor = roster
            .take_doctor(doctor_id)
            .ok_or_else(|| TriageError::StaffUnavailable(doctor_id.clone()))?;
        let Some(entry) = queue.peek_top(1).into_iter().next() else {
            return Ok(None);
        };
        let assignment = Self::commit(queue, roster, &entry, &doctor);
        info!(patient_id = %assignment.patient_id, doctor_id = %doctor_id, "manual assignment");
        Ok(Some(assignment))
    }

    fn commit(
        queue: &mut TriageQueue,
        roster: &mut StaffRoster,
        entry: &QueueEntry,
        doctor: &StaffMember,
    ) -> Assignment {
        let nurse = if entry.severity == Severity::Critical {
            roster.pop_nurse()
        } else {
            None
        };
        queue.dequeue(&entry.patient.id);
        Assignment {
            patient_id: entry.patient.id.clone(),
            severity: entry.severity,
            doctor: doctor.into(),
            nurse: nurse.as_ref().map(AssignedStaff::from),
            room_number: doctor.room_number.clone(),
            assigned_at_ms: queue.now_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::{PatientRef, PriorityFunction, ResourcePool, Vitals, WaitTimeEstimator};
    use crate::util::ManualClock;

    fn queue_with(clock: &ManualClock, patients: &[(&str, Severity)]) -> TriageQueue {
        let mut q = TriageQueue::new(
            PriorityFunction::default(),
            WaitTimeEstimator::default(),
            Arc::new(clock.clone()),
            100,
        );
        for (id, severity) in patients {
            q.enqueue(PatientRef::new(*id, *id), Vitals::default(), *severity, &ResourcePool::default())
                .unwrap();
            clock.advance(std::time::Duration::from_millis(1));
        }
        q
    }

    fn roster(doctors: usize, nurses: usize) -> StaffRoster {
        let mut staff = Vec::new();
        for i in 0..doctors {
            staff.push(StaffMember::doctor(format!("d{i}"), format!("Doctor {i}"), Some("101")));
        }
        for i in 0..nurses {
            staff.push(StaffMember::nurse(format!("n{i}"), format!("Nurse {i}")));
        }
        StaffRoster::from_staff(staff)
    }

    #[test]
    fn below_threshold_is_a_no_op() {
        let clock = ManualClock::default();
        let mut q = queue_with(&clock, &[("a", Severity::Critical)]);
        let out = AssignmentScheduler::new(2).try_assign(&mut q, &mut roster(3, 1));
        assert!(out.is_empty());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn assign_all_ignores_threshold() {
        let clock = ManualClock::default();
        let mut q = queue_with(
            &clock,
            &[("a", Severity::Normal), ("b", Severity::Critical), ("c", Severity::Moderate)],
        );
        let sched = AssignmentScheduler::new(10);
        assert!(sched.try_assign(&mut q, &mut roster(2, 0)).is_empty());

        let out = sched.assign_all(&mut q, &mut roster(2, 0));
        let ids: Vec<_> = out.iter().map(|a| a.patient_id.as_str()).collect();
        assert_eq!(ids, ["b", "c"]);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn no_doctors_leaves_queue_intact() {
        let clock = ManualClock::default();
        let mut q = queue_with(&clock, &[("a", Severity::Normal), ("b", Severity::Normal)]);
        let out = AssignmentScheduler::new(1).try_assign(&mut q, &mut roster(0, 2));
        assert!(out.is_empty());
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn critical_gets_nurse_when_available() {
        let clock = ManualClock::default();
        let mut q = queue_with(
            &clock,
            &[("m", Severity::Moderate), ("c1", Severity::Critical), ("c2", Severity::Critical)],
        );
        let mut r = roster(3, 1);
        let out = AssignmentScheduler::new(1).try_assign(&mut q, &mut r);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].patient_id, PatientId::from("c1"));
        assert_eq!(out[0].nurse.as_ref().map(|n| n.id.as_str()), Some("n0"));
        assert_eq!(out[0].room_number.as_deref(), Some("101"));
        assert_eq!(out[1].patient_id, PatientId::from("c2"));
        assert!(out[1].nurse.is_none());
        assert!(out[2].nurse.is_none());
        assert!(q.is_empty());
    }

    #[test]
    fn assign_next_requires_available_doctor() {
        let clock = ManualClock::default();
        let mut q = queue_with(&clock, &[("a", Severity::Normal)]);
        let sched = AssignmentScheduler::new(10);
        let err = sched
            .assign_next(&mut q, &mut roster(1, 0), &StaffId::from("d9"))
            .unwrap_err();
        assert!(matches!(err, TriageError::StaffUnavailable(_)));
        assert_eq!(q.len(), 1);

        let got = sched
            .assign_next(&mut q, &mut roster(1, 0), &StaffId::from("d0"))
            .unwrap()
            .unwrap();
        assert_eq!(got.patient_id, PatientId::from("a"));
        assert!(sched
            .assign_next(&mut q, &mut roster(1, 0), &StaffId::from("d0"))
            .unwrap()
            .is_none());
    }
}
