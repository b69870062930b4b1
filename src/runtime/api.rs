//! Request and response models exposed to the surrounding web layer.

use serde::{Deserialize, Serialize};

use crate::core::{Assignment, ContactSummary, PatientStatus, Severity, SeverityTable, Vitals};
use crate::util::PatientId;

/// Patient registration payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// Contact details; the name is required.
    pub contact: ContactSummary,
    /// Vitals; heart rate, body temperature and blood pressure are required.
    pub vitals: Vitals,
    /// Free-text notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationReceipt {
    /// Id issued by the record store.
    pub patient_id: PatientId,
    /// Assigned tier.
    pub severity: Severity,
    /// Record status after registration.
    pub status: PatientStatus,
    /// 1-based queue position.
    pub position: usize,
    /// Estimated minutes until seen.
    pub estimated_wait_minutes: u64,
    /// Human-readable summary.
    pub message: String,
}

/// Result of one batch assignment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentReport {
    /// Assignments made, in priority order.
    pub assignments: Vec<Assignment>,
    /// Critical patients assigned.
    pub critical: usize,
    /// Moderate patients assigned.
    pub moderate: usize,
    /// Normal patients assigned.
    pub normal: usize,
    /// Total assigned.
    pub total: usize,
}

impl AssignmentReport {
    /// Tally a list of assignments.
    #[must_use]
    pub fn from_assignments(assignments: Vec<Assignment>) -> Self {
        let mut counts = SeverityTable::<usize>::default();
        for a in &assignments {
            *counts.get_mut(a.severity) += 1;
        }
        Self {
            critical: counts.critical,
            moderate: counts.moderate,
            normal: counts.normal,
            total: assignments.len(),
            assignments,
        }
    }

    /// Summary line, "no patients assigned" when empty.
    #[must_use]
    pub fn message(&self) -> String {
        if self.total == 0 {
            return "no patients assigned".to_owned();
        }
        format!(
            "assigned {} patients ({} critical, {} moderate, {} normal)",
            self.total, self.critical, self.moderate, self.normal
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AssignedStaff;

    fn assignment(id: &str, severity: Severity) -> Assignment {
        Assignment {
            patient_id: id.into(),
            severity,
            doctor: AssignedStaff {
                id: "d1".into(),
                name: "Ada".into(),
            },
            nurse: None,
            room_number: None,
            assigned_at_ms: 0,
        }
    }

    #[test]
    fn report_tallies_tiers() {
        let report = AssignmentReport::from_assignments(vec![
            assignment("a", Severity::Critical),
            assignment("b", Severity::Normal),
            assignment("c", Severity::Normal),
        ]);
        assert_eq!((report.critical, report.moderate, report.normal, report.total), (1, 0, 2, 3));
        assert_eq!(report.message(), "assigned 3 patients (1 critical, 0 moderate, 2 normal)");
        assert_eq!(AssignmentReport::default().message(), "no patients assigned");
    }

    #[test]
    fn request_parses_combined_blood_pressure() {
        let req: RegistrationRequest = serde_json::from_str(
            r#"{
                "contact": { "name": "Ada", "phone": null, "email": null },
                "vitals": { "heart_rate": 88, "blood_pressure": "120/80", "body_temperature": 36.9 }
            }"#,
        )
        .unwrap();
        assert!((req.vitals.reading().unwrap().systolic - 120.0).abs() < f64::EPSILON);
        assert!(req.notes.is_none());
    }
}
