//! Available staff and room capacity for one scheduling pass.
//!
//! The staff directory owns availability. Each pass takes a fresh snapshot as a
//! [`StaffRoster`]; matching pops members off the roster so one pass never hands the
//! same doctor or nurse to two patients.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::util::StaffId;

/// Clinical role of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaffRole {
    /// Can take a patient on their own.
    Doctor,
    /// Accompanies a doctor on critical cases.
    Nurse,
}

/// One available staff member as reported by the staff directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    /// Directory id.
    pub id: StaffId,
    /// Role.
    pub role: StaffRole,
    /// Display name.
    pub name: String,
    /// Room the member works from, if any.
    pub room_number: Option<String>,
}

impl StaffMember {
    /// Convenience constructor for a doctor.
    pub fn doctor(id: impl Into<StaffId>, name: impl Into<String>, room: Option<&str>) -> Self {
        Self {
            id: id.into(),
            role: StaffRole::Doctor,
            name: name.into(),
            room_number: room.map(str::to_owned),
        }
    }

    /// Convenience constructor for a nurse.
    pub fn nurse(id: impl Into<StaffId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: StaffRole::Nurse,
            name: name.into(),
            room_number: None,
        }
    }
}

/// Counts of currently available resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePool {
    /// Available doctors.
    pub doctors: u32,
    /// Available nurses.
    pub nurses: u32,
    /// Distinct rooms held by available doctors.
    pub rooms: u32,
}

impl ResourcePool {
    /// True when no doctor is available.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.doctors == 0
    }
}

/// Per-pass snapshot of available staff, consumed as matches are made.
#[derive(Debug, Clone, Default)]
pub struct StaffRoster {
    doctors: VecDeque<StaffMember>,
    nurses: VecDeque<StaffMember>,
}

impl StaffRoster {
    /// Split a directory listing by role, preserving directory order.
    #[must_use]
    pub fn from_staff(staff: Vec<StaffMember>) -> Self {
        let (doctors, nurses): (Vec<_>, Vec<_>) = staff
            .into_iter()
            .partition(|m| m.role == StaffRole::Doctor);
        Self {
            doctors: doctors.into(),
            nurses: nurses.into(),
        }
    }

    /// Remaining doctors.
    #[must_use]
    pub fn doctor_count(&self) -> usize {
        self.doctors.len()
    }

    /// Remaining nurses.
    #[must_use]
    pub fn nurse_count(&self) -> usize {
        self.nurses.len()
    }

    /// Counts of what is still available in this roster.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn pool(&self) -> ResourcePool {
        let rooms: BTreeSet<&str> = self
            .doctors
            .iter()
            .filter_map(|d| d.room_number.as_deref())
            .collect();
        ResourcePool {
            doctors: self.doctors.len().min(u32::MAX as usize) as u32,
            nurses: self.nurses.len().min(u32::MAX as usize) as u32,
            rooms: rooms.len().min(u32::MAX as usize) as u32,
        }
    }

    /// Take the next available doctor.
    pub fn pop_doctor(&mut self) -> Option<StaffMember> {
        self.doctors.pop_front()
    }

    /// Take the next available nurse.
    pub fn pop_nurse(&mut self) -> Option<StaffMember> {
        self.nurses.pop_front()
    }

    /// Take a specific doctor, if present and available.
    pub fn take_doctor(&mut self, id: &StaffId) -> Option<StaffMember> {
        let idx = self.doctors.iter().position(|d| &d.id == id)?;
        self.doctors.remove(idx)
    }
}
