//! In-memory staff directory.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::core::{StaffDirectory, StaffMember, TriageError};
use crate::util::StaffId;

#[derive(Debug, Clone)]
struct Slot {
    member: StaffMember,
    available: bool,
}

/// Staff list with per-member availability. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStaffDirectory {
    slots: Arc<RwLock<Vec<Slot>>>,
}

impl InMemoryStaffDirectory {
    /// Empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory where every listed member starts available.
    #[must_use]
    pub fn with_staff(staff: impl IntoIterator<Item = StaffMember>) -> Self {
        let dir = Self::new();
        for member in staff {
            dir.add(member);
        }
        dir
    }

    /// Add or replace a member, marking them available.
    pub fn add(&self, member: StaffMember) {
        let mut slots = self.slots.write();
        if let Some(slot) = slots.iter_mut().find(|s| s.member.id == member.id) {
            slot.member = member;
            slot.available = true;
        } else {
            slots.push(Slot {
                member,
                available: true,
            });
        }
    }

    /// Remove a member. Returns whether it existed.
    pub fn remove(&self, id: &StaffId) -> bool {
        let mut slots = self.slots.write();
        let before = slots.len();
        slots.retain(|s| &s.member.id != id);
        slots.len() != before
    }

    /// Change availability. Returns whether the member exists.
    pub fn set_available(&self, id: &StaffId, available: bool) -> bool {
        self.slots
            .write()
            .iter_mut()
            .find(|s| &s.member.id == id)
            .map(|s| s.available = available)
            .is_some()
    }
}

#[async_trait]
impl StaffDirectory for InMemoryStaffDirectory {
    async fn list_available_staff(&self) -> Result<Vec<StaffMember>, TriageError> {
        Ok(self
            .slots
            .read()
            .iter()
            .filter(|s| s.available)
            .map(|s| s.member.clone())
            .collect())
    }
}
