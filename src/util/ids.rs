//! Identifier newtypes shared across the crate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque patient identifier issued by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(pub String);

/// Opaque staff identifier issued by the staff directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(pub String);

impl PatientId {
    /// Fresh record-store style id (`P-<uuid>`).
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("P-{}", uuid::Uuid::new_v4().simple()))
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl StaffId {
    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PatientId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for PatientId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for StaffId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for StaffId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
