//! Triage tiers and per-tier constant tables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Triage tier derived from vitals. Ordered `Critical > Moderate > Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Stable vitals.
    Normal,
    /// Out-of-range vitals that need attention soon.
    Moderate,
    /// Life-threatening vitals.
    Critical,
}

impl Severity {
    /// All tiers, most urgent first.
    pub const ALL: [Self; 3] = [Self::Critical, Self::Moderate, Self::Normal];

    /// Canonical tier name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::Moderate => "Moderate",
            Self::Normal => "Normal",
        }
    }

    /// Match a single tier word, ignoring ASCII case.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(token.trim()))
    }

    /// Extract a tier from free-form classifier output.
    ///
    /// Accepts either a `Severity: <tier>` label anywhere in the text (label matched
    /// case-insensitively) or an answer that is nothing but a tier word. Returns `None`
    /// for anything else, including an unknown word after the label.
    #[must_use]
    pub fn parse_answer(text: &str) -> Option<Self> {
        const LABEL: &str = "severity:";
        let lower = text.to_ascii_lowercase();
        if let Some(idx) = lower.find(LABEL) {
            let word: String = text[idx + LABEL.len()..]
                .trim_start()
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect();
            return Self::from_token(&word);
        }
        let bare = text.trim().trim_matches(|c: char| !c.is_ascii_alphanumeric());
        Self::from_token(bare)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| format!("unknown severity `{s}`"))
    }
}

/// One value per severity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeverityTable<T> {
    /// Value for [`Severity::Critical`].
    pub critical: T,
    /// Value for [`Severity::Moderate`].
    pub moderate: T,
    /// Value for [`Severity::Normal`].
    pub normal: T,
}

impl<T> SeverityTable<T> {
    /// Build a table from explicit values.
    pub const fn new(critical: T, moderate: T, normal: T) -> Self {
        Self {
            critical,
            moderate,
            normal,
        }
    }

    /// Borrow the value for `severity`.
    pub const fn get(&self, severity: Severity) -> &T {
        match severity {
            Severity::Critical => &self.critical,
            Severity::Moderate => &self.moderate,
            Severity::Normal => &self.normal,
        }
    }

    /// Mutably borrow the value for `severity`.
    pub fn get_mut(&mut self, severity: Severity) -> &mut T {
        match severity {
            Severity::Critical => &mut self.critical,
            Severity::Moderate => &mut self.moderate,
            Severity::Normal => &mut self.normal,
        }
    }

    /// Iterate `(severity, value)` pairs, most urgent first.
    pub fn iter(&self) -> impl Iterator<Item = (Severity, &T)> {
        Severity::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

impl<T: Copy> SeverityTable<T> {
    /// Copy the value for `severity`.
    pub const fn value(&self, severity: Severity) -> T {
        *self.get(severity)
    }
}
