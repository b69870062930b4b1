//! Severity classification.
//!
//! A [`SeverityClassifier`] walks an ordered list of strategies: remote classifiers
//! bounded by a timeout, then the deterministic [`LocalRules`] table. The local table
//! always answers, so classification never fails.

#[cfg(feature = "gemini")]
pub mod gemini;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::{ClinicalReading, Severity};

/// Failure of a remote classification attempt. Never surfaced to callers of
/// [`SeverityClassifier::classify`].
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Network or client failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Service answered with a non-success status.
    #[error("classifier returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },
    /// Response did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// External classifier answering a vitals prompt with free text.
#[async_trait]
pub trait RemoteClassifier: Send + Sync {
    /// Send `prompt` and return the raw answer text.
    async fn complete(&self, prompt: &str) -> Result<String, ClassifierError>;
}

/// Inclusive normal range; a value strictly below `low` or strictly above `high`
/// is out of band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// Lowest in-band value.
    pub low: f64,
    /// Highest in-band value.
    pub high: f64,
}

impl Band {
    /// Band from its bounds.
    #[must_use]
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Whether `value` lies outside the band.
    #[must_use]
    pub fn excludes(&self, value: f64) -> bool {
        value < self.low || value > self.high
    }
}

/// Bands checked for one tier. Optional readings are only checked when known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierBands {
    /// Heart rate, bpm.
    pub heart_rate: Band,
    /// Body temperature, °C.
    pub body_temperature: Band,
    /// Body-mass index.
    pub bmi: Band,
    /// Systolic pressure, mmHg.
    pub systolic: Band,
    /// Diastolic pressure, mmHg.
    pub diastolic: Band,
    /// Age in years; `None` disables the age check for this tier.
    pub age: Option<Band>,
}

impl TierBands {
    /// Whether any known reading falls outside its band.
    #[must_use]
    pub fn flags(&self, r: &ClinicalReading) -> bool {
        self.heart_rate.excludes(r.heart_rate)
            || self.body_temperature.excludes(r.body_temperature)
            || r.bmi.is_some_and(|bmi| self.bmi.excludes(bmi))
            || self.systolic.excludes(r.systolic)
            || self.diastolic.excludes(r.diastolic)
            || matches!((self.age, r.age_years), (Some(band), Some(age)) if band.excludes(f64::from(age)))
    }
}

/// Deterministic rule table. Critical bands are checked first and win.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalRules {
    /// Bands whose violation means Critical.
    pub critical: TierBands,
    /// Bands whose violation means Moderate.
    pub moderate: TierBands,
}

impl Default for LocalRules {
    fn default() -> Self {
        Self {
            critical: TierBands {
                heart_rate: Band::new(40.0, 120.0),
                body_temperature: Band::new(35.0, 39.0),
                bmi: Band::new(17.0, 30.0),
                systolic: Band::new(80.0, 180.0),
                diastolic: Band::new(50.0, 120.0),
                age: None,
            },
            moderate: TierBands {
                heart_rate: Band::new(50.0, 100.0),
                body_temperature: Band::new(36.0, 38.0),
                bmi: Band::new(18.5, 25.0),
                systolic: Band::new(90.0, 140.0),
                diastolic: Band::new(60.0, 90.0),
                age: Some(Band::new(10.0, 55.0)),
            },
        }
    }
}

impl LocalRules {
    /// Classify a reading.
    #[must_use]
    pub fn evaluate(&self, reading: &ClinicalReading) -> Severity {
        if self.critical.flags(reading) {
            Severity::Critical
        } else if self.moderate.flags(reading) {
            Severity::Moderate
        } else {
            Severity::Normal
        }
    }
}

/// Prompt sent to remote classifiers.
#[must_use]
pub fn build_prompt(r: &ClinicalReading) -> String {
    let mut lines = vec![
        "Classify the triage severity of a patient with these vitals as Critical, Moderate, or Normal.".to_owned(),
        format!("- Heart rate: {} bpm (normal 60-100)", r.heart_rate),
        format!(
            "- Blood pressure: {}/{} mmHg (normal 90-140/60-90)",
            r.systolic, r.diastolic
        ),
        format!("- Body temperature: {} C (normal 36.1-37.2)", r.body_temperature),
    ];
    if let Some(bmi) = r.bmi {
        lines.push(format!("- BMI: {bmi:.1} (normal 18.5-25)"));
    }
    if let Some(age) = r.age_years {
        lines.push(format!(
            "- Age: {age} years (monitor closely under 10 or over 55)"
        ));
    }
    lines.push("Answer with exactly one line: \"Severity: <Critical|Moderate|Normal>\", using the most severe condition present.".to_owned());
    lines.join("\n")
}

/// One step of the classification chain.
#[derive(Clone)]
pub enum ClassifierStrategy {
    /// Ask an external classifier, giving up after `timeout`.
    Remote {
        /// Client used for the call.
        client: Arc<dyn RemoteClassifier>,
        /// Upper bound on the call.
        timeout: Duration,
    },
    /// Apply the local rule table.
    Local(LocalRules),
}

impl fmt::Debug for ClassifierStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote { timeout, .. } => f
                .debug_struct("Remote")
                .field("timeout", timeout)
                .finish_non_exhaustive(),
            Self::Local(rules) => f.debug_tuple("Local").field(rules).finish(),
        }
    }
}

/// Where a classification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassificationSource {
    /// A remote classifier answered with a valid tier.
    Remote,
    /// Local rules decided, either by configuration or after remote failure.
    Local,
}

/// Tier plus provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Assigned tier.
    pub severity: Severity,
    /// Strategy that produced it.
    pub source: ClassificationSource,
    /// True if a remote strategy was configured but failed.
    pub degraded: bool,
}

/// Ordered strategy chain ending in local rules.
#[derive(Debug, Clone)]
pub struct SeverityClassifier {
    strategies: Vec<ClassifierStrategy>,
    fallback: LocalRules,
}

impl Default for SeverityClassifier {
    fn default() -> Self {
        Self::local(LocalRules::default())
    }
}

impl SeverityClassifier {
    /// Local rules only.
    #[must_use]
    pub fn local(rules: LocalRules) -> Self {
        Self {
            strategies: vec![ClassifierStrategy::Local(rules)],
            fallback: rules,
        }
    }

    /// Try `client` before any local strategy, bounded by `timeout`.
    #[must_use]
    pub fn with_remote(mut self, client: Arc<dyn RemoteClassifier>, timeout: Duration) -> Self {
        let at = self
            .strategies
            .iter()
            .position(|s| matches!(s, ClassifierStrategy::Local(_)))
            .unwrap_or(self.strategies.len());
        self.strategies
            .insert(at, ClassifierStrategy::Remote { client, timeout });
        self
    }

    /// Configured chain, in attempt order.
    #[must_use]
    pub fn strategies(&self) -> &[ClassifierStrategy] {
        &self.strategies
    }

    /// Classify a reading. Never fails.
    pub async fn classify(&self, reading: &ClinicalReading) -> Severity {
        self.classify_detailed(reading).await.severity
    }

    /// Classify a reading and report which strategy decided.
    pub async fn classify_detailed(&self, reading: &ClinicalReading) -> Classification {
        let mut degraded = false;
        let mut prompt: Option<String> = None;
        for strategy in &self.strategies {
            match strategy {
                ClassifierStrategy::Remote { client, timeout } => {
                    let prompt = prompt.get_or_insert_with(|| build_prompt(reading));
                    let answer = Self::attempt_remote(client.as_ref(), prompt, *timeout).await;
                    if let Some(severity) = answer {
                        return Classification {
                            severity,
                            source: ClassificationSource::Remote,
                            degraded,
                        };
                    }
                    degraded = true;
                }
                ClassifierStrategy::Local(rules) => {
                    return Classification {
                        severity: rules.evaluate(reading),
                        source: ClassificationSource::Local,
                        degraded,
                    };
                }
            }
        }
        Classification {
            severity: self.fallback.evaluate(reading),
            source: ClassificationSource::Local,
            degraded,
        }
    }

    async fn attempt_remote(
        client: &dyn RemoteClassifier,
        prompt: &str,
        timeout: Duration,
    ) -> Option<Severity> {
        match tokio::time::timeout(timeout, client.complete(prompt)).await {
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis(), "remote classifier timed out, using local rules");
                None
            }
            Ok(Err(e)) => {
                warn!(error = %e, "remote classifier failed, using local rules");
                None
            }
            Ok(Ok(answer)) => {
                let parsed = Severity::parse_answer(&answer);
                if parsed.is_none() {
                    warn!(answer = %answer.trim(), "remote classifier gave no valid tier, using local rules");
                } else {
                    debug!(severity = ?parsed, "remote classifier answered");
                }
                parsed
            }
        }
    }
}
