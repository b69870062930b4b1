//! Triage scheduler configuration structures.
//!
//! Every clinical constant used by the priority function and the wait estimator
//! lives here with its established default so it can be tuned without code changes.

use serde::{Deserialize, Serialize};

use crate::core::SeverityTable;

/// Priority function tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityConfig {
    /// Score at zero wait.
    pub base_score: SeverityTable<f64>,
    /// Score added per minute waited.
    pub boost_per_minute: SeverityTable<f64>,
    /// Acceptable wait in minutes before the quadratic overflow term applies.
    pub wait_ceiling_minutes: SeverityTable<f64>,
    /// Divisor for the squared overage.
    pub overflow_divisor: f64,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            base_score: SeverityTable::new(100.0, 50.0, 10.0),
            boost_per_minute: SeverityTable::new(2.0, 1.0, 0.5),
            wait_ceiling_minutes: SeverityTable::new(10.0, 30.0, 60.0),
            overflow_divisor: 10.0,
        }
    }
}

/// Wait-time estimator tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Minutes one server spends on a patient of each tier.
    pub service_minutes: SeverityTable<f64>,
    /// Nurses that together count as one additional server.
    pub nurses_per_server: u32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            service_minutes: SeverityTable::new(60.0, 30.0, 15.0),
            nurses_per_server: 2,
        }
    }
}

/// Remote classifier endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteClassifierConfig {
    /// generateContent endpoint base, without the model path.
    pub endpoint: String,
    /// Model name appended to the endpoint.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for RemoteClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models".into(),
            model: "gemini-1.5-flash".into(),
            api_key_env: "TRIAGE_CLASSIFIER_API_KEY".into(),
        }
    }
}

/// Severity classifier configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Upper bound on a remote classification call, in milliseconds.
    pub timeout_ms: u64,
    /// Remote classifier; `None` means local rules only.
    pub remote: Option<RemoteClassifierConfig>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            remote: None,
        }
    }
}

/// Scheduler loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Queue length at which automatic batch assignment runs.
    pub min_queue_threshold: usize,
    /// Seconds between periodic reranks.
    pub rerank_interval_secs: u64,
    /// Maximum queued patients before registration is rejected.
    pub max_queue_depth: usize,
    /// Capacity of the scheduler command channel.
    pub command_buffer: usize,
    /// Run batch assignment automatically when the threshold is reached.
    pub auto_assign: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_queue_threshold: 10,
            rerank_interval_secs: 30,
            max_queue_depth: 1_000,
            command_buffer: 256,
            auto_assign: true,
        }
    }
}

/// Root triage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Priority function.
    pub priority: PriorityConfig,
    /// Wait estimator.
    pub estimator: EstimatorConfig,
    /// Severity classifier.
    pub classifier: ClassifierConfig,
    /// Scheduler loop.
    pub scheduler: SchedulerConfig,
}

fn check_table(name: &str, table: &SeverityTable<f64>, allow_zero: bool) -> Result<(), String> {
    let (floor_ok, expectation): (fn(f64) -> bool, &str) = if allow_zero {
        (|v| v >= 0.0, "non-negative")
    } else {
        (|v| v > 0.0, "positive")
    };
    for (severity, value) in table.iter() {
        if !(value.is_finite() && floor_ok(*value)) {
            return Err(format!(
                "{name}.{} must be {expectation}",
                severity.as_str().to_lowercase()
            ));
        }
    }
    Ok(())
}

impl PriorityConfig {
    /// Validate priority constants.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        check_table("base_score", &self.base_score, true)?;
        check_table("boost_per_minute", &self.boost_per_minute, true)?;
        check_table("wait_ceiling_minutes", &self.wait_ceiling_minutes, true)?;
        if !(self.overflow_divisor.is_finite() && self.overflow_divisor > 0.0) {
            return Err("overflow_divisor must be positive".into());
        }
        Ok(())
    }
}

impl EstimatorConfig {
    /// Validate estimator constants.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        check_table("service_minutes", &self.service_minutes, false)?;
        if self.nurses_per_server == 0 {
            return Err("nurses_per_server must be greater than 0".into());
        }
        Ok(())
    }
}

impl ClassifierConfig {
    /// Validate classifier settings.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_ms == 0 {
            return Err("timeout_ms must be greater than 0".into());
        }
        if let Some(remote) = &self.remote {
            if remote.endpoint.trim().is_empty() {
                return Err("remote.endpoint must not be empty".into());
            }
            if remote.model.trim().is_empty() {
                return Err("remote.model must not be empty".into());
            }
        }
        Ok(())
    }
}

impl SchedulerConfig {
    /// Validate scheduler settings.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.rerank_interval_secs == 0 {
            return Err("rerank_interval_secs must be greater than 0".into());
        }
        if self.max_queue_depth == 0 {
            return Err("max_queue_depth must be greater than 0".into());
        }
        if self.command_buffer == 0 {
            return Err("command_buffer must be greater than 0".into());
        }
        Ok(())
    }
}

impl TriageConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        self.priority
            .validate()
            .map_err(|e| format!("priority invalid: {e}"))?;
        self.estimator
            .validate()
            .map_err(|e| format!("estimator invalid: {e}"))?;
        self.classifier
            .validate()
            .map_err(|e| format!("classifier invalid: {e}"))?;
        self.scheduler
            .validate()
            .map_err(|e| format!("scheduler invalid: {e}"))?;
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a message on malformed JSON or invalid settings.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults overridden by `TRIAGE_*` environment variables, after loading a
    /// `.env` file if one is present.
    ///
    /// # Errors
    ///
    /// Returns a message when an override does not parse or the result is invalid.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `TRIAGE_*` overrides from an arbitrary lookup.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first variable whose value does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, String> {
            raw.trim()
                .parse()
                .map_err(|_| format!("{key} has invalid value `{raw}`"))
        }

        if let Some(v) = lookup("TRIAGE_MIN_QUEUE_THRESHOLD") {
            self.scheduler.min_queue_threshold = parse("TRIAGE_MIN_QUEUE_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("TRIAGE_RERANK_INTERVAL_SECS") {
            self.scheduler.rerank_interval_secs = parse("TRIAGE_RERANK_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = lookup("TRIAGE_MAX_QUEUE_DEPTH") {
            self.scheduler.max_queue_depth = parse("TRIAGE_MAX_QUEUE_DEPTH", &v)?;
        }
        if let Some(v) = lookup("TRIAGE_AUTO_ASSIGN") {
            self.scheduler.auto_assign = parse("TRIAGE_AUTO_ASSIGN", &v)?;
        }
        if let Some(v) = lookup("TRIAGE_CLASSIFIER_TIMEOUT_MS") {
            self.classifier.timeout_ms = parse("TRIAGE_CLASSIFIER_TIMEOUT_MS", &v)?;
        }

        let endpoint = lookup("TRIAGE_CLASSIFIER_ENDPOINT");
        let model = lookup("TRIAGE_CLASSIFIER_MODEL");
        let key_env = lookup("TRIAGE_CLASSIFIER_API_KEY_ENV");
        if endpoint.is_some() || model.is_some() || key_env.is_some() {
            let remote = self.classifier.remote.get_or_insert_with(RemoteClassifierConfig::default);
            if let Some(endpoint) = endpoint {
                remote.endpoint = endpoint;
            }
            if let Some(model) = model {
                remote.model = model;
            }
            if let Some(key_env) = key_env {
                remote.api_key_env = key_env;
            }
        }
        Ok(())
    }
}
