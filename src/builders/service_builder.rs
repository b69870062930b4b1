//! Build a [`TriageService`] from configuration and injected collaborators.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{ClassifierConfig, TriageConfig};
use crate::core::{
    AuditSink, EventNotifier, LocalRules, NoopAuditSink, RecordStore, RemoteClassifier,
    SeverityClassifier, StaffDirectory, TriageError,
};
use crate::infra::{InMemoryNotifier, InMemoryRecordStore, InMemoryStaffDirectory};
use crate::runtime::{Spawn, TriageHandle, TriageService};
use crate::util::{Clock, SystemClock};

/// Classifier described by `cfg`: local rules, preceded by the configured remote
/// classifier when one is set and its API key is present.
#[must_use]
pub fn build_classifier(cfg: &ClassifierConfig) -> SeverityClassifier {
    let local = SeverityClassifier::local(LocalRules::default());
    let Some(remote) = &cfg.remote else {
        return local;
    };
    #[cfg(feature = "gemini")]
    {
        if let Some(client) = crate::core::classifier::gemini::GeminiClassifier::from_config(remote) {
            info!(model = %remote.model, timeout_ms = cfg.timeout_ms, "remote classifier enabled");
            return local.with_remote(Arc::new(client), Duration::from_millis(cfg.timeout_ms));
        }
        warn!(key_env = %remote.api_key_env, "remote classifier key not set, using local rules only");
    }
    #[cfg(not(feature = "gemini"))]
    warn!(model = %remote.model, "built without remote classifier support, using local rules only");
    local
}

/// Assembles a [`TriageService`]. Unset collaborators default to in-memory ones.
pub struct ServiceBuilder {
    config: TriageConfig,
    classifier: Option<SeverityClassifier>,
    remote: Option<Arc<dyn RemoteClassifier>>,
    clock: Arc<dyn Clock>,
    records: Option<Arc<dyn RecordStore>>,
    staff: Option<Arc<dyn StaffDirectory>>,
    notifier: Option<Arc<dyn EventNotifier>>,
    audit: Option<Box<dyn AuditSink>>,
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self::new(TriageConfig::default())
    }
}

impl ServiceBuilder {
    /// Start from `config`.
    #[must_use]
    pub fn new(config: TriageConfig) -> Self {
        Self {
            config,
            classifier: None,
            remote: None,
            clock: Arc::new(SystemClock),
            records: None,
            staff: None,
            notifier: None,
            audit: None,
        }
    }

    /// Use an explicit classifier instead of one built from configuration.
    #[must_use]
    pub fn with_classifier(mut self, classifier: SeverityClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Put `client` in front of local rules, bounded by the configured timeout.
    #[must_use]
    pub fn with_remote_classifier(mut self, client: Arc<dyn RemoteClassifier>) -> Self {
        self.remote = Some(client);
        self
    }

    /// Time source for queue ageing and record stamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Patient record store.
    #[must_use]
    pub fn with_records(mut self, records: Arc<dyn RecordStore>) -> Self {
        self.records = Some(records);
        self
    }

    /// Staff availability source.
    #[must_use]
    pub fn with_staff(mut self, staff: Arc<dyn StaffDirectory>) -> Self {
        self.staff = Some(staff);
        self
    }

    /// Event sink.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn EventNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Audit sink owned by the scheduler loop.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Validate configuration and assemble the service.
    ///
    /// # Errors
    ///
    /// [`TriageError::InvalidInput`] when the configuration does not validate.
    pub fn build(self) -> Result<TriageService, TriageError> {
        self.config
            .validate()
            .map_err(|e| TriageError::InvalidInput(format!("config invalid: {e}")))?;

        let mut classifier = self
            .classifier
            .unwrap_or_else(|| build_classifier(&self.config.classifier));
        if let Some(remote) = self.remote {
            classifier =
                classifier.with_remote(remote, Duration::from_millis(self.config.classifier.timeout_ms));
        }
        let records: Arc<dyn RecordStore> = match self.records {
            Some(records) => records,
            None => Arc::new(InMemoryRecordStore::new(Arc::clone(&self.clock))),
        };
        let staff: Arc<dyn StaffDirectory> = match self.staff {
            Some(staff) => staff,
            None => Arc::new(InMemoryStaffDirectory::new()),
        };
        let notifier: Arc<dyn EventNotifier> = match self.notifier {
            Some(notifier) => notifier,
            None => Arc::new(InMemoryNotifier::default()),
        };
        let audit: Box<dyn AuditSink> = match self.audit {
            Some(audit) => audit,
            None => Box::new(NoopAuditSink),
        };

        Ok(TriageService::new(
            self.config,
            classifier,
            self.clock,
            records,
            staff,
            notifier,
            audit,
        ))
    }

    /// Build and start the service on `spawner`.
    ///
    /// # Errors
    ///
    /// See [`ServiceBuilder::build`].
    pub fn start<S: Spawn>(self, spawner: &S) -> Result<TriageHandle, TriageError> {
        Ok(self.build()?.start(spawner))
    }
}
