//! Configuration models for the priority function, estimator, classifier and scheduler loop.

pub mod triage;

pub use triage::{
    ClassifierConfig, EstimatorConfig, PriorityConfig, RemoteClassifierConfig, SchedulerConfig,
    TriageConfig,
};
