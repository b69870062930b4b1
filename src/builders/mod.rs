//! Builders that assemble a running triage service from configuration.

pub mod service_builder;

pub use service_builder::{build_classifier, ServiceBuilder};
