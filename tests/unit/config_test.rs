//! Tests for configuration validation

use triage_scheduler::config::{RemoteClassifierConfig, TriageConfig};
use triage_scheduler::core::Severity;

#[test]
fn test_default_config_is_valid() {
    let cfg = TriageConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.scheduler.min_queue_threshold, 10);
    assert_eq!(cfg.scheduler.rerank_interval_secs, 30);
    assert_eq!(cfg.classifier.timeout_ms, 5_000);
    assert!((cfg.priority.base_score.value(Severity::Critical) - 100.0).abs() < f64::EPSILON);
    assert!((cfg.estimator.service_minutes.value(Severity::Normal) - 15.0).abs() < f64::EPSILON);
}

#[test]
fn test_config_invalid_overflow_divisor() {
    let mut cfg = TriageConfig::default();
    cfg.priority.overflow_divisor = 0.0;
    let err = cfg.validate().unwrap_err();
    assert!(err.starts_with("priority invalid"), "{err}");
}

#[test]
fn test_config_invalid_negative_boost() {
    let mut cfg = TriageConfig::default();
    cfg.priority.boost_per_minute.normal = -0.5;
    let err = cfg.validate().unwrap_err();
    assert_eq!(err, "priority invalid: boost_per_minute.normal must be non-negative");
}

#[test]
fn test_config_invalid_service_time() {
    let mut cfg = TriageConfig::default();
    cfg.estimator.service_minutes.critical = 0.0;
    assert!(cfg.validate().is_err());
    cfg.estimator.service_minutes.critical = 60.0;
    cfg.estimator.nurses_per_server = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_config_invalid_scheduler_and_classifier() {
    let mut cfg = TriageConfig::default();
    cfg.scheduler.rerank_interval_secs = 0;
    assert!(cfg.validate().unwrap_err().starts_with("scheduler invalid"));

    let mut cfg = TriageConfig::default();
    cfg.classifier.timeout_ms = 0;
    assert!(cfg.validate().unwrap_err().starts_with("classifier invalid"));

    let mut cfg = TriageConfig::default();
    cfg.classifier.remote = Some(RemoteClassifierConfig {
        model: "  ".into(),
        ..RemoteClassifierConfig::default()
    });
    assert!(cfg.validate().is_err());
}

#[test]
fn test_config_from_json_partial() {
    let cfg = TriageConfig::from_json_str(
        r#"{
            "scheduler": { "min_queue_threshold": 3, "auto_assign": false },
            "priority": { "boost_per_minute": { "critical": 3.0, "moderate": 1.0, "normal": 0.5 } }
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.scheduler.min_queue_threshold, 3);
    assert!(!cfg.scheduler.auto_assign);
    assert_eq!(cfg.scheduler.max_queue_depth, 1_000);
    assert!((cfg.priority.boost_per_minute.critical - 3.0).abs() < f64::EPSILON);
    assert!((cfg.priority.overflow_divisor - 10.0).abs() < f64::EPSILON);
}

#[test]
fn test_config_from_json_rejects_invalid() {
    assert!(TriageConfig::from_json_str("{ not json").unwrap_err().starts_with("parse error"));
    assert!(TriageConfig::from_json_str(r#"{ "scheduler": { "command_buffer": 0 } }"#).is_err());
}

#[test]
fn test_env_overrides() {
    let env = |key: &str| match key {
        "TRIAGE_MIN_QUEUE_THRESHOLD" => Some("4".to_owned()),
        "TRIAGE_AUTO_ASSIGN" => Some("false".to_owned()),
        "TRIAGE_CLASSIFIER_MODEL" => Some("gemini-test".to_owned()),
        _ => None,
    };
    let mut cfg = TriageConfig::default();
    cfg.apply_overrides(env).unwrap();
    assert_eq!(cfg.scheduler.min_queue_threshold, 4);
    assert!(!cfg.scheduler.auto_assign);
    let remote = cfg.classifier.remote.unwrap();
    assert_eq!(remote.model, "gemini-test");
    assert_eq!(remote.api_key_env, "TRIAGE_CLASSIFIER_API_KEY");
}

#[test]
fn test_env_override_rejects_garbage() {
    let mut cfg = TriageConfig::default();
    let err = cfg
        .apply_overrides(|key| (key == "TRIAGE_MAX_QUEUE_DEPTH").then(|| "lots".to_owned()))
        .unwrap_err();
    assert_eq!(err, "TRIAGE_MAX_QUEUE_DEPTH has invalid value `lots`");
}
