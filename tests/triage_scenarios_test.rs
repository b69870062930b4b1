//! End-to-end triage scenarios over the core components.
//!
//! These tests drive the classifier, queue and scheduler directly with a manual
//! clock so ageing and tie-breaks are deterministic.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use triage_scheduler::core::{
    AssignmentScheduler, BloodPressure, ClassificationSource, ClassifierError, PatientRef,
    PriorityFunction, RemoteClassifier, ResourcePool, Severity, SeverityClassifier, StaffMember,
    StaffRoster, TriageQueue, Vitals, WaitTimeEstimator,
};
use triage_scheduler::util::{ManualClock, PatientId};

fn vitals(heart_rate: f64) -> Vitals {
    Vitals {
        heart_rate: Some(heart_rate),
        blood_pressure: Some(BloodPressure::Reading("120/80".into())),
        body_temperature: Some(36.8),
        ..Vitals::default()
    }
}

fn queue(clock: &ManualClock) -> TriageQueue {
    TriageQueue::new(
        PriorityFunction::default(),
        WaitTimeEstimator::default(),
        Arc::new(clock.clone()),
        1_000,
    )
}

fn doctors(n: usize) -> StaffRoster {
    StaffRoster::from_staff(
        (0..n)
            .map(|i| StaffMember::doctor(format!("d{i}"), format!("Doctor {i}"), Some("A1")))
            .collect(),
    )
}

async fn classify(classifier: &SeverityClassifier, v: &Vitals) -> Severity {
    classifier.classify(&v.reading().unwrap()).await
}

fn order(q: &mut TriageQueue) -> Vec<PatientId> {
    q.snapshot_all().into_iter().map(|e| e.patient.id).collect()
}

struct SlowRemote;

#[async_trait]
impl RemoteClassifier for SlowRemote {
    async fn complete(&self, _prompt: &str) -> Result<String, ClassifierError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok("Severity: Normal".into())
    }
}

struct GarbageRemote;

#[async_trait]
impl RemoteClassifier for GarbageRemote {
    async fn complete(&self, _prompt: &str) -> Result<String, ClassifierError> {
        Ok("I am not sure".into())
    }
}

#[tokio::test]
async fn test_scenario_a_critical_heart_rate_goes_first() {
    let clock = ManualClock::default();
    let mut q = queue(&clock);
    let classifier = SeverityClassifier::default();
    let v = vitals(130.0);
    let severity = classify(&classifier, &v).await;
    assert_eq!(severity, Severity::Critical);

    let placed = q
        .enqueue(PatientRef::new("p1", "Alex"), v, severity, &ResourcePool::default())
        .unwrap();
    assert_eq!(placed.position, 1);
    assert_eq!(placed.severity, Severity::Critical);
    assert_eq!(placed.estimated_wait_minutes, 60);
}

#[tokio::test]
async fn test_scenario_b_threshold_batch_is_fifo() {
    let clock = ManualClock::default();
    let mut q = queue(&clock);
    let classifier = SeverityClassifier::default();
    let scheduler = AssignmentScheduler::new(10);
    let pool = ResourcePool::default();

    for i in 0..9 {
        let v = vitals(72.0);
        let severity = classify(&classifier, &v).await;
        assert_eq!(severity, Severity::Normal);
        q.enqueue(PatientRef::new(format!("p{i}"), "Pat"), v, severity, &pool)
            .unwrap();
    }
    assert!(scheduler.try_assign(&mut q, &mut doctors(3)).is_empty());
    assert_eq!(q.len(), 9);

    q.enqueue(PatientRef::new("p9", "Pat"), vitals(72.0), Severity::Normal, &pool)
        .unwrap();
    let assigned = scheduler.try_assign(&mut q, &mut doctors(3));
    let ids: Vec<_> = assigned.iter().map(|a| a.patient_id.as_str()).collect();
    assert_eq!(ids, ["p0", "p1", "p2"]);
    assert_eq!(q.len(), 7);

    q.enqueue(PatientRef::new("p10", "Pat"), vitals(72.0), Severity::Normal, &pool)
        .unwrap();
    assert_eq!(q.len(), 8);
    assert_eq!(q.position_of(&"p3".into()), Some(1));
    assert_eq!(q.position_of(&"p10".into()), Some(8));
}

#[test]
fn test_scenario_c_overflow_score_after_rerank() {
    let clock = ManualClock::default();
    let mut q = queue(&clock);
    q.enqueue(PatientRef::new("p1", "Sam"), vitals(72.0), Severity::Normal, &ResourcePool::default())
        .unwrap();
    clock.advance_minutes(65);
    let top = q.peek_top(1);
    assert!((top[0].priority_score - 45.0).abs() < 1e-9, "{}", top[0].priority_score);
}

#[tokio::test]
async fn test_scenario_d_timeout_falls_back_to_rules() {
    let classifier = SeverityClassifier::default()
        .with_remote(Arc::new(SlowRemote), Duration::from_millis(50));
    let started = std::time::Instant::now();
    let out = classifier
        .classify_detailed(&vitals(130.0).reading().unwrap())
        .await;
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(out.severity, Severity::Critical);
    assert_eq!(out.source, ClassificationSource::Local);
    assert!(out.degraded);
}

#[tokio::test]
async fn test_unparseable_remote_answer_falls_back() {
    let classifier = SeverityClassifier::default()
        .with_remote(Arc::new(GarbageRemote), Duration::from_secs(1));
    assert_eq!(classify(&classifier, &vitals(105.0)).await, Severity::Moderate);
}

#[tokio::test]
async fn test_heart_rate_boundaries() {
    let classifier = SeverityClassifier::default();
    assert_eq!(classify(&classifier, &vitals(121.0)).await, Severity::Critical);
    assert_eq!(classify(&classifier, &vitals(120.0)).await, Severity::Moderate);
    assert_eq!(classify(&classifier, &vitals(119.0)).await, Severity::Moderate);
    assert_eq!(classify(&classifier, &vitals(40.0)).await, Severity::Moderate);
    assert_eq!(classify(&classifier, &vitals(39.0)).await, Severity::Critical);
}

#[test]
fn test_enqueue_dequeue_round_trip_keeps_order() {
    let clock = ManualClock::default();
    let mut q = queue(&clock);
    let pool = ResourcePool::default();
    let tiers = [
        Severity::Normal,
        Severity::Critical,
        Severity::Moderate,
        Severity::Normal,
        Severity::Critical,
    ];
    for (i, severity) in tiers.into_iter().enumerate() {
        q.enqueue(PatientRef::new(format!("p{i}"), "Pat"), Vitals::default(), severity, &pool)
            .unwrap();
        clock.advance_minutes(1);
    }
    let before = order(&mut q);

    q.enqueue(PatientRef::new("x", "X"), Vitals::default(), Severity::Moderate, &pool)
        .unwrap();
    let removed = q.dequeue(&"x".into()).unwrap();
    assert_eq!(removed.patient.id.as_str(), "x");
    assert!(q.dequeue(&"x".into()).is_none());
    assert_eq!(order(&mut q), before);
}

#[test]
fn test_rerank_is_idempotent() {
    let clock = ManualClock::default();
    let mut q = queue(&clock);
    let pool = ResourcePool::default();
    for (i, severity) in [Severity::Moderate, Severity::Normal, Severity::Moderate]
        .into_iter()
        .enumerate()
    {
        q.enqueue(PatientRef::new(format!("p{i}"), "Pat"), Vitals::default(), severity, &pool)
            .unwrap();
    }
    clock.advance_minutes(45);
    let first = q.snapshot_all();
    let second = q.snapshot_all();
    assert_eq!(first, second);
}

#[test]
fn test_long_wait_beats_new_critical_arrivals() {
    let clock = ManualClock::default();
    let mut q = queue(&clock);
    let pool = ResourcePool::default();
    q.enqueue(PatientRef::new("old", "Old"), Vitals::default(), Severity::Normal, &pool)
        .unwrap();
    let overtake = PriorityFunction::default()
        .overtake_wait_minutes(Severity::Normal, Severity::Critical)
        .unwrap();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    clock.advance_minutes(overtake.ceil() as u64 + 1);
    q.enqueue(PatientRef::new("new", "New"), Vitals::default(), Severity::Critical, &pool)
        .unwrap();
    assert_eq!(q.position_of(&"old".into()), Some(1));
}
