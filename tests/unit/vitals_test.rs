//! Tests for vitals parsing and derived readings

use triage_scheduler::core::{BloodPressure, Vitals};

fn vitals(bp: BloodPressure) -> Vitals {
    Vitals {
        heart_rate: Some(80.0),
        blood_pressure: Some(bp),
        body_temperature: Some(36.8),
        ..Vitals::default()
    }
}

#[test]
fn test_blood_pressure_string_and_split() {
    let r = vitals(BloodPressure::Reading("135/85 mmHg".into())).reading().unwrap();
    assert!((r.systolic - 135.0).abs() < f64::EPSILON);
    assert!((r.diastolic - 85.0).abs() < f64::EPSILON);

    let r = vitals(BloodPressure::Split {
        systolic: 110.0,
        diastolic: 70.0,
    })
    .reading()
    .unwrap();
    assert!((r.systolic - 110.0).abs() < f64::EPSILON);
}

#[test]
fn test_garbled_blood_pressure_is_invalid_input() {
    let err = vitals(BloodPressure::Reading("high".into())).reading().unwrap_err();
    assert!(err.is_invalid_input());
}

#[test]
fn test_bmi_needs_height_and_weight() {
    let mut v = vitals(BloodPressure::Reading("120/80".into()));
    v.weight_kg = Some(70.0);
    assert!(v.reading().unwrap().bmi.is_none());
    v.height_cm = Some(175.0);
    assert_eq!(v.bmi(), Some(22.9));
}

#[test]
fn test_vitals_deserialize_from_json() {
    let v: Vitals = serde_json::from_str(
        r#"{ "heart_rate": 72, "blood_pressure": { "systolic": 118, "diastolic": 76 }, "body_temperature": 36.6, "age_years": 40 }"#,
    )
    .unwrap();
    let r = v.reading().unwrap();
    assert_eq!(r.age_years, Some(40));
    assert!((r.diastolic - 76.0).abs() < f64::EPSILON);
}
