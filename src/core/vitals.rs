//! Raw vitals as received at registration and the validated reading the
//! classifier works on.

use serde::{Deserialize, Serialize};

use crate::core::TriageError;

/// Blood pressure as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BloodPressure {
    /// `"sys/dia"` text, e.g. `"120/80"` or `"120/80 mmHg"`.
    Reading(String),
    /// Already split values in mmHg.
    Split {
        /// Systolic pressure.
        systolic: f64,
        /// Diastolic pressure.
        diastolic: f64,
    },
}

impl BloodPressure {
    /// Resolve to `(systolic, diastolic)`.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidInput`] when the text form is not two numbers
    /// separated by `/`, or when a value is not finite.
    pub fn resolve(&self) -> Result<(f64, f64), TriageError> {
        let (sys, dia) = match self {
            Self::Split {
                systolic,
                diastolic,
            } => (*systolic, *diastolic),
            Self::Reading(text) => {
                let (sys, dia) = text.split_once('/').ok_or_else(|| {
                    TriageError::InvalidInput(format!(
                        "blood pressure `{text}` must be formatted as systolic/diastolic"
                    ))
                })?;
                (leading_number(sys, text)?, leading_number(dia, text)?)
            }
        };
        if !sys.is_finite() || !dia.is_finite() {
            return Err(TriageError::InvalidInput(
                "blood pressure values must be finite".into(),
            ));
        }
        Ok((sys, dia))
    }
}

/// Parse the numeric prefix of `part` ("80 mmHg" -> 80).
fn leading_number(part: &str, whole: &str) -> Result<f64, TriageError> {
    let trimmed = part.trim();
    let end = trimmed
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map_or(trimmed.len(), |(i, _)| i);
    trimmed[..end].parse::<f64>().map_err(|_| {
        TriageError::InvalidInput(format!("blood pressure `{whole}` is not numeric"))
    })
}

/// Vitals snapshot taken at registration. Every field is optional on the wire;
/// [`Vitals::reading`] enforces the fields triage needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Heart rate in beats per minute. Required.
    pub heart_rate: Option<f64>,
    /// Blood pressure. Required.
    pub blood_pressure: Option<BloodPressure>,
    /// Body temperature in degrees Celsius. Required.
    pub body_temperature: Option<f64>,
    /// Height in centimetres.
    pub height_cm: Option<f64>,
    /// Weight in kilograms.
    pub weight_kg: Option<f64>,
    /// Age in whole years.
    pub age_years: Option<u32>,
}

/// Validated vitals with derived blood-pressure components and BMI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClinicalReading {
    /// Heart rate in bpm.
    pub heart_rate: f64,
    /// Body temperature in °C.
    pub body_temperature: f64,
    /// Systolic pressure in mmHg.
    pub systolic: f64,
    /// Diastolic pressure in mmHg.
    pub diastolic: f64,
    /// Body-mass index rounded to one decimal, when height and weight are known.
    pub bmi: Option<f64>,
    /// Age in years, when known.
    pub age_years: Option<u32>,
}

impl Vitals {
    /// Names of required fields that are absent.
    #[must_use]
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.heart_rate.is_none() {
            missing.push("heart_rate");
        }
        if self.body_temperature.is_none() {
            missing.push("body_temperature");
        }
        if self.blood_pressure.is_none() {
            missing.push("blood_pressure");
        }
        missing
    }

    /// BMI from height and weight, rounded to one decimal place.
    #[must_use]
    pub fn bmi(&self) -> Option<f64> {
        match (self.height_cm, self.weight_kg) {
            (Some(h), Some(w)) if h > 0.0 && w > 0.0 && h.is_finite() && w.is_finite() => {
                let metres = h / 100.0;
                Some((w / (metres * metres) * 10.0).round() / 10.0)
            }
            _ => None,
        }
    }

    /// Validate and derive the reading used for classification.
    ///
    /// # Errors
    ///
    /// [`TriageError::InvalidInput`] if heart rate, body temperature or blood pressure
    /// is missing, if blood pressure cannot be parsed, or if a reading is not finite.
    pub fn reading(&self) -> Result<ClinicalReading, TriageError> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(TriageError::InvalidInput(format!(
                "required vitals missing: {}",
                missing.join(", ")
            )));
        }
        let (Some(heart_rate), Some(body_temperature), Some(bp)) =
            (self.heart_rate, self.body_temperature, self.blood_pressure.as_ref())
        else {
            return Err(TriageError::InvalidInput("required vitals missing".into()));
        };
        if !heart_rate.is_finite() || !body_temperature.is_finite() {
            return Err(TriageError::InvalidInput(
                "heart rate and body temperature must be finite".into(),
            ));
        }
        let (systolic, diastolic) = bp.resolve()?;
        Ok(ClinicalReading {
            heart_rate,
            body_temperature,
            systolic,
            diastolic,
            bmi: self.bmi(),
            age_years: self.age_years,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Vitals {
        Vitals {
            heart_rate: Some(72.0),
            blood_pressure: Some(BloodPressure::Reading("120/80".into())),
            body_temperature: Some(36.8),
            ..Vitals::default()
        }
    }

    #[test]
    fn parses_pressure_text_with_units() {
        let bp = BloodPressure::Reading(" 145 / 95 mmHg".into());
        assert_eq!(bp.resolve().unwrap(), (145.0, 95.0));
    }

    #[test]
    fn rejects_pressure_without_separator() {
        let bp = BloodPressure::Reading("120-80".into());
        assert!(matches!(bp.resolve(), Err(TriageError::InvalidInput(_))));
        let bp = BloodPressure::Reading("high/low".into());
        assert!(bp.resolve().is_err());
    }

    #[test]
    fn split_pressure_passes_through() {
        let bp = BloodPressure::Split {
            systolic: 110.0,
            diastolic: 70.0,
        };
        assert_eq!(bp.resolve().unwrap(), (110.0, 70.0));
    }

    #[test]
    fn bmi_rounds_to_one_decimal() {
        let v = Vitals {
            height_cm: Some(180.0),
            weight_kg: Some(81.0),
            ..base()
        };
        assert_eq!(v.bmi(), Some(25.0));
        assert_eq!(base().bmi(), None);
    }

    #[test]
    fn missing_required_fields_are_listed() {
        let v = Vitals {
            heart_rate: None,
            blood_pressure: None,
            ..base()
        };
        let err = v.reading().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid input: required vitals missing: heart_rate, blood_pressure"
        );
    }

    #[test]
    fn reading_carries_optional_fields() {
        let v = Vitals {
            age_years: Some(70),
            ..base()
        };
        let r = v.reading().unwrap();
        assert_eq!(r.systolic, 120.0);
        assert_eq!(r.diastolic, 80.0);
        assert_eq!(r.age_years, Some(70));
        assert_eq!(r.bmi, None);
    }

    #[test]
    fn deserializes_both_pressure_shapes() {
        let text: Vitals =
            serde_json::from_str(r#"{"heart_rate":80,"blood_pressure":"130/85"}"#).unwrap();
        assert_eq!(
            text.blood_pressure,
            Some(BloodPressure::Reading("130/85".into()))
        );
        let split: Vitals = serde_json::from_str(
            r#"{"blood_pressure":{"systolic":130,"diastolic":85}}"#,
        )
        .unwrap();
        assert_eq!(
            split.blood_pressure,
            Some(BloodPressure::Split {
                systolic: 130.0,
                diastolic: 85.0
            })
        );
    }
}
