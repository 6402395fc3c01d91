//! Patient data captured for one prescription.
//!
//! Nothing here is validated beyond presence: the record mirrors what the clinician typed
//! so the exported document shows exactly that. Numeric fields left blank render as empty;
//! text that is not a number is refused and the previous value kept.

use crate::error::{PrescriptionError, PrescriptionResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

impl FromStr for Sex {
    type Err = PrescriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "f" | "female" | "femenino" => Ok(Sex::Female),
            "m" | "male" | "masculino" => Ok(Sex::Male),
            other => Err(PrescriptionError::InvalidInput(format!(
                "unknown sex label: {:?}",
                other
            ))),
        }
    }
}

/// Patient block of the prescription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientRecord {
    pub code: String,
    pub consultation_number: String,
    pub name: String,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    /// Kilograms.
    pub weight: Option<f64>,
    /// Centimetres.
    pub height: Option<f64>,
    pub disease: String,
    pub diagnosis: String,
}

/// Patient attributes that can be set from text, e.g. by the interactive controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientField {
    Code,
    ConsultationNumber,
    Name,
    Age,
    Sex,
    Weight,
    Height,
    Disease,
    Diagnosis,
}

impl FromStr for PatientField {
    type Err = PrescriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "code" | "patientcode" => PatientField::Code,
            "consultation" | "consultationnumber" => PatientField::ConsultationNumber,
            "name" => PatientField::Name,
            "age" => PatientField::Age,
            "sex" => PatientField::Sex,
            "weight" => PatientField::Weight,
            "height" => PatientField::Height,
            "disease" => PatientField::Disease,
            "diagnosis" => PatientField::Diagnosis,
            _ => {
                return Err(PrescriptionError::InvalidInput(format!(
                    "unknown patient field: {:?}",
                    s
                )))
            }
        };
        Ok(field)
    }
}

impl PatientRecord {
    /// Sets one attribute from raw text.
    ///
    /// Blank text clears optional attributes. Weight and height accept a decimal comma.
    ///
    /// # Errors
    ///
    /// Returns `PrescriptionError::InvalidInput` for a non-blank age, weight or height
    /// that is not a number, or a sex label outside the closed set. The attribute keeps
    /// its previous value.
    pub fn set_field(&mut self, field: PatientField, value: &str) -> PrescriptionResult<()> {
        let text = value.trim();
        match field {
            PatientField::Code => self.code = text.to_string(),
            PatientField::ConsultationNumber => self.consultation_number = text.to_string(),
            PatientField::Name => self.name = text.to_string(),
            PatientField::Age => self.age = parse_age(text)?,
            PatientField::Sex => {
                self.sex = if text.is_empty() {
                    None
                } else {
                    Some(text.parse()?)
                }
            }
            PatientField::Weight => self.weight = parse_measurement("weight", text)?,
            PatientField::Height => self.height = parse_measurement("height", text)?,
            PatientField::Disease => self.disease = text.to_string(),
            PatientField::Diagnosis => self.diagnosis = text.to_string(),
        }
        Ok(())
    }
}

fn parse_age(text: &str) -> PrescriptionResult<Option<u32>> {
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<u32>().map(Some).map_err(|_| {
        PrescriptionError::InvalidInput(format!("age must be a whole number, got {:?}", text))
    })
}

fn parse_measurement(name: &str, text: &str) -> PrescriptionResult<Option<f64>> {
    if text.is_empty() {
        return Ok(None);
    }
    text.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(Some)
        .ok_or_else(|| {
            PrescriptionError::InvalidInput(format!(
                "{} must be a non-negative number, got {:?}",
                name, text
            ))
        })
}

/// Formats an optional number for display, empty when absent.
pub(crate) fn display_optional<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_text_fields_trims_input() {
        let mut patient = PatientRecord::default();
        patient.set_field(PatientField::Name, "  Ana Pérez ").unwrap();
        patient.set_field(PatientField::Code, "P-001").unwrap();
        assert_eq!(patient.name, "Ana Pérez");
        assert_eq!(patient.code, "P-001");
    }

    #[test]
    fn test_unreadable_number_keeps_previous_value() {
        let mut patient = PatientRecord::default();
        patient.set_field(PatientField::Age, "34").unwrap();
        patient.set_field(PatientField::Weight, "61,5").unwrap();

        let result = patient.set_field(PatientField::Age, "34 años");
        assert!(matches!(result, Err(PrescriptionError::InvalidInput(_))));
        assert_eq!(patient.age, Some(34));

        assert!(patient.set_field(PatientField::Weight, "60 kg").is_err());
        assert!(patient.set_field(PatientField::Weight, "-3").is_err());
        assert!(patient.set_field(PatientField::Height, "alto").is_err());
        assert_eq!(patient.weight, Some(61.5));
        assert_eq!(patient.height, None);
    }

    #[test]
    fn test_blank_number_clears_value() {
        let mut patient = PatientRecord::default();
        patient.set_field(PatientField::Age, "34").unwrap();
        patient.set_field(PatientField::Height, "165").unwrap();

        patient.set_field(PatientField::Age, "  ").unwrap();
        patient.set_field(PatientField::Height, "").unwrap();

        assert_eq!(patient.age, None);
        assert_eq!(patient.height, None);
    }

    #[test]
    fn test_measurements_accept_decimal_comma() {
        let mut patient = PatientRecord::default();
        patient.set_field(PatientField::Weight, "60,5").unwrap();
        patient.set_field(PatientField::Height, "165").unwrap();
        assert_eq!(patient.weight, Some(60.5));
        assert_eq!(display_optional(patient.height), "165");
    }

    #[test]
    fn test_sex_labels() {
        let mut patient = PatientRecord::default();
        patient.set_field(PatientField::Sex, "Femenino").unwrap();
        assert_eq!(patient.sex, Some(Sex::Female));

        patient.set_field(PatientField::Sex, "").unwrap();
        assert_eq!(patient.sex, None);

        assert!(patient.set_field(PatientField::Sex, "x").is_err());
    }

    #[test]
    fn test_field_names_are_forgiving() {
        assert_eq!(
            "consultation-number".parse::<PatientField>().unwrap(),
            PatientField::ConsultationNumber
        );
        assert_eq!("patient_code".parse::<PatientField>().unwrap(), PatientField::Code);
        assert!("shoe size".parse::<PatientField>().is_err());
    }

    #[test]
    fn test_deserialize_partial_record() {
        let patient: PatientRecord =
            serde_yaml::from_str("name: Ana\nage: 34\nsex: female\n").unwrap();
        assert_eq!(patient.name, "Ana");
        assert_eq!(patient.age, Some(34));
        assert_eq!(patient.sex, Some(Sex::Female));
        assert!(patient.diagnosis.is_empty());
    }
}
