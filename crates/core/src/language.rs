//! Display strings for the form and the exported document.
//!
//! The exporter never hardcodes words; it looks every label up in a [`LanguageTable`].
//! Two tables are built in ([`Language::Es`], the default, and [`Language::En`]); custom
//! tables load from YAML using the camelCase key names:
//!
//! ```yaml
//! title: Formato de Prescripción
//! patientCode: Código paciente
//! # ...one entry per field of LanguageTable
//! ```

use crate::error::{PrescriptionError, PrescriptionResult};
use crate::patient::Sex;
use crate::prescription::DurationUnit;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    pub fn table(self) -> LanguageTable {
        match self {
            Language::Es => LanguageTable::spanish(),
            Language::En => LanguageTable::english(),
        }
    }
}

impl FromStr for Language {
    type Err = PrescriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "es" | "spanish" | "español" => Ok(Language::Es),
            "en" | "english" => Ok(Language::En),
            other => Err(PrescriptionError::UnknownLanguage(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageTable {
    pub title: String,
    pub patient_code: String,
    pub consultation: String,
    pub name: String,
    pub age: String,
    pub sex: String,
    pub female: String,
    pub male: String,
    pub weight: String,
    pub height: String,
    pub disease: String,
    pub diagnosis: String,
    pub select_product: String,
    pub presentation: String,
    pub dose: String,
    pub times_per_day: String,
    /// Frequency unit inside a prescription entry ("veces/día").
    pub times_per_day_unit: String,
    /// Joins frequency and duration inside a prescription entry ("por").
    pub per: String,
    pub duration: String,
    pub duration_type: String,
    pub days: String,
    pub months: String,
    pub observations: String,
    /// Prefix of the notes segment of a prescription entry ("Obs").
    pub observations_short: String,
    pub add_product: String,
    pub product: String,
    pub bottles: String,
    pub actions: String,
    pub remove: String,
    pub export_word: String,
    /// Document title.
    pub recipe: String,
    pub prescription: String,
}

impl LanguageTable {
    pub fn spanish() -> Self {
        Self {
            title: "Formato de Prescripción".into(),
            patient_code: "Código paciente".into(),
            consultation: "Consulta".into(),
            name: "Nombre".into(),
            age: "Edad".into(),
            sex: "Sexo".into(),
            female: "Femenino".into(),
            male: "Masculino".into(),
            weight: "Peso".into(),
            height: "Altura".into(),
            disease: "Enfermedad".into(),
            diagnosis: "Diagnóstico".into(),
            select_product: "Seleccionar producto".into(),
            presentation: "Presentación".into(),
            dose: "Dosis (ml)".into(),
            times_per_day: "Veces al día".into(),
            times_per_day_unit: "veces/día".into(),
            per: "por".into(),
            duration: "Duración".into(),
            duration_type: "Tipo de duración".into(),
            days: "días".into(),
            months: "meses".into(),
            observations: "Observaciones".into(),
            observations_short: "Obs".into(),
            add_product: "Agregar producto".into(),
            product: "Producto".into(),
            bottles: "frascos".into(),
            actions: "Acciones".into(),
            remove: "Quitar".into(),
            export_word: "Exportar".into(),
            recipe: "RECETA MÉDICA".into(),
            prescription: "Prescripción".into(),
        }
    }

    pub fn english() -> Self {
        Self {
            title: "Prescription Form".into(),
            patient_code: "Patient code".into(),
            consultation: "Consultation".into(),
            name: "Name".into(),
            age: "Age".into(),
            sex: "Sex".into(),
            female: "Female".into(),
            male: "Male".into(),
            weight: "Weight".into(),
            height: "Height".into(),
            disease: "Disease".into(),
            diagnosis: "Diagnosis".into(),
            select_product: "Select product".into(),
            presentation: "Presentation".into(),
            dose: "Dose (ml)".into(),
            times_per_day: "Times per day".into(),
            times_per_day_unit: "times/day".into(),
            per: "for".into(),
            duration: "Duration".into(),
            duration_type: "Duration type".into(),
            days: "days".into(),
            months: "months".into(),
            observations: "Observations".into(),
            observations_short: "Notes".into(),
            add_product: "Add product".into(),
            product: "Product".into(),
            bottles: "bottles".into(),
            actions: "Actions".into(),
            remove: "Remove".into(),
            export_word: "Export".into(),
            recipe: "MEDICAL PRESCRIPTION".into(),
            prescription: "Prescription".into(),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> PrescriptionResult<Self> {
        serde_yaml::from_str(yaml).map_err(PrescriptionError::YamlDeserialization)
    }

    /// Loads a custom table. Every key must be present.
    pub fn load(path: &Path) -> PrescriptionResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(PrescriptionError::FileRead)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn to_yaml(&self) -> PrescriptionResult<String> {
        serde_yaml::to_string(self).map_err(PrescriptionError::YamlSerialization)
    }

    pub fn sex_label(&self, sex: Sex) -> &str {
        match sex {
            Sex::Female => &self.female,
            Sex::Male => &self.male,
        }
    }

    pub fn duration_unit_label(&self, unit: DurationUnit) -> &str {
        match unit {
            DurationUnit::Days => &self.days,
            DurationUnit::Months => &self.months,
        }
    }
}

impl Default for LanguageTable {
    fn default() -> Self {
        Language::default().table()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_language_is_spanish() {
        assert_eq!(LanguageTable::default(), LanguageTable::spanish());
        assert_eq!(LanguageTable::default().bottles, "frascos");
    }

    #[test]
    fn test_language_names() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!("español".parse::<Language>().unwrap(), Language::Es);
        assert!(matches!(
            "fr".parse::<Language>(),
            Err(PrescriptionError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_yaml_roundtrip_uses_camel_case_keys() {
        let yaml = LanguageTable::english().to_yaml().unwrap();
        assert!(yaml.contains("patientCode: Patient code"));
        assert!(yaml.contains("timesPerDayUnit: times/day"));

        let parsed = LanguageTable::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, LanguageTable::english());
    }

    #[test]
    fn test_yaml_with_missing_key_is_rejected() {
        let result = LanguageTable::from_yaml_str("title: Receta\n");
        assert!(matches!(
            result,
            Err(PrescriptionError::YamlDeserialization(_))
        ));
    }

    #[test]
    fn test_load_custom_table_from_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("pt.yaml");
        let mut table = LanguageTable::spanish();
        table.bottles = "frascos (pt)".into();
        std::fs::write(&path, table.to_yaml().unwrap()).unwrap();

        assert_eq!(LanguageTable::load(&path).unwrap().bottles, "frascos (pt)");
        assert!(LanguageTable::load(&temp.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_enum_labels() {
        let es = LanguageTable::spanish();
        assert_eq!(es.sex_label(Sex::Male), "Masculino");
        assert_eq!(es.duration_unit_label(DurationUnit::Months), "meses");
    }
}
