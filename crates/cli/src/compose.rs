//! Non-interactive prescription building from a YAML draft file.
//!
//! ```yaml
//! patient:
//!   name: Ana
//!   age: 34
//!   sex: female
//! lines:
//!   - product: T1
//!     dose: 5
//!     times_per_day: 3
//!     duration: 10
//!   - product: Gotas
//!     presentation: 240
//!     dose: 10
//!     times_per_day: 2
//!     duration: 2
//!     unit: months
//!     notes: después de comer
//! ```
//!
//! Every value is read as the text a user would have typed, so `dose: 2.5` behaves like
//! typing `2.5` in the form. Each line goes through the same session operations as the
//! interactive controller; lines the session refuses are reported and skipped.

use anyhow::Context;
use receta_core::{
    CoreConfig, DraftField, ExportFormat, PatientField, PrescriptionError, PrescriptionResult,
    PrescriptionSession,
};
use receta_files::ExportMetadata;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::io::Write;
use std::path::Path;

/// A scalar kept as text, whatever YAML type it was written as.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawText(String);

impl RawText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for RawText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_yaml::Value::deserialize(deserializer)? {
            serde_yaml::Value::String(s) => Ok(RawText(s)),
            serde_yaml::Value::Number(n) => Ok(RawText(n.to_string())),
            serde_yaml::Value::Bool(b) => Ok(RawText(b.to_string())),
            serde_yaml::Value::Null => Ok(RawText::default()),
            other => Err(D::Error::custom(format!(
                "expected a single value, found {:?}",
                other
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatientInput {
    pub code: Option<RawText>,
    #[serde(alias = "consultation")]
    pub consultation_number: Option<RawText>,
    pub name: Option<RawText>,
    pub age: Option<RawText>,
    pub sex: Option<RawText>,
    pub weight: Option<RawText>,
    pub height: Option<RawText>,
    pub disease: Option<RawText>,
    pub diagnosis: Option<RawText>,
}

impl PatientInput {
    fn fields(&self) -> [(PatientField, Option<&RawText>); 9] {
        [
            (PatientField::Code, self.code.as_ref()),
            (PatientField::ConsultationNumber, self.consultation_number.as_ref()),
            (PatientField::Name, self.name.as_ref()),
            (PatientField::Age, self.age.as_ref()),
            (PatientField::Sex, self.sex.as_ref()),
            (PatientField::Weight, self.weight.as_ref()),
            (PatientField::Height, self.height.as_ref()),
            (PatientField::Disease, self.disease.as_ref()),
            (PatientField::Diagnosis, self.diagnosis.as_ref()),
        ]
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineInput {
    pub product: Option<RawText>,
    pub presentation: Option<RawText>,
    pub dose: Option<RawText>,
    #[serde(alias = "times")]
    pub times_per_day: Option<RawText>,
    pub duration: Option<RawText>,
    #[serde(alias = "duration_unit")]
    pub unit: Option<RawText>,
    pub notes: Option<RawText>,
}

impl LineInput {
    fn fields(&self) -> [(DraftField, Option<&RawText>); 6] {
        [
            (DraftField::Presentation, self.presentation.as_ref()),
            (DraftField::Dose, self.dose.as_ref()),
            (DraftField::TimesPerDay, self.times_per_day.as_ref()),
            (DraftField::Duration, self.duration.as_ref()),
            (DraftField::DurationUnit, self.unit.as_ref()),
            (DraftField::Notes, self.notes.as_ref()),
        ]
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComposeInput {
    #[serde(default)]
    pub patient: PatientInput,
    #[serde(default)]
    pub lines: Vec<LineInput>,
}

impl ComposeInput {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("invalid draft file {}", path.display()))
    }
}

/// A line that did not make it into the prescription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// One-based position in the input file.
    pub item: usize,
    pub reason: String,
}

/// Feeds `input` into `session`: patient fields first, then each line in order.
///
/// # Errors
///
/// A patient field the session rejects (an unknown sex label, an age that is not a
/// number) fails the whole input.
/// Line problems never do; they come back as [`SkippedLine`]s.
pub fn apply(
    session: &mut PrescriptionSession,
    input: &ComposeInput,
) -> PrescriptionResult<Vec<SkippedLine>> {
    for (field, value) in input.patient.fields() {
        if let Some(value) = value {
            session.set_patient_field(field, value.as_str())?;
        }
    }

    let mut skipped = Vec::new();
    for (i, line) in input.lines.iter().enumerate() {
        let outcome = stage_line(session, line)
            .and_then(|()| session.try_add_line().map(|_| ()).map_err(PrescriptionError::from));

        if let Err(e) = outcome {
            tracing::debug!(item = i + 1, error = %e, "input line skipped");
            session.draft_mut().reset();
            skipped.push(SkippedLine {
                item: i + 1,
                reason: e.to_string(),
            });
        }
    }

    Ok(skipped)
}

/// Fills the draft from one input line. Products are looked up in the catalog first and
/// used as typed when nothing matches.
fn stage_line(session: &mut PrescriptionSession, line: &LineInput) -> PrescriptionResult<()> {
    if let Some(product) = line.product.as_ref().map(RawText::as_str) {
        if !product.trim().is_empty() && session.select_product(product).is_none() {
            session.enter_product(product)?;
        }
    }

    for (field, value) in line.fields() {
        if let Some(value) = value {
            session.set_draft_field(field, value.as_str())?;
        }
    }

    Ok(())
}

/// Reads the draft file, builds the prescription and exports it once.
pub fn run(
    config: &CoreConfig,
    input_path: &Path,
    format: ExportFormat,
    out: &mut impl Write,
) -> anyhow::Result<ExportMetadata> {
    let input = ComposeInput::load(input_path)?;
    let mut session = PrescriptionSession::new(config.labels()?);

    if let Some(location) = config.catalog() {
        if let Err(e) = session.catalog_handle().load_now(location.source().as_ref()) {
            tracing::warn!(error = %e, "catalog unavailable, products are used as typed");
        }
    }

    for skipped in apply(&mut session, &input)? {
        writeln!(out, "skipped line {}: {}", skipped.item, skipped.reason)?;
    }

    let sink = config.exports_service()?;
    let saved = session.export_to(format, &sink)?;
    writeln!(
        out,
        "{} lines, saved {}",
        session.lines().len(),
        saved.path.display()
    )?;

    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use receta_core::{CatalogEntry, CatalogHandle, Language, LanguageTable, Sex, StaticCatalog};
    use receta_types::NonEmptyText;
    use tempfile::TempDir;

    const DRAFT: &str = r#"
patient:
  name: Ana
  consultation: 12
  age: 34
  sex: femenino
  weight: 61.5
lines:
  - product: T1
    dose: 5
    times: 3
    duration: 10
  - product: Gotas
    dose: 5
    duration: 10
  - product: Jarabe casero
    presentation: 240
    dose: "2.9"
    times_per_day: 2
    duration: 1
    unit: months
    notes: después de comer
  - product: Tonico
    presentation: 500
    dose: 5
    times: 1
    duration: 1
"#;

    fn session_with_catalog() -> PrescriptionSession {
        let session = PrescriptionSession::new(LanguageTable::spanish());
        let handle: &CatalogHandle = session.catalog_handle();
        handle
            .load_now(&StaticCatalog(vec![
                CatalogEntry::new(
                    NonEmptyText::new("Tonico").unwrap(),
                    NonEmptyText::optional("T1"),
                ),
                CatalogEntry::new(NonEmptyText::new("Gotas").unwrap(), None),
            ]))
            .unwrap();
        session
    }

    #[test]
    fn test_numbers_are_read_as_typed_text() {
        let input: ComposeInput = serde_yaml::from_str(DRAFT).unwrap();

        assert_eq!(input.patient.consultation_number.unwrap().as_str(), "12");
        assert_eq!(input.patient.weight.unwrap().as_str(), "61.5");
        assert_eq!(input.lines.len(), 4);
        assert_eq!(input.lines[2].dose.as_ref().unwrap().as_str(), "2.9");
        assert_eq!(input.lines[0].times_per_day.as_ref().unwrap().as_str(), "3");
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result: Result<ComposeInput, _> = serde_yaml::from_str("lines:\n  - product: A\n    colour: red\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_adds_complete_lines_and_skips_the_rest() {
        let input: ComposeInput = serde_yaml::from_str(DRAFT).unwrap();
        let mut session = session_with_catalog();

        let skipped = apply(&mut session, &input).unwrap();

        assert_eq!(session.patient().name, "Ana");
        assert_eq!(session.patient().sex, Some(Sex::Female));
        assert_eq!(session.patient().age, Some(34));

        let products: Vec<&str> = session.lines().iter().map(|l| l.product().as_str()).collect();
        assert_eq!(products, vec!["T1 - Tonico", "Jarabe casero"]);
        // 2 ml (truncated) * 2 * 30 days / 240 ml
        assert_eq!(session.lines().get(1).unwrap().bottles_required(), 1);

        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0].item, 2);
        assert!(skipped[0].reason.contains("times per day"));
        assert_eq!(skipped[1].item, 4);
        assert!(skipped[1].reason.contains("presentation"));
        assert_eq!(session.draft(), &Default::default());
    }

    #[test]
    fn test_bad_patient_sex_fails_the_input() {
        let input: ComposeInput = serde_yaml::from_str("patient:\n  sex: other\n").unwrap();
        let mut session = PrescriptionSession::new(LanguageTable::spanish());
        assert!(apply(&mut session, &input).is_err());
    }

    #[test]
    fn test_unreadable_patient_age_fails_the_input() {
        let input: ComposeInput = serde_yaml::from_str("patient:\n  age: 34 años\n").unwrap();
        let mut session = PrescriptionSession::new(LanguageTable::spanish());
        let err = apply(&mut session, &input).unwrap_err();
        assert!(err.to_string().contains("34 años"));
        assert_eq!(session.patient().age, None);
    }

    #[test]
    fn test_run_exports_once() {
        let temp = TempDir::new().unwrap();
        let input_path = temp.path().join("draft.yaml");
        std::fs::write(&input_path, DRAFT).unwrap();
        let config = CoreConfig::new(
            temp.path().join("out"),
            Language::Es,
            None,
            ExportFormat::Text,
            None,
        )
        .unwrap();

        let mut out = Vec::new();
        let saved = run(&config, &input_path, ExportFormat::Text, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert_eq!(saved.file_name.as_str(), "Receta_Ana.txt");
        assert!(out.contains("skipped line 2:"));
        assert!(out.contains("2 lines, saved"));
        assert!(out.contains("skipped line 4:"));

        let text = std::fs::read_to_string(&saved.path).unwrap();
        assert!(text.contains("1. T1 (120 ml)"));
        assert!(text.contains("Obs: después de comer"));
    }
}
