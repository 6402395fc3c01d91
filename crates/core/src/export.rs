//! Document export: content tree to named artifact, and delivery to a sink.

use crate::document::{artifact_file_name, compose, Document};
use crate::error::PrescriptionResult;
use crate::language::LanguageTable;
use crate::patient::PatientRecord;
use crate::prescription::PrescriptionLine;
use crate::render::ExportFormat;
use receta_files::{ExportMetadata, ExportsService};

/// A rendered prescription ready to be saved or offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub format: ExportFormat,
    pub document: Document,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn media_type(&self) -> &'static str {
        self.format.media_type()
    }
}

/// Builds the artifact for one prescription.
///
/// Pure with respect to its inputs: nothing is read besides the arguments and nothing is
/// written. Calling it again with the same inputs yields an equal document.
///
/// # Errors
///
/// Returns `PrescriptionError::Render` if the format's serialiser fails.
pub fn export(
    patient: &PatientRecord,
    lines: &[PrescriptionLine],
    labels: &LanguageTable,
    format: ExportFormat,
) -> PrescriptionResult<Artifact> {
    let document = compose(patient, lines, labels);
    let bytes = format.render(&document)?;

    Ok(Artifact {
        file_name: artifact_file_name(patient, format.extension()),
        format,
        document,
        bytes,
    })
}

/// Where finished artifacts go.
pub trait ArtifactSink {
    fn save(&self, artifact: &Artifact) -> PrescriptionResult<ExportMetadata>;
}

impl ArtifactSink for ExportsService {
    fn save(&self, artifact: &Artifact) -> PrescriptionResult<ExportMetadata> {
        Ok(ExportsService::save(self, &artifact.file_name, &artifact.bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prescription::LineDraft;
    use receta_types::NonEmptyText;
    use tempfile::TempDir;

    fn lines() -> Vec<PrescriptionLine> {
        vec![PrescriptionLine::from_draft(&LineDraft {
            product: NonEmptyText::optional("Tonico"),
            dose: "5".into(),
            times_per_day: "3".into(),
            duration: "10".into(),
            ..LineDraft::default()
        })
        .unwrap()]
    }

    fn patient() -> PatientRecord {
        PatientRecord {
            name: "Ana".into(),
            ..PatientRecord::default()
        }
    }

    #[test]
    fn test_export_names_artifact_after_patient() {
        let artifact = export(&patient(), &lines(), &LanguageTable::spanish(), ExportFormat::Text).unwrap();
        assert_eq!(artifact.file_name, "Receta_Ana.txt");
        assert_eq!(artifact.media_type(), "text/plain; charset=utf-8");
        assert!(String::from_utf8(artifact.bytes).unwrap().contains("1. Tonico"));
    }

    #[test]
    fn test_export_twice_is_identical() {
        let table = LanguageTable::spanish();
        for format in [ExportFormat::Text, ExportFormat::Markdown] {
            let a = export(&patient(), &lines(), &table, format).unwrap();
            let b = export(&patient(), &lines(), &table, format).unwrap();
            assert_eq!(a, b);
        }

        let a = export(&patient(), &lines(), &table, ExportFormat::Pdf).unwrap();
        let b = export(&patient(), &lines(), &table, ExportFormat::Pdf).unwrap();
        assert_eq!(a.document, b.document);
    }

    #[test]
    fn test_exports_service_is_an_artifact_sink() {
        let temp = TempDir::new().unwrap();
        let service = ExportsService::new(temp.path()).unwrap();
        let artifact = export(&patient(), &lines(), &LanguageTable::spanish(), ExportFormat::Markdown).unwrap();

        let sink: &dyn ArtifactSink = &service;
        let saved = sink.save(&artifact).unwrap();

        assert_eq!(saved.file_name.as_str(), "Receta_Ana.md");
        assert_eq!(std::fs::read(&saved.path).unwrap(), artifact.bytes);
    }
}
