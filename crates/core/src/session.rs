//! One prescription-editing session.
//!
//! [`PrescriptionSession`] owns the patient record, the draft of the next line and the
//! confirmed lines. It is the only place those are mutated. Export borrows the session
//! immutably, so a failed export never touches the patient or the lines.

use crate::catalog::{Catalog, CatalogHandle, CatalogSource};
use crate::error::PrescriptionResult;
use crate::export::{export, Artifact, ArtifactSink};
use crate::language::LanguageTable;
use crate::patient::{PatientField, PatientRecord};
use crate::prescription::{DraftField, LineDraft, LineRejection, PrescriptionLine, PrescriptionSet};
use crate::render::ExportFormat;
use receta_files::ExportMetadata;
use receta_types::NonEmptyText;
use std::sync::Arc;
use std::thread::JoinHandle;

#[derive(Debug, Default)]
pub struct PrescriptionSession {
    patient: PatientRecord,
    draft: LineDraft,
    lines: PrescriptionSet,
    catalog: CatalogHandle,
    labels: LanguageTable,
}

impl PrescriptionSession {
    pub fn new(labels: LanguageTable) -> Self {
        Self {
            labels,
            ..Self::default()
        }
    }

    /// Opens a session and starts loading the catalog in the background.
    ///
    /// The session is usable immediately; product selection sees an empty catalog until
    /// the load finishes. The returned handle is only needed by callers that want to wait.
    pub fn open(labels: LanguageTable, source: Box<dyn CatalogSource>) -> (Self, JoinHandle<()>) {
        let session = Self::new(labels);
        let loader = session.catalog.load_in_background(source);
        (session, loader)
    }

    pub fn patient(&self) -> &PatientRecord {
        &self.patient
    }

    pub fn patient_mut(&mut self) -> &mut PatientRecord {
        &mut self.patient
    }

    pub fn set_patient_field(&mut self, field: PatientField, value: &str) -> PrescriptionResult<()> {
        self.patient.set_field(field, value)
    }

    pub fn draft(&self) -> &LineDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut LineDraft {
        &mut self.draft
    }

    pub fn set_draft_field(&mut self, field: DraftField, value: &str) -> PrescriptionResult<()> {
        self.draft.set_field(field, value)
    }

    pub fn lines(&self) -> &PrescriptionSet {
        &self.lines
    }

    pub fn labels(&self) -> &LanguageTable {
        &self.labels
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.snapshot()
    }

    pub fn catalog_handle(&self) -> &CatalogHandle {
        &self.catalog
    }

    /// Picks a catalog entry for the draft.
    ///
    /// Returns the label now on the draft, or `None` (draft unchanged) when nothing in the
    /// current catalog snapshot matches.
    pub fn select_product(&mut self, query: &str) -> Option<&NonEmptyText> {
        let label = self.catalog.snapshot().select(query)?.label();
        self.draft.product = Some(label);
        self.draft.product.as_ref()
    }

    /// Puts free text on the draft as the product, for use without a catalog.
    pub fn enter_product(&mut self, text: &str) -> PrescriptionResult<&NonEmptyText> {
        let label = NonEmptyText::new(text)?;
        Ok(self.draft.product.insert(label))
    }

    /// Confirms the draft as a new line.
    ///
    /// On success the line is appended and the draft goes back to defaults. An incomplete
    /// draft is refused without an error: nothing is appended and the draft is kept so it
    /// can be completed. Use [`Self::try_add_line`] to learn why.
    pub fn add_line(&mut self) -> Option<&PrescriptionLine> {
        match self.try_add_line() {
            Ok(line) => Some(line),
            Err(reason) => {
                tracing::debug!(%reason, "draft not added");
                None
            }
        }
    }

    pub fn try_add_line(&mut self) -> Result<&PrescriptionLine, LineRejection> {
        let line = PrescriptionLine::from_draft(&self.draft)?;
        tracing::info!(
            product = %line.product(),
            bottles = line.bottles_required(),
            "line added"
        );
        self.draft.reset();
        Ok(self.lines.push(line))
    }

    /// Removes the line at zero-based `index`.
    ///
    /// # Errors
    ///
    /// Returns `PrescriptionError::IndexOutOfRange` when there is no such line; the set is
    /// unchanged.
    pub fn remove_line(&mut self, index: usize) -> PrescriptionResult<PrescriptionLine> {
        let removed = self.lines.remove(index)?;
        tracing::info!(index, product = %removed.product(), "line removed");
        Ok(removed)
    }

    pub fn export(&self, format: ExportFormat) -> PrescriptionResult<Artifact> {
        export(&self.patient, self.lines.as_slice(), &self.labels, format)
    }

    /// Exports and hands the artifact to `sink`.
    pub fn export_to(
        &self,
        format: ExportFormat,
        sink: &dyn ArtifactSink,
    ) -> PrescriptionResult<ExportMetadata> {
        let artifact = self.export(format)?;
        let saved = sink.save(&artifact)?;
        tracing::debug!(
            format = %format,
            lines = self.lines.len(),
            hash = %saved.hash,
            "prescription exported"
        );
        Ok(saved)
    }
}
