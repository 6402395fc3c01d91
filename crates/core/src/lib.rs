//! # Receta Core
//!
//! Core logic for drafting clinical prescriptions.
//!
//! This crate contains the in-memory model and the pure transforms over it:
//! - Patient record, product catalog and the prescription line builder
//! - The editing session that owns all mutable state
//! - Document composition and rendering to PDF, Markdown and plain text
//!
//! **No UI concerns**: reading user input, printing and process setup belong in `receta-cli`.
//! Writing artifacts to disk is delegated to `receta-files` through [`ArtifactSink`].

pub mod catalog;
pub mod config;
pub mod constants;
pub mod document;
pub mod error;
pub mod export;
pub mod language;
pub mod patient;
pub mod prescription;
pub mod render;
pub mod session;

pub use catalog::{
    Catalog, CatalogEntry, CatalogFormat, CatalogHandle, CatalogSource, SheetExportFile,
    StaticCatalog, YamlCatalogFile,
};
pub use config::{CatalogLocation, CoreConfig};
pub use document::{compose, Document};
pub use error::{PrescriptionError, PrescriptionResult};
pub use export::{export, Artifact, ArtifactSink};
pub use language::{Language, LanguageTable};
pub use patient::{PatientField, PatientRecord, Sex};
pub use prescription::{
    bottles_required, parse_positive_count, DraftField, Duration, DurationUnit, LineDraft,
    LineRejection, PresentationVolume, PrescriptionLine, PrescriptionSet,
};
pub use render::ExportFormat;
pub use session::PrescriptionSession;
