use crate::prescription::LineRejection;

#[derive(Debug, thiserror::Error)]
pub enum PrescriptionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("line rejected: {0}")]
    LineRejected(#[from] LineRejection),
    #[error("no prescription line at position {index} (set has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("unknown language: {0}")]
    UnknownLanguage(String),
    #[error("unknown export format: {0}")]
    UnknownExportFormat(String),
    #[error("unknown catalog format: {0}")]
    UnknownCatalogFormat(String),

    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),
    #[error("failed to parse catalog JSON: {0}")]
    CatalogJson(serde_json::Error),

    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),

    #[error("failed to render document: {0}")]
    Render(String),
    #[error("failed to save export: {0}")]
    Files(#[from] receta_files::FilesError),
    #[error("invalid text: {0}")]
    Text(#[from] receta_types::TextError),
}

impl PrescriptionError {
    /// True for failures that happen while producing or delivering an artifact.
    ///
    /// These must be surfaced to the user; the session state is untouched and the
    /// export can be retried.
    pub fn is_export_failure(&self) -> bool {
        matches!(self, Self::Render(_) | Self::Files(_))
    }
}

pub type PrescriptionResult<T> = std::result::Result<T, PrescriptionError>;
