//! Serialisers for the prescription [`Document`](crate::document::Document) tree.
//!
//! The tree is format-free; each submodule turns it into bytes for one artifact type.
//! Text and markdown output is byte-for-byte deterministic. PDF output embeds a creation
//! date and document id, so only its content is deterministic.

mod markdown;
mod pdf;
mod text;

pub use markdown::render_markdown;
pub use pdf::render_pdf;
pub use text::render_text;

use crate::document::Document;
use crate::error::{PrescriptionError, PrescriptionResult};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Pdf,
    Markdown,
    Text,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Markdown => "md",
            ExportFormat::Text => "txt",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Markdown => "text/markdown; charset=utf-8",
            ExportFormat::Text => "text/plain; charset=utf-8",
        }
    }

    pub fn render(self, document: &Document) -> PrescriptionResult<Vec<u8>> {
        match self {
            ExportFormat::Pdf => render_pdf(document),
            ExportFormat::Markdown => Ok(render_markdown(document).into_bytes()),
            ExportFormat::Text => Ok(render_text(document).into_bytes()),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = PrescriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            "txt" | "text" => Ok(ExportFormat::Text),
            other => Err(PrescriptionError::UnknownExportFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}
