//! receta export storage
//!
//! This crate is the "save a named blob" end of the export pipeline. The core hands it a
//! fully rendered artifact and a file name; this crate decides where the bytes land and
//! records what was written.
//!
//! ## Design Principles
//!
//! - Exports are never overwritten: a second export with the same name gets a ` (n)`
//!   suffix, the way a browser download does
//! - File names derived from patient data are sanitised and shortened before touching the
//!   filesystem
//! - A failed write leaves nothing behind under the export's name
//! - Every saved artifact is described by [`ExportMetadata`] (digest, size, media type)
//!
//! ## Layout
//!
//! ```text
//! <export_dir>/
//! ├── Receta_Ana.pdf
//! ├── Receta_Ana (1).pdf
//! └── Receta_paciente.md
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use receta_files::ExportsService;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = ExportsService::new(Path::new("exports"))?;
//! let saved = service.save("Receta_Ana.txt", b"RECETA MEDICA")?;
//! println!("{} ({} bytes)", saved.path.display(), saved.size_bytes);
//! # Ok(())
//! # }
//! ```

mod constants;
mod exports;

pub use constants::{HASH_ALGORITHM, MAX_DUPLICATE_SUFFIX, MAX_EXTENSION_BYTES, MAX_STEM_BYTES};
pub use exports::{sanitise_file_name, ExportMetadata, ExportsService};

/// Errors that can occur while storing exports
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Export path exists but is not a directory
    #[error("Invalid export directory: {0}")]
    InvalidExportDirectory(String),

    /// File name is empty or reduces to a relative path component after sanitising
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    /// Every duplicate suffix up to the limit is already taken
    #[error("No free file name for {0}")]
    NameExhausted(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
