//! Export directory service implementation
//!
//! [`ExportsService`] owns one directory and writes rendered prescription artifacts into
//! it. Writes are create-only: the service opens the target with `create_new`, so an
//! existing export is never truncated, even if another process races for the same name.
//! A write that fails part way removes the file again.

use crate::{FilesError, HASH_ALGORITHM, MAX_DUPLICATE_SUFFIX, MAX_EXTENSION_BYTES, MAX_STEM_BYTES};
use chrono::{DateTime, Utc};
use receta_types::NonEmptyText;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Metadata for a saved export
///
/// Describes exactly what was written so the caller can tell the user where the
/// artifact went and verify it later.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct ExportMetadata {
    /// Hashing algorithm used (always "sha256")
    pub hash_algorithm: NonEmptyText,

    /// Hexadecimal digest of the file content
    pub hash: String,

    /// Name the file was finally stored under (after sanitising and de-duplication)
    pub file_name: NonEmptyText,

    /// Absolute path of the stored file
    pub path: PathBuf,

    /// Size of the file in bytes
    pub size_bytes: u64,

    /// Detected media type, if the content has a recognisable signature
    ///
    /// Text formats (markdown, plain text) carry no magic bytes and report `None`.
    pub media_type: Option<NonEmptyText>,

    /// UTC timestamp when the file was stored
    pub stored_at: DateTime<Utc>,
}

/// Service for writing exports into a single directory
#[derive(Debug)]
pub struct ExportsService {
    export_dir: PathBuf,
}

impl ExportsService {
    /// Creates a new `ExportsService`, creating the directory when it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - the path exists but is not a directory
    /// - the directory cannot be created or canonicalised
    pub fn new(export_dir: &Path) -> Result<Self, FilesError> {
        if export_dir.exists() && !export_dir.is_dir() {
            return Err(FilesError::InvalidExportDirectory(format!(
                "Path is not a directory: {}",
                export_dir.display()
            )));
        }

        fs::create_dir_all(export_dir).map_err(|e| {
            FilesError::InvalidExportDirectory(format!(
                "Cannot create {}: {}",
                export_dir.display(),
                e
            ))
        })?;

        let export_dir = export_dir.canonicalize().map_err(|e| {
            FilesError::InvalidExportDirectory(format!(
                "Cannot canonicalize path {}: {}",
                export_dir.display(),
                e
            ))
        })?;

        Ok(Self { export_dir })
    }

    /// Writes `bytes` under `file_name`, never replacing an earlier export.
    ///
    /// The name is sanitised first (see [`sanitise_file_name`]). If the sanitised name is
    /// taken, `stem (1).ext`, `stem (2).ext`, ... are tried in turn.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - the name is empty or unusable after sanitising
    /// - every suffix up to [`MAX_DUPLICATE_SUFFIX`] is taken
    /// - the file cannot be created or written (I/O); a partly written file is removed
    pub fn save(&self, file_name: &str, bytes: &[u8]) -> Result<ExportMetadata, FilesError> {
        let base_name = sanitise_file_name(file_name)?;

        let (file_name, path, file) = self.create_unique(&base_name)?;

        write_or_remove(file, &path, bytes, |f| f.sync_all())?;

        let hash = hex::encode(Sha256::digest(bytes));

        let media_type = infer::get(bytes).and_then(|kind| NonEmptyText::optional(kind.mime_type()));

        tracing::info!(file = %path.display(), size = bytes.len(), "saved export");

        Ok(ExportMetadata {
            hash_algorithm: NonEmptyText::new(HASH_ALGORITHM)
                .map_err(|e| FilesError::InvalidFileName(e.to_string()))?,
            hash,
            file_name,
            path,
            size_bytes: bytes.len() as u64,
            media_type,
            stored_at: Utc::now(),
        })
    }

    /// Returns the canonicalised export directory
    #[must_use]
    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    fn create_unique(
        &self,
        base_name: &NonEmptyText,
    ) -> Result<(NonEmptyText, PathBuf, fs::File), FilesError> {
        for attempt in 0..=MAX_DUPLICATE_SUFFIX {
            let candidate = if attempt == 0 {
                base_name.clone()
            } else {
                numbered_name(base_name.as_str(), attempt)?
            };
            let path = self.export_dir.join(candidate.as_str());

            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(file) => return Ok((candidate, path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(FilesError::Io(std::io::Error::new(
                        e.kind(),
                        format!("Failed to create export {}: {}", path.display(), e),
                    )))
                }
            }
        }

        Err(FilesError::NameExhausted(base_name.to_string()))
    }
}

/// Writes `bytes` to the freshly created `path`, then runs `finish` (the sync).
///
/// On any failure the file is closed and removed so the name is free for a retry.
fn write_or_remove<W: Write>(
    mut file: W,
    path: &Path,
    bytes: &[u8],
    finish: impl FnOnce(&mut W) -> std::io::Result<()>,
) -> Result<(), FilesError> {
    let result = file.write_all(bytes).and_then(|()| finish(&mut file));
    drop(file);

    result.map_err(|e| {
        if let Err(remove_err) = fs::remove_file(path) {
            tracing::warn!(
                file = %path.display(),
                error = %remove_err,
                "could not remove incomplete export"
            );
        }
        FilesError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to write export {}: {}", path.display(), e),
        ))
    })
}

/// Makes a user-derived name safe to use as a single path component.
///
/// Path separators, characters Windows refuses (`: * ? " < > |`) and control characters
/// become `_`. Names that reduce to `.` or `..` are rejected. A stem longer than
/// [`MAX_STEM_BYTES`] is cut on a character boundary; the extension is kept.
pub fn sanitise_file_name(name: &str) -> Result<NonEmptyText, FilesError> {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let cleaned = NonEmptyText::new(shorten(&cleaned))
        .map_err(|_| FilesError::InvalidFileName(format!("{:?} is empty", name)))?;

    if matches!(cleaned.as_str(), "." | "..") {
        return Err(FilesError::InvalidFileName(format!(
            "{:?} is not a file name",
            name
        )));
    }

    Ok(cleaned)
}

fn shorten(name: &str) -> String {
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() <= MAX_EXTENSION_BYTES => {
            (stem, Some(ext))
        }
        _ => (name, None),
    };
    if stem.len() <= MAX_STEM_BYTES {
        return name.to_string();
    }

    let mut end = MAX_STEM_BYTES;
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    let stem = stem[..end].trim_end();
    match ext {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem.to_string(),
    }
}

fn numbered_name(base: &str, n: u32) -> Result<NonEmptyText, FilesError> {
    let numbered = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, n, ext),
        _ => format!("{} ({})", base, n),
    };
    NonEmptyText::new(numbered).map_err(|e| FilesError::InvalidFileName(e.to_string()))
}
