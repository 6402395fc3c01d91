//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the session and the
//! export sink. The core never reads environment variables itself: the binary reads them
//! and hands the raw values to the `*_from_env_value` helpers below.

use crate::catalog::{CatalogFormat, CatalogSource};
use crate::constants::DEFAULT_EXPORT_DIR;
use crate::error::{PrescriptionError, PrescriptionResult};
use crate::language::{Language, LanguageTable};
use crate::render::ExportFormat;
use receta_files::ExportsService;
use std::path::{Path, PathBuf};

/// Where the catalog comes from and how to read it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogLocation {
    pub path: PathBuf,
    pub format: CatalogFormat,
}

impl CatalogLocation {
    /// Uses `format` when given, otherwise guesses from the file extension.
    pub fn new(path: PathBuf, format: Option<CatalogFormat>) -> Self {
        let format = format.unwrap_or_else(|| CatalogFormat::from_path(&path));
        Self { path, format }
    }

    pub fn source(&self) -> Box<dyn CatalogSource> {
        self.format.source(&self.path)
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    export_dir: PathBuf,
    language: Language,
    labels_path: Option<PathBuf>,
    default_format: ExportFormat,
    catalog: Option<CatalogLocation>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// A custom labels file must exist. The catalog path is not checked here: a missing
    /// catalog only degrades product selection and is reported when the load runs.
    pub fn new(
        export_dir: PathBuf,
        language: Language,
        labels_path: Option<PathBuf>,
        default_format: ExportFormat,
        catalog: Option<CatalogLocation>,
    ) -> PrescriptionResult<Self> {
        if export_dir.as_os_str().is_empty() {
            return Err(PrescriptionError::InvalidInput(
                "export directory cannot be empty".into(),
            ));
        }

        if let Some(path) = &labels_path {
            if !path.is_file() {
                return Err(PrescriptionError::InvalidInput(format!(
                    "labels file not found: {}",
                    path.display()
                )));
            }
        }

        Ok(Self {
            export_dir,
            language,
            labels_path,
            default_format,
            catalog,
        })
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn labels_path(&self) -> Option<&Path> {
        self.labels_path.as_deref()
    }

    pub fn default_format(&self) -> ExportFormat {
        self.default_format
    }

    pub fn catalog(&self) -> Option<&CatalogLocation> {
        self.catalog.as_ref()
    }

    /// The language table to render with: the custom file when configured, otherwise the
    /// built-in table for the configured language.
    pub fn labels(&self) -> PrescriptionResult<LanguageTable> {
        match &self.labels_path {
            Some(path) => LanguageTable::load(path),
            None => Ok(self.language.table()),
        }
    }

    /// Opens the exports directory, creating it if needed.
    pub fn exports_service(&self) -> PrescriptionResult<ExportsService> {
        Ok(ExportsService::new(&self.export_dir)?)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            language: Language::default(),
            labels_path: None,
            default_format: ExportFormat::default(),
            catalog: None,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Export directory from an optional string value, defaulting to `exports`.
pub fn export_dir_from_env_value(value: Option<String>) -> PathBuf {
    non_blank(value)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_DIR))
}

/// Parse the language from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns Spanish.
pub fn language_from_env_value(value: Option<String>) -> PrescriptionResult<Language> {
    let parsed = non_blank(value).map(|v| v.parse::<Language>()).transpose()?;
    Ok(parsed.unwrap_or_default())
}

/// Parse the export format from an optional string value, defaulting to PDF.
pub fn export_format_from_env_value(value: Option<String>) -> PrescriptionResult<ExportFormat> {
    let parsed = non_blank(value)
        .map(|v| v.parse::<ExportFormat>())
        .transpose()?;
    Ok(parsed.unwrap_or_default())
}

/// Parse an optional catalog format; `None` means "guess from the file extension".
pub fn catalog_format_from_env_value(
    value: Option<String>,
) -> PrescriptionResult<Option<CatalogFormat>> {
    non_blank(value).map(|v| v.parse::<CatalogFormat>()).transpose()
}

/// Optional path; blank values mean unset.
pub fn path_from_env_value(value: Option<String>) -> Option<PathBuf> {
    non_blank(value).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_blank_env_values_fall_back_to_defaults() {
        for value in [None, Some(String::new()), Some("   ".to_string())] {
            assert_eq!(export_dir_from_env_value(value.clone()), PathBuf::from("exports"));
            assert_eq!(language_from_env_value(value.clone()).unwrap(), Language::Es);
            assert_eq!(export_format_from_env_value(value.clone()).unwrap(), ExportFormat::Pdf);
            assert_eq!(catalog_format_from_env_value(value.clone()).unwrap(), None);
            assert_eq!(path_from_env_value(value), None);
        }
    }

    #[test]
    fn test_env_values_are_parsed() {
        assert_eq!(
            export_dir_from_env_value(Some(" /tmp/recetas ".into())),
            PathBuf::from("/tmp/recetas")
        );
        assert_eq!(language_from_env_value(Some("EN".into())).unwrap(), Language::En);
        assert_eq!(
            export_format_from_env_value(Some("md".into())).unwrap(),
            ExportFormat::Markdown
        );
        assert_eq!(
            catalog_format_from_env_value(Some("yaml".into())).unwrap(),
            Some(CatalogFormat::Yaml)
        );
    }

    #[test]
    fn test_invalid_env_values_are_errors() {
        assert!(matches!(
            language_from_env_value(Some("fr".into())),
            Err(PrescriptionError::UnknownLanguage(_))
        ));
        assert!(matches!(
            export_format_from_env_value(Some("docx".into())),
            Err(PrescriptionError::UnknownExportFormat(_))
        ));
        assert!(matches!(
            catalog_format_from_env_value(Some("csv".into())),
            Err(PrescriptionError::UnknownCatalogFormat(_))
        ));
    }

    #[test]
    fn test_new_rejects_missing_labels_file() {
        let temp = TempDir::new().unwrap();
        let result = CoreConfig::new(
            temp.path().to_path_buf(),
            Language::Es,
            Some(temp.path().join("missing.yaml")),
            ExportFormat::Pdf,
            None,
        );
        assert!(matches!(result, Err(PrescriptionError::InvalidInput(_))));

        let result = CoreConfig::new(PathBuf::new(), Language::Es, None, ExportFormat::Pdf, None);
        assert!(matches!(result, Err(PrescriptionError::InvalidInput(_))));
    }

    #[test]
    fn test_labels_prefer_custom_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("labels.yaml");
        let mut table = LanguageTable::english();
        table.title = "PRESCRIPTION".into();
        std::fs::write(&path, table.to_yaml().unwrap()).unwrap();

        let config = CoreConfig::new(
            temp.path().join("out"),
            Language::Es,
            Some(path),
            ExportFormat::Text,
            None,
        )
        .unwrap();
        assert_eq!(config.labels().unwrap().title, "PRESCRIPTION");

        let builtin = CoreConfig::default();
        assert_eq!(builtin.labels().unwrap(), LanguageTable::spanish());
    }

    #[test]
    fn test_catalog_location_guesses_format() {
        let yaml = CatalogLocation::new(PathBuf::from("catalogo.yml"), None);
        assert_eq!(yaml.format, CatalogFormat::Yaml);

        let sheet = CatalogLocation::new(PathBuf::from("catalogo.txt"), None);
        assert_eq!(sheet.format, CatalogFormat::Sheet);

        let forced = CatalogLocation::new(PathBuf::from("catalogo.txt"), Some(CatalogFormat::Yaml));
        assert_eq!(forced.format, CatalogFormat::Yaml);
    }

    #[test]
    fn test_exports_service_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("exports");
        let config = CoreConfig::new(dir.clone(), Language::En, None, ExportFormat::Markdown, None).unwrap();

        let service = config.exports_service().unwrap();
        assert!(dir.is_dir());
        assert_eq!(service.export_dir(), dir.canonicalize().unwrap().as_path());
    }
}
