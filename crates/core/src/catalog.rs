//! Product catalog: the selectable options for a prescription line.
//!
//! The catalog is loaded once per session from a [`CatalogSource`], on a background
//! thread, and published through a [`CatalogHandle`]. A load replaces the whole snapshot
//! or nothing: a failed load is logged and the previous snapshot (normally empty) stays.
//! Line building and export never wait for the catalog.

use crate::constants::{SHEET_CODE_COLUMNS, SHEET_NAME_COLUMN};
use crate::error::{PrescriptionError, PrescriptionResult};
use receta_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

/// Marker wrapping a Google Visualization query response.
const SHEET_RESPONSE_MARKER: &str = "setResponse(";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<NonEmptyText>,
}

impl CatalogEntry {
    pub fn new(name: NonEmptyText, code: Option<NonEmptyText>) -> Self {
        Self { name, code }
    }

    /// Label shown in the selector and copied onto prescription lines: `"{code} - {name}"`,
    /// or just the name for entries without a code.
    pub fn label(&self) -> NonEmptyText {
        match &self.code {
            Some(code) => NonEmptyText::new(format!("{} - {}", code, self.name))
                .unwrap_or_else(|_| self.name.clone()),
            None => self.name.clone(),
        }
    }
}

/// Point-in-time list of catalog entries, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }

    /// Finds the entry a user means by `query`.
    ///
    /// Codes win over names: an entry whose code matches is returned even if an earlier
    /// entry has that text as its name. Failing both, a full label (`"code - name"`)
    /// matches too. Comparison ignores ASCII case and surrounding whitespace.
    pub fn select(&self, query: &str) -> Option<&CatalogEntry> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        let by_code = self.entries.iter().find(|e| {
            e.code
                .as_ref()
                .is_some_and(|c| c.as_str().eq_ignore_ascii_case(query))
        });

        by_code
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.name.as_str().eq_ignore_ascii_case(query))
            })
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.label().as_str().eq_ignore_ascii_case(query))
            })
    }
}

/// Somewhere catalog entries come from.
pub trait CatalogSource: Send {
    /// Human-readable origin, used in log lines.
    fn describe(&self) -> String;

    fn fetch(&self) -> PrescriptionResult<Vec<CatalogEntry>>;
}

/// Fixed list, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog(pub Vec<CatalogEntry>);

impl CatalogSource for StaticCatalog {
    fn describe(&self) -> String {
        format!("static list ({} entries)", self.0.len())
    }

    fn fetch(&self) -> PrescriptionResult<Vec<CatalogEntry>> {
        Ok(self.0.clone())
    }
}

/// YAML sequence of `{name, code}` records.
#[derive(Debug, Clone)]
pub struct YamlCatalogFile {
    path: PathBuf,
}

impl YamlCatalogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogSource for YamlCatalogFile {
    fn describe(&self) -> String {
        format!("YAML catalog {}", self.path.display())
    }

    fn fetch(&self) -> PrescriptionResult<Vec<CatalogEntry>> {
        let yaml = std::fs::read_to_string(&self.path).map_err(PrescriptionError::FileRead)?;
        serde_yaml::from_str(&yaml).map_err(PrescriptionError::YamlDeserialization)
    }
}

/// Saved response of the catalog spreadsheet's visualization query.
#[derive(Debug, Clone)]
pub struct SheetExportFile {
    path: PathBuf,
}

impl SheetExportFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogSource for SheetExportFile {
    fn describe(&self) -> String {
        format!("spreadsheet export {}", self.path.display())
    }

    fn fetch(&self) -> PrescriptionResult<Vec<CatalogEntry>> {
        let text = std::fs::read_to_string(&self.path).map_err(PrescriptionError::FileRead)?;
        parse_sheet_response(&text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Yaml,
    Sheet,
}

impl CatalogFormat {
    /// `.yaml`/`.yml` files are YAML, anything else is treated as a spreadsheet export.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                CatalogFormat::Yaml
            }
            _ => CatalogFormat::Sheet,
        }
    }

    pub fn source(self, path: &Path) -> Box<dyn CatalogSource> {
        match self {
            CatalogFormat::Yaml => Box::new(YamlCatalogFile::new(path)),
            CatalogFormat::Sheet => Box::new(SheetExportFile::new(path)),
        }
    }
}

impl FromStr for CatalogFormat {
    type Err = PrescriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yaml" | "yml" => Ok(CatalogFormat::Yaml),
            "sheet" | "gviz" | "json" => Ok(CatalogFormat::Sheet),
            other => Err(PrescriptionError::UnknownCatalogFormat(other.to_string())),
        }
    }
}

#[derive(Deserialize)]
struct SheetResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    table: Option<SheetTable>,
}

#[derive(Deserialize)]
struct SheetTable {
    #[serde(default)]
    rows: Vec<SheetRow>,
}

#[derive(Deserialize)]
struct SheetRow {
    #[serde(default)]
    c: Vec<Option<SheetCell>>,
}

#[derive(Deserialize)]
struct SheetCell {
    #[serde(default)]
    v: serde_json::Value,
}

/// Parses a visualization query response into catalog entries.
///
/// Accepts the raw JSONP body (`/*O_o*/ google.visualization.Query.setResponse({...});`)
/// or the bare JSON object. Name comes from column C, code from columns D, E and F
/// concatenated. Rows without a name are skipped.
pub fn parse_sheet_response(text: &str) -> PrescriptionResult<Vec<CatalogEntry>> {
    let json = match text.find(SHEET_RESPONSE_MARKER) {
        Some(start) => {
            let body = &text[start + SHEET_RESPONSE_MARKER.len()..];
            let end = body.rfind(')').ok_or_else(|| {
                PrescriptionError::CatalogUnavailable("unterminated query response".into())
            })?;
            &body[..end]
        }
        None => text.trim(),
    };

    let response: SheetResponse =
        serde_json::from_str(json).map_err(PrescriptionError::CatalogJson)?;

    if let Some(status) = response.status.as_deref() {
        if status == "error" {
            return Err(PrescriptionError::CatalogUnavailable(
                "query response reported an error".into(),
            ));
        }
    }

    let rows = response.table.map(|t| t.rows).unwrap_or_default();

    Ok(rows
        .iter()
        .filter_map(|row| {
            let cell = |index: usize| {
                row.c
                    .get(index)
                    .and_then(Option::as_ref)
                    .map(|cell| cell_text(&cell.v))
                    .unwrap_or_default()
            };

            let name = NonEmptyText::optional(cell(SHEET_NAME_COLUMN))?;
            let code: String = SHEET_CODE_COLUMNS.iter().map(|&i| cell(i)).collect();
            Some(CatalogEntry::new(name, NonEmptyText::optional(code)))
        })
        .collect())
}

/// Renders one cell value. Empty-looking values (`null`, `false`, `0`) give no text, so a
/// zero in a code column adds nothing to the code.
fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null | serde_json::Value::Bool(false) => String::new(),
        serde_json::Value::Number(n) if n.as_f64() == Some(0.0) => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Shared, swappable catalog snapshot.
///
/// Readers take an `Arc<Catalog>` and keep a consistent view even if a load completes
/// while they hold it.
#[derive(Debug, Clone, Default)]
pub struct CatalogHandle {
    current: Arc<RwLock<Arc<Catalog>>>,
}

impl CatalogHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, catalog: Catalog) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(catalog);
    }

    /// Fetches from `source` and publishes the result, returning the entry count.
    ///
    /// On error the current snapshot is left untouched.
    pub fn load_now(&self, source: &dyn CatalogSource) -> PrescriptionResult<usize> {
        let entries = source.fetch()?;
        let count = entries.len();
        self.replace(Catalog::new(entries));
        tracing::info!(source = %source.describe(), entries = count, "catalog loaded");
        Ok(count)
    }

    /// Starts a one-shot load on a background thread.
    ///
    /// Failures are logged and swallowed; there is no retry.
    pub fn load_in_background(
        &self,
        source: Box<dyn CatalogSource>,
    ) -> std::thread::JoinHandle<()> {
        let handle = self.clone();
        std::thread::spawn(move || {
            if let Err(e) = handle.load_now(source.as_ref()) {
                tracing::warn!(source = %source.describe(), error = %e, "catalog unavailable");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET_FIXTURE: &str = r#"/*O_o*/
google.visualization.Query.setResponse({"version":"0.6","reqId":"0","status":"ok","sig":"1","table":{"cols":[],"rows":[{"c":[{"v":1.0},null,{"v":"Jarabe de tomillo"},{"v":"JT"},{"v":12.0,"f":"12"},{"v":"A"}]},{"c":[null,null,{"v":"Tonico"},null,null,null]},{"c":[null,null,{"v":""},{"v":"X"},null,null]},{"c":[null,null,{"v":"Gotas"},{"v":"G"},{"v":1.5}]}],"parsedNumHeaders":1}});"#;

    struct FailingSource;

    impl CatalogSource for FailingSource {
        fn describe(&self) -> String {
            "failing".into()
        }

        fn fetch(&self) -> PrescriptionResult<Vec<CatalogEntry>> {
            Err(PrescriptionError::CatalogUnavailable("offline".into()))
        }
    }

    fn entry(name: &str, code: Option<&str>) -> CatalogEntry {
        CatalogEntry::new(
            NonEmptyText::new(name).unwrap(),
            code.and_then(NonEmptyText::optional),
        )
    }

    #[test]
    fn test_parse_sheet_response_reads_name_and_code_columns() {
        let entries = parse_sheet_response(SHEET_FIXTURE).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], entry("Jarabe de tomillo", Some("JT12A")));
        assert_eq!(entries[1], entry("Tonico", None));
        assert_eq!(entries[2], entry("Gotas", Some("G1.5")));
    }

    #[test]
    fn test_parse_sheet_response_accepts_bare_json() {
        let json = r#"{"table":{"rows":[{"c":[null,null,{"v":"Tonico"},{"v":"T"}]}]}}"#;
        let entries = parse_sheet_response(json).unwrap();
        assert_eq!(entries, vec![entry("Tonico", Some("T"))]);
    }

    #[test]
    fn test_zero_and_false_cells_add_nothing_to_code() {
        let json = r#"{"table":{"rows":[
            {"c":[null,null,{"v":"Tonico"},{"v":"T"},{"v":0.0,"f":"0"},{"v":false}]},
            {"c":[null,null,{"v":"Gotas"},{"v":0},{"v":true},{"v":10.0}]},
            {"c":[null,null,{"v":0},{"v":"Z"}]}
        ]}}"#;

        let entries = parse_sheet_response(json).unwrap();

        assert_eq!(
            entries,
            vec![entry("Tonico", Some("T")), entry("Gotas", Some("true10"))]
        );
    }

    #[test]
    fn test_parse_sheet_response_errors() {
        assert!(matches!(
            parse_sheet_response(r#"setResponse({"status":"error"});"#),
            Err(PrescriptionError::CatalogUnavailable(_))
        ));
        assert!(matches!(
            parse_sheet_response("<html>sign in</html>"),
            Err(PrescriptionError::CatalogJson(_))
        ));
    }

    #[test]
    fn test_label_includes_code_when_present() {
        assert_eq!(entry("Tonico", Some("T1")).label().as_str(), "T1 - Tonico");
        assert_eq!(entry("Tonico", None).label().as_str(), "Tonico");
    }

    #[test]
    fn test_select_prefers_code_over_name() {
        let catalog = Catalog::new(vec![
            entry("B12", None),
            entry("Vitamina B", Some("B12")),
        ]);

        let selected = catalog.select("b12").unwrap();
        assert_eq!(selected.name.as_str(), "Vitamina B");
    }

    #[test]
    fn test_select_by_name_and_label() {
        let catalog = Catalog::new(vec![entry("Tonico", Some("T1")), entry("Gotas", None)]);

        assert_eq!(catalog.select(" gotas ").unwrap().name.as_str(), "Gotas");
        assert_eq!(catalog.select("T1 - Tonico").unwrap().name.as_str(), "Tonico");
        assert!(catalog.select("Jarabe").is_none());
        assert!(catalog.select("  ").is_none());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            CatalogFormat::from_path(Path::new("catalog.YML")),
            CatalogFormat::Yaml
        );
        assert_eq!(
            CatalogFormat::from_path(Path::new("catalog.json")),
            CatalogFormat::Sheet
        );
        assert_eq!("gviz".parse::<CatalogFormat>().unwrap(), CatalogFormat::Sheet);
        assert!("csv".parse::<CatalogFormat>().is_err());
    }

    #[test]
    fn test_yaml_catalog_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("catalog.yaml");
        std::fs::write(&path, "- name: Tonico\n  code: T1\n- name: Gotas\n").unwrap();

        let entries = CatalogFormat::from_path(&path).source(&path).fetch().unwrap();
        assert_eq!(entries, vec![entry("Tonico", Some("T1")), entry("Gotas", None)]);
    }

    #[test]
    fn test_sheet_export_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("catalog.txt");
        std::fs::write(&path, SHEET_FIXTURE).unwrap();

        let entries = SheetExportFile::new(&path).fetch().unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_background_load_replaces_snapshot() {
        let handle = CatalogHandle::new();
        let before = handle.snapshot();
        assert!(before.is_empty());

        handle
            .load_in_background(Box::new(StaticCatalog(vec![entry("Tonico", None)])))
            .join()
            .unwrap();

        assert_eq!(handle.snapshot().len(), 1);
        // Snapshots taken earlier are not mutated.
        assert!(before.is_empty());
    }

    #[test]
    fn test_failed_load_keeps_previous_snapshot() {
        let handle = CatalogHandle::new();
        handle.replace(Catalog::new(vec![entry("Gotas", None)]));

        handle
            .load_in_background(Box::new(FailingSource))
            .join()
            .unwrap();

        assert_eq!(handle.snapshot().len(), 1);
        assert!(handle.load_now(&FailingSource).is_err());
        assert_eq!(handle.snapshot().len(), 1);
    }
}
