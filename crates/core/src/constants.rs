//! Constants used throughout the receta core crate.
//!
//! Dosing constants are fixed by the dispensing rules, the rest are defaults used when
//! configuration leaves a value empty.

/// Days counted for one month of treatment. Not calendar-aware.
pub const DAYS_PER_MONTH: u64 = 30;

/// Bottle size preselected for a fresh draft, in millilitres.
pub const DEFAULT_PRESENTATION_ML: u32 = 120;

/// Prefix of every exported artifact's file name.
pub const ARTIFACT_FILE_PREFIX: &str = "Receta";

/// Stand-in for the patient name in artifact file names when no name was entered.
pub const ARTIFACT_FALLBACK_NAME: &str = "paciente";

/// Default directory for exported artifacts when no explicit directory is configured.
pub const DEFAULT_EXPORT_DIR: &str = "exports";

/// Font size of the document title, in half-points (14pt).
pub const TITLE_SIZE_HALF_POINTS: u16 = 28;

/// Column of the spreadsheet export holding the product name (C).
pub const SHEET_NAME_COLUMN: usize = 2;

/// Columns of the spreadsheet export concatenated into the product code (D, E, F).
pub const SHEET_CODE_COLUMNS: [usize; 3] = [3, 4, 5];
