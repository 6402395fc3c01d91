//! Prescription document content tree.
//!
//! [`compose`] turns a patient, the confirmed lines and a language table into an ordered
//! list of blocks. Renderers in [`crate::render`] serialise the tree; nothing in here
//! knows about file formats. Composition is pure: equal inputs give equal trees.
//!
//! Layout, in order:
//!
//! ```text
//!                 RECETA MÉDICA            (centered, bold, 14pt)
//!
//! Código paciente: P-001
//! Consulta: 12
//! Nombre: Ana
//! Edad: 34 | Sexo: Femenino
//! Peso: 60.5 kg | Altura: 165 cm
//! Enfermedad: ...
//! Diagnóstico: ...
//!
//! Prescripción:                            (bold)
//! 1. T1 - Tonico (120 ml) → 5 ml, 3 veces/día por 10 días → 2 frascos | Obs: ...
//! ```

use crate::constants::{ARTIFACT_FALLBACK_NAME, ARTIFACT_FILE_PREFIX, TITLE_SIZE_HALF_POINTS};
use crate::language::LanguageTable;
use crate::patient::{display_optional, PatientRecord};
use crate::prescription::PrescriptionLine;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    /// Font size in half-points; `None` uses the renderer's body size.
    pub size_half_points: Option<u16>,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            size_half_points: None,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            bold: true,
            ..Self::plain(text)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    pub alignment: Alignment,
    pub runs: Vec<TextRun>,
}

impl Paragraph {
    pub fn new(runs: Vec<TextRun>) -> Self {
        Self {
            alignment: Alignment::Left,
            runs,
        }
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// What a block in the document is for.
///
/// Renderers use the role for structure (e.g. markdown turns entries into list items);
/// the visible text is always in the paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockRole {
    Title,
    PatientField,
    Heading,
    Entry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Paragraph { role: BlockRole, paragraph: Paragraph },
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Plain-text title, used for document metadata.
    pub title: String,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn paragraphs(&self) -> impl Iterator<Item = (BlockRole, &Paragraph)> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph { role, paragraph } => Some((*role, paragraph)),
            Block::Blank => None,
        })
    }

    /// Text of each block, one per line, blanks included.
    pub fn lines(&self) -> Vec<String> {
        self.blocks
            .iter()
            .map(|b| match b {
                Block::Paragraph { paragraph, .. } => paragraph.text(),
                Block::Blank => String::new(),
            })
            .collect()
    }
}

/// Builds the document for `patient` and `lines` using the labels in `labels`.
pub fn compose(patient: &PatientRecord, lines: &[PrescriptionLine], labels: &LanguageTable) -> Document {
    let mut blocks = Vec::with_capacity(lines.len() + 12);

    blocks.push(Block::Paragraph {
        role: BlockRole::Title,
        paragraph: Paragraph {
            alignment: Alignment::Center,
            runs: vec![TextRun {
                size_half_points: Some(TITLE_SIZE_HALF_POINTS),
                ..TextRun::bold(labels.recipe.as_str())
            }],
        },
    });
    blocks.push(Block::Blank);

    let sex = patient
        .sex
        .map(|s| labels.sex_label(s).to_string())
        .unwrap_or_default();

    let patient_lines = [
        format!("{}: {}", labels.patient_code, patient.code),
        format!("{}: {}", labels.consultation, patient.consultation_number),
        format!("{}: {}", labels.name, patient.name),
        format!(
            "{}: {} | {}: {}",
            labels.age,
            display_optional(patient.age),
            labels.sex,
            sex
        ),
        format!(
            "{}: {} kg | {}: {} cm",
            labels.weight,
            display_optional(patient.weight),
            labels.height,
            display_optional(patient.height)
        ),
        format!("{}: {}", labels.disease, patient.disease),
        format!("{}: {}", labels.diagnosis, patient.diagnosis),
    ];
    blocks.extend(patient_lines.into_iter().map(|text| Block::Paragraph {
        role: BlockRole::PatientField,
        paragraph: Paragraph::new(vec![TextRun::plain(text)]),
    }));
    blocks.push(Block::Blank);

    blocks.push(Block::Paragraph {
        role: BlockRole::Heading,
        paragraph: Paragraph::new(vec![TextRun::bold(format!("{}:", labels.prescription))]),
    });

    blocks.extend(lines.iter().enumerate().map(|(i, line)| Block::Paragraph {
        role: BlockRole::Entry,
        paragraph: Paragraph::new(vec![TextRun::plain(entry_text(i + 1, line, labels))]),
    }));

    Document {
        title: labels.recipe.clone(),
        blocks,
    }
}

/// One numbered prescription entry.
pub fn entry_text(number: usize, line: &PrescriptionLine, labels: &LanguageTable) -> String {
    let mut text = format!(
        "{}. {} ({} ml) → {} ml, {} {} {} {} {} → {} {}",
        number,
        line.product(),
        line.presentation().ml(),
        line.dose_ml(),
        line.times_per_day(),
        labels.times_per_day_unit,
        labels.per,
        line.duration().magnitude(),
        labels.duration_unit_label(line.duration().unit()),
        line.bottles_required(),
        labels.bottles,
    );

    if let Some(notes) = line.notes() {
        text.push_str(&format!(" | {}: {}", labels.observations_short, notes));
    }

    text
}

/// `Receta_{name}.{extension}`, with `paciente` standing in for a blank name.
pub fn artifact_file_name(patient: &PatientRecord, extension: &str) -> String {
    let name = patient.name.trim();
    let name = if name.is_empty() {
        ARTIFACT_FALLBACK_NAME
    } else {
        name
    };
    format!("{}_{}.{}", ARTIFACT_FILE_PREFIX, name, extension)
}
