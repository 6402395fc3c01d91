//! PDF rendering via `printpdf` built-in fonts.
//!
//! A4 portrait, Helvetica body, Helvetica-Bold for bold runs. Long paragraphs wrap on
//! word boundaries and a new page starts when the bottom margin is reached.

use crate::document::{Alignment, Block, Document, Paragraph};
use crate::error::{PrescriptionError, PrescriptionResult};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use std::io::BufWriter;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const BODY_SIZE_PT: f32 = 11.0;
const LINE_SPACING: f32 = 1.4;
const BLANK_LINE_MM: f32 = 5.0;
const MM_PER_PT: f32 = 0.3528;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;
const LAYER_NAME: &str = "Layer 1";

struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y_mm: f32,
}

impl PageWriter {
    fn new(title: &str) -> PrescriptionResult<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
        let layer = doc.get_page(page).get_layer(layer);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| PrescriptionError::Render(format!("PDF font error: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| PrescriptionError::Render(format!("PDF font error: {e}")))?;

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y_mm: PAGE_HEIGHT_MM - MARGIN_MM,
        })
    }

    fn ensure_room(&mut self, height_mm: f32) {
        if self.y_mm - height_mm >= MARGIN_MM {
            return;
        }
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y_mm = PAGE_HEIGHT_MM - MARGIN_MM;
    }

    fn paragraph(&mut self, paragraph: &Paragraph) {
        let size_pt = paragraph
            .runs
            .iter()
            .filter_map(|r| r.size_half_points)
            .max()
            .map(|half| f32::from(half) / 2.0)
            .unwrap_or(BODY_SIZE_PT);
        let bold = !paragraph.runs.is_empty() && paragraph.runs.iter().all(|r| r.bold);
        let line_height = size_pt * MM_PER_PT * LINE_SPACING;
        let glyph_mm = size_pt * MM_PER_PT * AVG_GLYPH_WIDTH;
        let max_chars = ((PAGE_WIDTH_MM - 2.0 * MARGIN_MM) / glyph_mm) as usize;

        for line in wrap_text(&pdf_safe_text(&paragraph.text()), max_chars.max(1)) {
            self.ensure_room(line_height);
            self.y_mm -= line_height;

            let x_mm = match paragraph.alignment {
                Alignment::Left => MARGIN_MM,
                Alignment::Center => {
                    let width = line.chars().count() as f32 * glyph_mm;
                    ((PAGE_WIDTH_MM - width) / 2.0).max(MARGIN_MM)
                }
            };
            let font = if bold { &self.bold } else { &self.regular };
            self.layer
                .use_text(line, size_pt, Mm(x_mm), Mm(self.y_mm), font);
        }
    }

    fn blank(&mut self) {
        self.y_mm -= BLANK_LINE_MM;
    }

    fn finish(self) -> PrescriptionResult<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| PrescriptionError::Render(format!("PDF save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| PrescriptionError::Render(format!("PDF buffer error: {e}")))
    }
}

pub fn render_pdf(document: &Document) -> PrescriptionResult<Vec<u8>> {
    let mut writer = PageWriter::new(&pdf_safe_text(&document.title))?;

    for block in &document.blocks {
        match block {
            Block::Paragraph { paragraph, .. } => writer.paragraph(paragraph),
            Block::Blank => writer.blank(),
        }
    }

    writer.finish()
}

/// Maps text onto what the built-in (WinAnsi) fonts can draw.
///
/// Latin-1 letters pass through; arrows become `->`; anything else becomes `?`.
fn pdf_safe_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '→' => out.push_str("->"),
            '\n' | '\r' | '\t' => out.push(' '),
            c if (c as u32) < 0x100 && !c.is_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = current.chars().count() + word.chars().count() + 1;
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
