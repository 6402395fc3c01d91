//! Plain-text rendering: one line per block, centered title, no styling.

use crate::document::{Alignment, Block, Document};

/// Line width used to center the title.
const TEXT_WIDTH: usize = 72;

pub fn render_text(document: &Document) -> String {
    let mut output = String::new();

    for block in &document.blocks {
        if let Block::Paragraph { paragraph, .. } = block {
            let text = paragraph.text();
            match paragraph.alignment {
                Alignment::Center => {
                    let centered = format!("{:^width$}", text, width = TEXT_WIDTH);
                    output.push_str(centered.trim_end());
                }
                Alignment::Left => output.push_str(&text),
            }
        }
        output.push('\n');
    }

    output
}
