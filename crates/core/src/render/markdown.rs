//! Markdown rendering of the prescription document.
//!
//! Output shape:
//!
//! ```markdown
//! # RECETA MÉDICA
//!
//! Código paciente: P-001\
//! Consulta: 12\
//! ...
//! Diagnóstico: Resfriado común
//!
//! **Prescripción:**
//!
//! 1. T1 - Tonico (120 ml) → 5 ml, 3 veces/día por 10 días → 2 frascos
//! 2. ...
//! ```
//!
//! Patient fields are one paragraph joined by hard line breaks; entries form an ordered
//! list. Text that came from the user is escaped so it cannot open emphasis, code spans
//! or headings.

use crate::document::{Block, BlockRole, Document, Paragraph};

pub fn render_markdown(document: &Document) -> String {
    let mut groups: Vec<(BlockRole, Vec<String>)> = Vec::new();

    for block in &document.blocks {
        let Block::Paragraph { role, paragraph } = block else {
            continue;
        };
        let rendered = render_paragraph(*role, paragraph);

        match groups.last_mut() {
            Some((last_role, lines))
                if *last_role == *role
                    && matches!(role, BlockRole::PatientField | BlockRole::Entry) =>
            {
                lines.push(rendered)
            }
            _ => groups.push((*role, vec![rendered])),
        }
    }

    let sections: Vec<String> = groups
        .into_iter()
        .map(|(role, lines)| match role {
            BlockRole::PatientField => lines.join("\\\n"),
            _ => lines.join("\n"),
        })
        .collect();

    format!("{}\n", sections.join("\n\n"))
}

fn render_paragraph(role: BlockRole, paragraph: &Paragraph) -> String {
    match role {
        BlockRole::Title => format!("# {}", escape_text(&paragraph.text())),
        BlockRole::Entry => {
            // Keep the list marker ("1. ") unescaped so the entries form a list.
            let text = paragraph.text();
            match text.split_once(". ") {
                Some((number, rest)) if number.chars().all(|c| c.is_ascii_digit()) => {
                    format!("{}. {}", number, escape_text(rest))
                }
                _ => escape_text(&text),
            }
        }
        BlockRole::PatientField | BlockRole::Heading => paragraph
            .runs
            .iter()
            .map(|run| {
                let text = escape_text(&run.text);
                if run.bold && !text.is_empty() {
                    format!("**{}**", text)
                } else {
                    text
                }
            })
            .collect(),
    }
}

/// Escapes markdown syntax in text so it renders literally.
///
/// - `\`, `*`, `_`, `` ` ``, `[`, `]`, `<` and `>` are backslash-escaped anywhere
/// - a leading `#`, `+` or `-` is escaped so the line stays a paragraph
/// - line breaks become spaces, since every block renders on one line
fn escape_text(text: &str) -> String {
    let single_line = text.replace(['\r', '\n'], " ");
    let mut escaped = String::with_capacity(single_line.len());

    for (i, c) in single_line.chars().enumerate() {
        let needs_escape = match c {
            '\\' | '*' | '_' | '`' | '[' | ']' | '<' | '>' => true,
            '#' | '+' | '-' => i == 0,
            _ => false,
        };
        if needs_escape {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}
