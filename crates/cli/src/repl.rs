//! Line-oriented interactive controller over a [`PrescriptionSession`].

use anyhow::{anyhow, bail, Context};
use receta_core::document::entry_text;
use receta_core::{
    ArtifactSink, CoreConfig, DraftField, ExportFormat, PatientField, PrescriptionError,
    PrescriptionLine, PrescriptionSession,
};
use std::io::{BufRead, Write};

const HELP: &str = "\
commands:
  patient <field> <value>   code, consultation, name, age, sex, weight, height, disease, diagnosis
  select <code or name>     pick a product from the catalog
  product <text>            type a product name without the catalog
  set <field> <value>       presentation, dose, times, duration, unit, notes
  add                       add the draft as a new line
  remove <n>                remove line n as shown by `list`
  list                      show the prescription lines
  catalog                   show the loaded catalog
  draft                     show the draft of the next line
  export [pdf|md|txt]       write the prescription document
  help                      show this help
  quit                      leave";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Empty,
    Patient(PatientField, String),
    Select(String),
    Product(String),
    Set(DraftField, String),
    Add,
    /// One-based, as listed.
    Remove(usize),
    List,
    Catalog,
    Draft,
    Export(Option<ExportFormat>),
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> anyhow::Result<Self> {
        let (word, rest) = split_word(line);

        let command = match word.to_lowercase().as_str() {
            "" => Command::Empty,
            "patient" => {
                let (field, value) = split_word(rest);
                Command::Patient(field.parse()?, value.to_string())
            }
            "select" => Command::Select(required(rest, "select <code or name>")?),
            "product" => Command::Product(required(rest, "product <text>")?),
            "set" => {
                let (field, value) = split_word(rest);
                Command::Set(field.parse()?, value.to_string())
            }
            "add" => Command::Add,
            "remove" | "rm" => {
                let n = rest
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| anyhow!("usage: remove <n>, with n from `list`"))?;
                Command::Remove(n)
            }
            "list" | "ls" => Command::List,
            "catalog" => Command::Catalog,
            "draft" => Command::Draft,
            "export" => {
                let format = if rest.is_empty() {
                    None
                } else {
                    Some(rest.parse()?)
                };
                Command::Export(format)
            }
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command `{}`, type `help`", other),
        };

        Ok(command)
    }
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

fn required(rest: &str, usage: &str) -> anyhow::Result<String> {
    if rest.is_empty() {
        bail!("usage: {}", usage);
    }
    Ok(rest.to_string())
}

/// Opens a session from `config`, starting the catalog load, and runs it to the end of
/// `input`.
pub fn run(config: &CoreConfig, input: impl BufRead, output: impl Write) -> anyhow::Result<()> {
    let labels = config.labels().context("failed to load language table")?;
    let sink = config.exports_service()?;

    let session = match config.catalog() {
        // The loader thread is detached; the session never waits for it.
        Some(location) => PrescriptionSession::open(labels, location.source()).0,
        None => {
            tracing::info!("no catalog configured");
            PrescriptionSession::new(labels)
        }
    };

    Repl::new(session, &sink, config.default_format()).run(input, output)
}

pub struct Repl<'a> {
    session: PrescriptionSession,
    sink: &'a dyn ArtifactSink,
    default_format: ExportFormat,
}

impl<'a> Repl<'a> {
    pub fn new(
        session: PrescriptionSession,
        sink: &'a dyn ArtifactSink,
        default_format: ExportFormat,
    ) -> Self {
        Self {
            session,
            sink,
            default_format,
        }
    }

    /// Reads commands until `quit` or end of input. Command errors are printed and the
    /// loop continues; only I/O errors on `input` or `out` end it early.
    pub fn run(&mut self, mut input: impl BufRead, mut out: impl Write) -> anyhow::Result<()> {
        writeln!(out, "receta: type `help` for commands")?;

        loop {
            write!(out, "> ")?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                break;
            }

            let result = Command::parse(&line).and_then(|command| match command {
                Command::Quit => Ok(false),
                command => self.execute(command, &mut out).map(|()| true),
            });
            match result {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => match e.downcast_ref::<PrescriptionError>() {
                    Some(p) if p.is_export_failure() => {
                        writeln!(out, "export failed, prescription kept, try again: {}", p)?
                    }
                    _ => writeln!(out, "error: {:#}", e)?,
                },
            }
        }

        Ok(())
    }

    pub fn execute(&mut self, command: Command, out: &mut impl Write) -> anyhow::Result<()> {
        match command {
            Command::Empty | Command::Quit => {}
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Patient(field, value) => self.session.set_patient_field(field, &value)?,
            Command::Set(field, value) => self.session.set_draft_field(field, &value)?,
            Command::Select(query) => {
                let selected = self.session.select_product(&query).map(|l| l.to_string());
                match selected {
                    Some(label) => writeln!(out, "product: {}", label)?,
                    None if self.session.catalog().is_empty() => writeln!(
                        out,
                        "catalog is empty or still loading; use `product <text>` to type a name"
                    )?,
                    None => writeln!(out, "no catalog entry matches {:?}", query)?,
                }
            }
            Command::Product(text) => {
                let label = self.session.enter_product(&text)?;
                writeln!(out, "product: {}", label)?;
            }
            Command::Add => {
                if self.session.add_line().is_some() {
                    let lines = self.session.lines();
                    if let Some(line) = lines.iter().last() {
                        let entry = entry_text(lines.len(), line, self.session.labels());
                        writeln!(out, "added {}", entry)?;
                    }
                } else {
                    let reason = PrescriptionLine::from_draft(self.session.draft())
                        .err()
                        .map(|r| r.to_string())
                        .unwrap_or_default();
                    writeln!(out, "draft incomplete, nothing added: {}", reason)?;
                }
            }
            Command::Remove(n) => {
                let removed = self.session.remove_line(n - 1).map_err(|e| match e {
                    PrescriptionError::IndexOutOfRange { len, .. } => {
                        anyhow!("there is no line {} ({} listed)", n, len)
                    }
                    other => other.into(),
                })?;
                writeln!(out, "removed {}. {}", n, removed.product())?;
            }
            Command::List => self.list(out)?,
            Command::Catalog => self.catalog(out)?,
            Command::Draft => self.draft(out)?,
            Command::Export(format) => {
                let format = format.unwrap_or(self.default_format);
                let saved = self.session.export_to(format, self.sink)?;
                writeln!(
                    out,
                    "saved {} ({} bytes)",
                    saved.path.display(),
                    saved.size_bytes
                )?;
            }
        }

        Ok(())
    }

    fn list(&self, out: &mut impl Write) -> anyhow::Result<()> {
        if self.session.lines().is_empty() {
            writeln!(out, "no lines yet")?;
        }
        for (i, line) in self.session.lines().iter().enumerate() {
            writeln!(out, "{}", entry_text(i + 1, line, self.session.labels()))?;
        }
        Ok(())
    }

    fn catalog(&self, out: &mut impl Write) -> anyhow::Result<()> {
        let catalog = self.session.catalog();
        if catalog.is_empty() {
            writeln!(out, "catalog is empty or still loading")?;
        }
        for entry in catalog.iter() {
            writeln!(out, "{}", entry.label())?;
        }
        Ok(())
    }

    fn draft(&self, out: &mut impl Write) -> anyhow::Result<()> {
        let draft = self.session.draft();
        let labels = self.session.labels();
        let product = draft.product.as_ref().map(|p| p.as_str()).unwrap_or("-");

        writeln!(out, "{}: {}", labels.product, product)?;
        writeln!(out, "{}: {}", labels.presentation, draft.presentation)?;
        writeln!(out, "{}: {}", labels.dose, draft.dose)?;
        writeln!(out, "{}: {}", labels.times_per_day, draft.times_per_day)?;
        writeln!(
            out,
            "{}: {} {}",
            labels.duration,
            draft.duration,
            labels.duration_unit_label(draft.duration_unit)
        )?;
        writeln!(out, "{}: {}", labels.observations, draft.notes)?;

        match PrescriptionLine::from_draft(draft) {
            Ok(line) => writeln!(out, "ready: {} {}", line.bottles_required(), labels.bottles)?,
            Err(reason) => writeln!(out, "incomplete: {}", reason)?,
        }
        Ok(())
    }
}
