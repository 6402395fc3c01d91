use anyhow::Context;
use clap::{Parser, Subcommand};
use receta_core::{CatalogHandle, CoreConfig};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod compose;
mod repl;
mod settings;

use settings::SettingsArgs;

#[derive(Parser)]
#[command(name = "receta")]
#[command(about = "Draft clinical prescriptions and export them as documents")]
struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit a prescription interactively
    Session,
    /// Build a prescription from a YAML draft file and export it
    Compose {
        /// Draft file with a patient and a list of lines
        #[arg(long, short)]
        input: PathBuf,
    },
    /// Load the configured catalog and list its products
    Catalog,
}

/// Entry point for the `receta` command.
///
/// Logs go to stderr so interactive output stays clean. `RUST_LOG` overrides the default
/// `receta=info` filter.
///
/// # Environment Variables
/// - `RECETA_EXPORT_DIR`: where exports are written (default: "exports")
/// - `RECETA_LANGUAGE`: `es` or `en` (default: "es")
/// - `RECETA_LABELS`: YAML file with a custom language table
/// - `RECETA_FORMAT`: `pdf`, `md` or `txt` (default: "pdf")
/// - `RECETA_CATALOG`: product catalog file
/// - `RECETA_CATALOG_FORMAT`: `yaml` or `sheet` (default: from the file extension)
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("receta=info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.settings.resolve(|key| std::env::var(key).ok())?;

    match cli.command {
        Some(Commands::Session) => {
            let stdin = std::io::stdin();
            repl::run(&config, stdin.lock(), std::io::stdout().lock())?;
        }
        Some(Commands::Compose { input }) => {
            let mut stdout = std::io::stdout().lock();
            compose::run(&config, &input, config.default_format(), &mut stdout)?;
        }
        Some(Commands::Catalog) => {
            list_catalog(&config, &mut std::io::stdout().lock())?;
        }
        None => {
            println!("Use 'receta --help' for commands");
        }
    }

    Ok(())
}

fn list_catalog(config: &CoreConfig, out: &mut impl Write) -> anyhow::Result<()> {
    let location = config
        .catalog()
        .context("no catalog configured, use --catalog or RECETA_CATALOG")?;

    let handle = CatalogHandle::new();
    let count = handle
        .load_now(location.source().as_ref())
        .with_context(|| format!("failed to load {}", location.path.display()))?;

    for entry in handle.snapshot().iter() {
        writeln!(out, "{}", entry.label())?;
    }
    writeln!(out, "{} products", count)?;

    Ok(())
}
