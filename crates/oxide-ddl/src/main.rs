//! oxide-ddl CLI
//!
//! Command-line tool turning catalog diffs into MySQL scripts.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_ddl::prelude::*;

/// MySQL schema diff to DDL generator.
#[derive(Parser)]
#[command(name = "oxide-ddl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with `generator` and `composer` option sections.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Server version the script must run on.
    #[arg(
        short,
        long,
        global = true,
        env = "OXIDE_DDL_TARGET_VERSION",
        default_value = "8.0.5"
    )]
    target_version: ServerVersion,

    /// Leave identifiers unqualified by their schema.
    #[arg(long, global = true)]
    omit_schemas: bool,

    /// Write the result to a file instead of stdout.
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the statements of a change keyed by object, as JSON.
    Sql {
        /// Change tree.
        #[arg(long)]
        change: PathBuf,

        /// Catalog before the change.
        #[arg(long)]
        source: Option<PathBuf>,

        /// Catalog after the change.
        #[arg(long)]
        target: Option<PathBuf>,
    },

    /// Forward engineer a complete creation script for a catalog.
    Export {
        /// Catalog to export.
        #[arg(long)]
        catalog: PathBuf,

        /// Change tree selecting what to create (the whole catalog if omitted).
        #[arg(long)]
        change: Option<PathBuf>,

        /// Change tree selecting what to drop first.
        #[arg(long)]
        drop_change: Option<PathBuf>,
    },

    /// Print a synchronization script taking the source to the target.
    Sync {
        #[arg(long)]
        source: PathBuf,

        #[arg(long)]
        target: PathBuf,

        #[arg(long)]
        change: PathBuf,
    },

    /// Describe a change in plain text.
    Report {
        #[arg(long)]
        source: PathBuf,

        #[arg(long)]
        target: PathBuf,

        #[arg(long)]
        change: PathBuf,
    },
}

/// Options file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    generator: GeneratorOptions,
    composer: ComposerOptions,
    /// `ALGORITHM` for table alters.
    alter_algorithm: String,
    /// `LOCK` for table alters.
    alter_lock: String,
}

fn load<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn load_optional<T: DeserializeOwned>(path: Option<&PathBuf>) -> anyhow::Result<Option<T>> {
    path.map(|p| load(p)).transpose()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config: Config = load_optional(cli.config.as_ref())?.unwrap_or_default();
    if cli.omit_schemas {
        config.generator.omit_schemas = true;
        config.composer.omit_schemas = true;
    }
    let traits = DbTraits::for_server_version(cli.target_version)
        .with_alter_algorithm(config.alter_algorithm.as_str())
        .with_alter_lock(config.alter_lock.as_str());
    debug!(version = %traits.version, "target server");

    let text = match &cli.command {
        Commands::Sql {
            change,
            source,
            target,
        } => {
            let change: Change = load(change)?;
            let source: Option<Catalog> = load_optional(source.as_ref())?;
            let target: Option<Catalog> = load_optional(target.as_ref())?;
            let store = generate_sql(
                source.as_ref(),
                target.as_ref(),
                &change,
                &config.generator,
                &traits,
            )?;
            serde_json::to_string_pretty(&store)?
        }

        Commands::Export {
            catalog,
            change,
            drop_change,
        } => {
            let catalog: Catalog = load(catalog)?;
            let change: Option<Change> = load_optional(change.as_ref())?;
            let drop_change: Option<Change> = load_optional(drop_change.as_ref())?;
            info!(schemata = catalog.schemata.len(), "exporting catalog");
            make_export_script(
                &catalog,
                change.as_ref(),
                drop_change.as_ref(),
                &config.composer,
                &traits,
            )?
        }

        Commands::Sync {
            source,
            target,
            change,
        } => {
            let source: Catalog = load(source)?;
            let target: Catalog = load(target)?;
            let change: Change = load(change)?;
            make_alter_script(&source, &target, &change, &config.composer, &traits)?
        }

        Commands::Report {
            source,
            target,
            change,
        } => {
            let source: Catalog = load(source)?;
            let target: Catalog = load(target)?;
            let change: Change = load(change)?;
            generate_report(Some(&source), Some(&target), &change, &config.generator)?
        }
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "script written");
        }
        None => print!("{text}"),
    }
    Ok(())
}
