mod output;
mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use monnaie_analytics::{compute_stats, rank, VaultFilter};
use monnaie_core::EnrichedTable;
use monnaie_import::{Catalog, Standardizer};
use monnaie_storage::DatasetStore;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use settings::Settings;

#[derive(Parser)]
#[command(name = "monnaie")]
#[command(about = "Standardize community-currency ledger exports and rank professional accounts")]
#[command(version)]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true, env = "MONNAIE_CONFIG")]
    config: Option<PathBuf>,

    /// Dataset directory, overriding the settings file
    #[arg(long, global = true, env = "MONNAIE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Pattern directory, overriding the built-in catalog
    #[arg(long, global = true, env = "MONNAIE_PATTERNS_DIR")]
    patterns_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect an export's platform, classify its accounts and save it as a dataset
    Standardize {
        /// Spreadsheet (xlsx, xlsm, xlsb, xls, ods) or CSV export
        file: PathBuf,
    },
    /// List saved datasets
    Datasets,
    /// Print a saved dataset
    Show {
        dataset: String,

        /// Hide transactions sent from a vault account
        #[arg(long)]
        ignore_vault_sender: bool,

        /// Hide transactions received by a vault account
        #[arg(long)]
        ignore_vault_recipient: bool,

        /// Print the JSON grid instead of columns
        #[arg(long)]
        json: bool,
    },
    /// Rank professional accounts by total received
    Ranking {
        dataset: String,

        #[arg(long)]
        json: bool,
    },
    /// Activity statistics for a saved dataset
    Stats {
        dataset: String,

        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if cli.data_dir.is_some() {
        settings.data_dir = cli.data_dir;
    }
    if cli.patterns_dir.is_some() {
        settings.patterns_dir = cli.patterns_dir;
    }

    let store = DatasetStore::new(settings.data_dir()?);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Standardize { file } => {
            let standardizer = Standardizer::new(load_catalog(settings.patterns_dir.as_deref())?);
            let standardized = standardizer
                .standardize_file(&file)
                .with_context(|| format!("Failed to standardize {}", file.display()))?;
            let name = store
                .save(&file, &standardized.table)
                .with_context(|| format!("Failed to save dataset in {}", store.root().display()))?;
            writeln!(out, "{name}\t{}", standardized.format)?;
        }
        Commands::Datasets => {
            for name in store.list().context("Failed to list datasets")? {
                writeln!(out, "{name}")?;
            }
        }
        Commands::Show {
            dataset,
            ignore_vault_sender,
            ignore_vault_recipient,
            json,
        } => {
            let table = load_dataset(&store, &dataset)?;
            let table = VaultFilter::new(ignore_vault_sender, ignore_vault_recipient).apply(&table);
            if json {
                serde_json::to_writer_pretty(&mut out, &table)?;
                writeln!(out)?;
            } else {
                output::write_table(&mut out, &table)?;
            }
        }
        Commands::Ranking { dataset, json } => {
            let ranking = rank(&load_dataset(&store, &dataset)?);
            if json {
                serde_json::to_writer_pretty(&mut out, &ranking)?;
                writeln!(out)?;
            } else {
                output::write_ranking(&mut out, &ranking)?;
            }
        }
        Commands::Stats { dataset, json } => {
            let stats = compute_stats(&load_dataset(&store, &dataset)?);
            if json {
                serde_json::to_writer_pretty(&mut out, &stats)?;
                writeln!(out)?;
            } else {
                output::write_stats(&mut out, &stats)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}

fn load_catalog(patterns_dir: Option<&Path>) -> Result<Catalog> {
    match patterns_dir {
        Some(dir) => Catalog::load_dir(dir)
            .with_context(|| format!("Failed to load patterns from {}", dir.display())),
        None => Catalog::builtin().context("Built-in patterns are invalid"),
    }
}

fn load_dataset(store: &DatasetStore, name: &str) -> Result<EnrichedTable> {
    store
        .load(name)
        .with_context(|| format!("Failed to load dataset '{name}'"))
}
