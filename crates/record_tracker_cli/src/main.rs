//! Command-line front end for the record tracker.
//!
//! # Responsibility
//! - Resolve configuration, open the configured document backend.
//! - Run one load/add/delete/dump command and print the resulting summary.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use record_tracker_core::db::open_db;
use record_tracker_core::{
    core_version, init_from_config, render_summary, AddRecordRequest, DocumentStore,
    HttpDocumentStore, MemoryDocumentStore, RecordService, RecordStore, ServiceError,
    SqliteDocumentStore, StoreBackend, TrackerConfig,
};
use rusqlite::Connection;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "record-tracker")]
#[command(about = "Track Self/Natural day records in a remote JSON document")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "RECORD_TRACKER_CONFIG")]
    config: Option<PathBuf>,

    /// Document backend (overrides config file)
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// Realtime database URL (overrides config file and environment)
    #[arg(long)]
    url: Option<String>,

    /// SQLite database file for the sqlite backend
    #[arg(long)]
    sqlite_path: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Print totals and the per-year/per-month breakdown
    Summary {
        /// Print aggregates as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Add or overwrite one day record
    Add {
        year: String,
        month: String,
        day: String,
        /// `x` for Natural, `1` for Self
        value: String,
    },
    /// Delete one day record
    Delete {
        year: String,
        month: String,
        day: String,
    },
    /// Print the stored record tree as JSON
    Dump,
    /// Print the core version
    Version,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum BackendArg {
    Http,
    Sqlite,
    Memory,
}

impl From<BackendArg> for StoreBackend {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Http => Self::Http,
            BackendArg::Sqlite => Self::Sqlite,
            BackendArg::Memory => Self::Memory,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.command == Command::Version {
        println!("record_tracker_core version={}", core_version());
        return Ok(());
    }

    let config = resolve_config(&cli)?;
    init_from_config(&config.logging)
        .map_err(anyhow::Error::msg)
        .context("failed to initialize logging")?;
    info!(
        "event=cli_start module=cli status=ok backend={:?}",
        config.store.backend
    );

    let sqlite_conn: Connection;
    let backend: Box<dyn DocumentStore + '_> = match config.store.backend {
        StoreBackend::Http => Box::new(HttpDocumentStore::from_config(&config.store)?),
        StoreBackend::Sqlite => {
            sqlite_conn = open_db(&config.store.sqlite_path).with_context(|| {
                format!(
                    "failed to open `{}`",
                    config.store.sqlite_path.display()
                )
            })?;
            Box::new(SqliteDocumentStore::try_new(&sqlite_conn)?)
        }
        StoreBackend::Memory => Box::new(MemoryDocumentStore::new()),
    };

    let service =
        RecordService::new(RecordStore::new(backend)).with_retry(config.store.retry.clone());
    run(&service, cli.command)
}

fn resolve_config(cli: &Cli) -> Result<TrackerConfig> {
    let mut config = TrackerConfig::load_or_default(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.store.backend = backend.into();
    }
    if let Some(url) = &cli.url {
        config.store.url = url.clone();
    }
    if let Some(path) = &cli.sqlite_path {
        config.store.sqlite_path = path.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.logging.dir = Some(dir.clone());
    }
    config.validate()?;
    Ok(config)
}

fn run<D: DocumentStore>(service: &RecordService<D>, command: Command) -> Result<()> {
    let state = service.load().context("Error fetching data")?;

    let outcome = match command {
        Command::Summary { json } => {
            if json {
                println!("{}", serde_json_pretty(&state.aggregates)?);
            } else {
                print!("{}", render_summary(&state));
            }
            return Ok(());
        }
        Command::Dump => {
            println!("{}", serde_json_pretty(&state.tree)?);
            return Ok(());
        }
        Command::Version => return Ok(()),
        Command::Add {
            year,
            month,
            day,
            value,
        } => service
            .add(&state, &AddRecordRequest::new(year, month, day, value))
            .map(|next| (next, "Record added successfully!")),
        Command::Delete { year, month, day } => service
            .delete(&state, &year, &month, &day)
            .map(|next| (next, "Record deleted successfully!")),
    };

    match outcome {
        Ok((next, message)) => {
            println!("{message}");
            print!("{}", render_summary(&next));
            Ok(())
        }
        Err(ServiceError::ReadBackFailed { committed, source }) => {
            eprintln!("Record saved, but reloading failed: {source}");
            print!("{}", render_summary(&committed));
            bail!("reload after write failed")
        }
        Err(ServiceError::Validation(err)) => bail!("Please fill out all fields correctly: {err}"),
        Err(err) => Err(err).context("Error updating records. Please try again."),
    }
}

fn serde_json_pretty<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
