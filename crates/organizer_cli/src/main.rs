//! Organizer command-line entry point.
//!
//! # Responsibility
//! - Wire settings, store, and a snapshot provider into the core service.
//! - Keep output deterministic JSON for scripting.
//!
//! # Invariants
//! - Only `sync` writes, and only from an explicit inventory snapshot.

use clap::{Parser, Subcommand};
use log::info;
use organizer_core::{
    open_db, open_db_in_memory, validate_organizer_integrity, OrganizerRepository,
    OrganizerService, OrganizerSettings, OrganizerValidation, SqliteOrganizerRepository,
    StaticResourceProvider,
};
use rusqlite::Connection;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

const SNAPSHOT_PROVIDER_ID: &str = "snapshot";

/// Organizer store maintenance tool
#[derive(Parser)]
#[command(name = "organizer_cli")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a JSON settings file
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print core linkage and version
    Ping,
    /// Report organizer integrity; exits non-zero when invalid
    Check {
        /// Reconcile against this inventory first instead of checking the stored document
        #[arg(value_name = "SNAPSHOT")]
        snapshot: Option<PathBuf>,
    },
    /// Reconcile the store with an inventory snapshot and print the result
    Sync {
        /// JSON array of tagged containers and VMs
        #[arg(value_name = "SNAPSHOT")]
        snapshot: PathBuf,
    },
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<ExitCode> {
    let settings = match cli.settings.as_deref() {
        Some(path) => OrganizerSettings::load(path)?,
        None => OrganizerSettings::default(),
    };
    settings.init_logging()?;

    match cli.command {
        Command::Ping => {
            println!("organizer_core ping={}", organizer_core::ping());
            println!("organizer_core version={}", organizer_core::core_version());
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { snapshot } => {
            let conn = open_connection(&settings)?;
            let report = check(&conn, &settings, snapshot.as_deref())?;
            println!("is_valid={}", report.is_valid);
            for view_id in report.invalid_view_ids() {
                println!("invalid_view={view_id}");
            }
            Ok(if report.is_valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Sync { snapshot } => {
            let conn = open_connection(&settings)?;
            let service = build_service(&conn, &settings, load_provider(&snapshot)?)?;
            let synced = service.get_organizer()?;
            info!(
                "event=cli_sync module=cli status=ok revision={} changed={}",
                synced.revision, synced.changed
            );
            println!("{}", serde_json::to_string_pretty(&synced.document)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Read-only: never persists, with or without a snapshot.
fn check(
    conn: &Connection,
    settings: &OrganizerSettings,
    snapshot: Option<&Path>,
) -> CliResult<OrganizerValidation> {
    match snapshot {
        Some(path) => {
            let service = build_service(conn, settings, load_provider(path)?)?;
            Ok(service.integrity_report()?)
        }
        None => {
            let repo = SqliteOrganizerRepository::try_with_document_key(
                conn,
                settings.document_key.as_str(),
            )?;
            Ok(validate_organizer_integrity(&repo.load()?.document))
        }
    }
}

fn open_connection(settings: &OrganizerSettings) -> CliResult<Connection> {
    let conn = match settings.db_path.as_deref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    Ok(conn)
}

fn load_provider(path: &Path) -> CliResult<StaticResourceProvider> {
    let text = std::fs::read_to_string(path)?;
    Ok(StaticResourceProvider::from_json(
        SNAPSHOT_PROVIDER_ID,
        &text,
    )?)
}

fn build_service<'conn>(
    conn: &'conn Connection,
    settings: &OrganizerSettings,
    provider: StaticResourceProvider,
) -> CliResult<OrganizerService<SqliteOrganizerRepository<'conn>, StaticResourceProvider>> {
    let repo =
        SqliteOrganizerRepository::try_with_document_key(conn, settings.document_key.as_str())?;
    Ok(OrganizerService::new(repo, provider).with_options(settings.reconcile_options()))
}
