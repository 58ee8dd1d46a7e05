mod commands;
mod error;
mod util;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use crate::commands::{calls, contacts, format, search, sync, Context};
use crate::error::{exit_code_for, report_error};
use quickdial_config as config;
use quickdial_store::{paths, Store};

#[derive(Debug, Parser)]
#[command(name = "quickdial", version, about = "quickdial CLI")]
struct Cli {
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(name = "add-contact")]
    AddContact(contacts::AddContactArgs),
    /// Mark a contact as a favorite
    Star(contacts::StarArgs),
    #[command(name = "log-call")]
    LogCall(calls::LogCallArgs),
    /// Ranked contact search
    Search(search::SearchArgs),
    /// Interactive search: one query per stdin line
    Shell(search::ShellArgs),
    Favorites(contacts::FavoritesArgs),
    Recents(calls::RecentsArgs),
    Roster(contacts::RosterArgs),
    /// Display form of a phone number
    Format(format::FormatArgs),
    #[command(subcommand)]
    Import(sync::ImportCommand),
    #[command(subcommand)]
    Export(sync::ExportCommand),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, verbose);
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        db_path,
        config: config_path,
        json,
        verbose,
        command,
    } = cli;

    let app_config = config::load(config_path.clone()).with_context(|| "load config")?;
    if verbose {
        match config::resolve_config_path(config_path) {
            Ok(path) if path.exists() => debug!(path = %path.display(), "config resolved"),
            Ok(path) => debug!(path = %path.display(), "config missing, using defaults"),
            Err(err) => debug!(error = %err, "config unavailable"),
        }
    }

    let db_path = paths::resolve_db_path(db_path).with_context(|| "resolve database path")?;
    debug!(path = %db_path.display(), "database path resolved");

    let store =
        Store::open(&db_path).with_context(|| format!("open database {}", db_path.display()))?;
    store.migrate().with_context(|| "run migrations")?;

    let ctx = Context {
        store: &store,
        json,
        config: &app_config,
    };

    match command {
        Command::AddContact(args) => contacts::add_contact(&ctx, args),
        Command::Star(args) => contacts::star(&ctx, args),
        Command::LogCall(args) => calls::log_call(&ctx, args),
        Command::Search(args) => search::search(&ctx, args),
        Command::Shell(args) => search::shell(&ctx, args),
        Command::Favorites(args) => contacts::favorites(&ctx, args),
        Command::Recents(args) => calls::recents(&ctx, args),
        Command::Roster(args) => contacts::roster(&ctx, args),
        Command::Format(args) => format::format_number(&ctx, args),
        Command::Import(cmd) => match cmd {
            sync::ImportCommand::Vcf(args) => sync::import_vcf(&ctx, args),
        },
        Command::Export(cmd) => match cmd {
            sync::ExportCommand::Vcf(args) => sync::export_vcf(&ctx, args),
        },
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}
