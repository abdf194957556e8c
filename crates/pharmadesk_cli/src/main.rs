#![forbid(unsafe_code)]
//! `pharmadesk` command-line client.
//!
//! # Responsibility
//! - Wire config, logging, the local store and a backend for one command.
//! - Gate every command through the same route and permission checks the
//!   pages use, then hand off to the core services.
//!
//! # Invariants
//! - Output is a single JSON document per command.
//! - Failures exit non-zero after one `cli_command` error event.

mod app;
mod commands;
mod handlers;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use commands::Commands;
use handlers::{account, pharmacy, purchasing};
use log::{error, info};
use pharmadesk_core::backend::{Backend, HttpBackend, OfflineBackend};
use pharmadesk_core::db::{open_db, open_db_in_memory};
use pharmadesk_core::{init_logging, ClientConfig, Session, SqliteKeyValueStore};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "pharmadesk", version)]
#[command(about = "Pharmacy desk client for owners, employees and suppliers")]
struct Cli {
    /// TOML config file; defaults apply when omitted.
    #[arg(long, global = true, env = "PHARMADESK_CONFIG")]
    config: Option<PathBuf>,
    /// Compact JSON output.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    /// Keep the store in memory for this invocation only.
    #[arg(long, global = true, default_value_t = false)]
    ephemeral: bool,
    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.command.name();
    match run(cli) {
        Ok(()) => {
            info!("event=cli_command module=cli status=ok command={command}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=cli_command module=cli status=error command={command} error={err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Ping = cli.command {
        println!("pharmadesk_core ping={}", pharmadesk_core::ping());
        println!("pharmadesk_core version={}", pharmadesk_core::core_version());
        return Ok(());
    }

    let config = ClientConfig::load(cli.config.as_deref()).context("failed to load config")?;
    if let Err(err) = init_logging(&config.log_level, config.resolved_log_dir()) {
        eprintln!("warning: file logging disabled: {err}");
    }

    let conn = if cli.ephemeral {
        open_db_in_memory()
    } else {
        open_db(config.db_path())
    }
    .context("failed to open the local store")?;
    let store = SqliteKeyValueStore::new(&conn, config.storage_quota_bytes);

    let backend: Box<dyn Backend + '_> = match &config.api_base_url {
        Some(url) => Box::new(HttpBackend::new(
            url,
            Duration::from_secs(config.request_timeout_secs),
            &store,
        )?),
        None => Box::new(OfflineBackend),
    };

    let app = App {
        config: &config,
        store: &store,
        backend: backend.as_ref(),
        json: cli.json,
    };
    dispatch(&app, cli.command)
}

fn dispatch(app: &App<'_>, command: Commands) -> Result<()> {
    if !matches!(
        command,
        Commands::Login { .. }
            | Commands::Register(_)
            | Commands::VerifyOtp { .. }
            | Commands::Storage { .. }
    ) {
        Session::new(app.store)
            .restore(app.backend)
            .context("failed to restore the session")?;
    }

    match command {
        Commands::Ping => Ok(()),
        Commands::Whoami => account::whoami(app),
        Commands::Routes => account::routes(app),
        Commands::Nav => account::nav(app),
        Commands::CanAccess { path } => account::can_access(app, &path),
        Commands::Login { email, password } => account::login(app, &email, &password),
        Commands::Register(args) => account::register(app, args),
        Commands::VerifyOtp { session, code } => account::verify_otp(app, &session, &code),
        Commands::Logout => account::logout(app),
        Commands::Orders { command } => purchasing::orders(app, command),
        Commands::Deliveries { command } => purchasing::deliveries(app, command),
        Commands::Bills { command } => purchasing::bills(app, command),
        Commands::Medicines { command } => pharmacy::medicines(app, command),
        Commands::Customers { command } => pharmacy::customers(app, command),
        Commands::Sales { command } => pharmacy::sales(app, command),
        Commands::Reports { command } => pharmacy::reports(app, command),
        Commands::Sell(args) => pharmacy::sell(app, args),
        Commands::Profile { command } => account::profile(app, command),
        Commands::SupplierProfile { command } => account::supplier_profile(app, command),
        Commands::Storage { command } => account::storage(app, command),
    }
}
