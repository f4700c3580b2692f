//! Starlog server binary.
//!
//! Usage:
//!   starlog [--host=H] [--port=P] [--mariadb-*=...]
//!   starlog --mariadb-init
//!   starlog --mariadb-unsafe-drop-tables
//!   starlog --mariadb-insert-test-run
//!
//! Without an admin flag the process serves the ingestion API until
//! killed. Flags override `starlog.toml`, which overrides built-in
//! defaults.

use std::process::ExitCode;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use starlog::config::Settings;
use starlog::record::Run;
use starlog::store::Warehouse;
use starlog::web;

#[derive(Parser)]
#[command(name = "starlog")]
#[command(about = "Star-schema warehouse ingestion for energy-label telemetry runs")]
#[command(version)]
struct Cli {
    /// HTTP bind host.
    #[arg(long)]
    host: Option<String>,

    /// HTTP bind port.
    #[arg(long)]
    port: Option<u16>,

    /// Warehouse user.
    #[arg(long = "mariadb-user")]
    mariadb_user: Option<String>,

    /// Warehouse password.
    #[arg(long = "mariadb-password")]
    mariadb_password: Option<String>,

    /// Warehouse database name.
    #[arg(long = "mariadb-database")]
    mariadb_database: Option<String>,

    /// Warehouse host.
    #[arg(long = "mariadb-host")]
    mariadb_host: Option<String>,

    /// Warehouse port.
    #[arg(long = "mariadb-port")]
    mariadb_port: Option<u16>,

    /// Connection pool size.
    #[arg(long = "mariadb-conn-limit")]
    mariadb_conn_limit: Option<u32>,

    /// Emit ENGINE = ColumnStore in CREATE TABLE statements.
    #[arg(long = "mariadb-column-store", value_name = "BOOL")]
    mariadb_column_store: Option<bool>,

    /// Create the warehouse tables and exit.
    #[arg(long = "mariadb-init")]
    mariadb_init: bool,

    /// Drop every warehouse table and exit. Destructive.
    #[arg(long = "mariadb-unsafe-drop-tables")]
    mariadb_unsafe_drop_tables: bool,

    /// Insert two fixture runs and exit.
    #[arg(long = "mariadb-insert-test-run")]
    mariadb_insert_test_run: bool,
}

impl Cli {
    /// Apply command-line overrides on top of file/default settings.
    fn apply(&self, settings: &mut Settings) {
        if let Some(host) = &self.host {
            settings.http.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.http.port = port;
        }
        if let Some(user) = &self.mariadb_user {
            settings.mariadb.user = user.clone();
        }
        if let Some(password) = &self.mariadb_password {
            settings.mariadb.password = password.clone();
        }
        if let Some(database) = &self.mariadb_database {
            settings.mariadb.database = database.clone();
        }
        if let Some(host) = &self.mariadb_host {
            settings.mariadb.host = host.clone();
        }
        if let Some(port) = self.mariadb_port {
            settings.mariadb.port = port;
        }
        if let Some(limit) = self.mariadb_conn_limit {
            settings.mariadb.conn_limit = limit;
        }
        if let Some(column_store) = self.mariadb_column_store {
            settings.mariadb.column_store = column_store;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    let mut settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut settings);

    // Admin commands run against a bare pool: they must work before
    // the tables (and therefore the key seeds) exist.
    if cli.mariadb_init {
        let warehouse = Warehouse::connect(&settings.mariadb);
        return exit_on(warehouse.init().await);
    }
    if cli.mariadb_unsafe_drop_tables {
        let warehouse = Warehouse::connect(&settings.mariadb);
        return exit_on(warehouse.drop_tables().await);
    }

    let warehouse = match Warehouse::open(&settings.mariadb).await {
        Ok(warehouse) => warehouse,
        Err(e) => {
            eprintln!("Failed to open warehouse: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.mariadb_insert_test_run {
        return exit_on(warehouse.insert_runs(&Run::fixtures()).await);
    }

    match web::serve(&settings.http, warehouse).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn exit_on(result: starlog::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
