//! Binary entry point for agora.
//!
//! Two commands: `init` creates the database schema, `serve` runs the
//! HTTP services. Configuration merges defaults, an optional TOML file,
//! and CLI flags, in that order.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use agora::config::AgoraConfig;
use agora::db::{ConnectionScope, schema};
use agora::observability::{self, LogFormat};
use agora::server;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Agora - community discussion HTTP services over a shared SQLite store.
#[derive(Parser)]
#[command(name = "agora")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log output format: pretty or json.
    #[arg(long, global = true, default_value = "pretty")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Create the database schema (idempotent).
    Init {
        /// Path to the SQLite database file.
        #[arg(short, long, env = "AGORA_DATABASE")]
        database: Option<PathBuf>,
    },

    /// Run the HTTP services.
    Serve {
        /// Path to the SQLite database file.
        #[arg(short, long, env = "AGORA_DATABASE")]
        database: Option<PathBuf>,

        /// Address to bind.
        #[arg(short, long)]
        bind: Option<String>,

        /// Port to listen on.
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = observability::init(LogFormat::parse(&cli.log_format), cli.verbose) {
        eprintln!("Failed to initialize observability: {e}");
        return ExitCode::FAILURE;
    }

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    match run_command(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

fn load_config(path: Option<&std::path::Path>) -> agora::Result<AgoraConfig> {
    path.map_or_else(
        || Ok(AgoraConfig::load_default()),
        AgoraConfig::load_from_file,
    )
}

fn run_command(command: Commands, config: AgoraConfig) -> agora::Result<()> {
    match command {
        Commands::Init { database } => {
            let config = match database {
                Some(path) => config.with_database(path),
                None => config,
            };
            let mut scope = ConnectionScope::new(config.database.clone());
            schema::init(&mut scope)
        },
        Commands::Serve {
            database,
            bind,
            port,
        } => {
            let mut config = config;
            if let Some(path) = database {
                config = config.with_database(path);
            }
            if let Some(addr) = bind {
                config = config.with_bind(addr);
            }
            if let Some(port) = port {
                config = config.with_port(port);
            }
            run_server(&config)
        },
    }
}

/// Data access is blocking, so the runtime only has to drive the
/// listener and signal handling.
fn run_server(config: &AgoraConfig) -> agora::Result<()> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| agora::Error::OperationFailed {
        operation: "start_runtime".to_string(),
        cause: e.to_string(),
    })?;
    runtime.block_on(server::serve(config))
}
