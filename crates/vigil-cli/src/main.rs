//! Vigil CLI — runtime entrypoint.
//!
//! Default invocation (no subcommand) loads the config named by
//! `--config`, bootstraps one monitor/booker pair per persisted session,
//! and runs until `SIGINT`/`SIGTERM`. `sessions`/`keys` subcommands are
//! operator tooling layered on top.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

use commands::{keys, run, sessions};

/// Vigil — multi-tenant appointment booking runtime.
#[derive(Parser)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the runtime YAML config file.
    #[arg(short, long, global = true, default_value = "vigil.yaml")]
    config: PathBuf,

    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitor/booking runtime until interrupted (the default).
    Run,

    /// Inspect or modify the persisted session store.
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Manage session-store encryption keys.
    Keys {
        #[command(subcommand)]
        command: KeyCommands,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// List every session in the store.
    List,
    /// Insert or replace a session from a JSON file.
    Upsert {
        /// Path to a JSON-encoded `SessionRecord`.
        path: PathBuf,
    },
    /// Remove a session by id.
    Delete {
        /// The session id to remove.
        session_id: String,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Generate a new session-store encryption key and print it base64-encoded.
    Generate,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        None | Some(Commands::Run) => run::run(&cli.config).await,
        Some(Commands::Sessions { command }) => match command {
            SessionCommands::List => sessions::list(&cli.config).await,
            SessionCommands::Upsert { path } => sessions::upsert(&cli.config, &path).await,
            SessionCommands::Delete { session_id } => {
                sessions::delete(&cli.config, &session_id).await
            }
        },
        Some(Commands::Keys { command }) => match command {
            KeyCommands::Generate => keys::generate(),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "vigil exited with an error");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
