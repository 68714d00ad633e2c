//! Command line interface for the `cram` study-content library.
//!
//! This crate wires the library into a CLI tool supporting:
//! - Workspace initialization and cleanup
//! - Course-document import (extraction, generation, persistence)
//! - Stored-artifact listing
//! - A chat assistant over the stored subjects
//! - Account sign-in/out and cloud snapshot sync
//!
//! # Usage
//!
//! ```bash
//! # Set up the configuration and the local store
//! cram init
//!
//! # Persist an API credential (optional; mock content without one)
//! cram key sk-...
//!
//! # Import a course document
//! cram import cours-thermo.pdf --qcm 10
//!
//! # See what is stored
//! cram list
//!
//! # Ask the assistant a question
//! cram ask "Explique l'entropie" --subject Physique
//!
//! # Cloud account and sync
//! cram login
//! cram sync
//! cram logout
//! ```
//!
//! Verbosity is controlled with `-v` flags; destructive operations ask
//! for confirmation unless `--accept-defaults` is passed.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::path::PathBuf;

use clap::{builder::ArgAction, Parser, Subcommand};
use cram::{config::Config, error::CramError, store::Store};
use error::CramdError;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod error;
pub mod interaction;

use crate::{commands::*, error::Result, interaction::*};

/// Command line interface configuration and argument parsing.
#[derive(Parser)]
#[command(author, version, about = "Turn course documents into quizzes, flashcards, and summaries")]
pub struct Cli {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Path to the configuration file. Defaults to the platform-specific
  /// config directory.
  #[arg(long, short, global = true)]
  config: Option<PathBuf>,

  /// Path to the local store file. Defaults to the platform-specific
  /// data directory.
  #[arg(long, short, global = true)]
  store: Option<PathBuf>,

  /// The subcommand to execute
  #[command(subcommand)]
  command: Commands,

  /// Skip all prompts and accept defaults (mostly for testing)
  #[arg(long, hide = true, global = true)]
  accept_defaults: bool,
}

/// Configures the logging system based on the verbosity level.
///
/// The levels are 0: error, 1: warn, 2: info, 3: debug, 4+: trace; the
/// `RUST_LOG` environment variable overrides them all.
fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

/// Loads the configuration and opens the store, resolving the API
/// credential from the config file, the environment, or the store.
async fn environment(config_path: &PathBuf, store_path: &PathBuf) -> Result<(Config, Store)> {
  debug!("using configuration {config_path:?} and store {store_path:?}");
  let mut config = Config::load_or_default(config_path)?;
  let store = Store::open(store_path).await?;
  if config.api.api_key.is_none() {
    config.api.api_key = store.api_key().await?;
  }
  Ok((config, store))
}

/// Entry point for the cram CLI.
#[tokio::main]
async fn main() -> std::process::ExitCode {
  let cli = Cli::parse();
  setup_logging(cli.verbose);

  if let Err(e) = run(cli).await {
    eprintln!("{} {e}", console::style(ERROR_PREFIX).red());
    return std::process::ExitCode::FAILURE;
  }
  std::process::ExitCode::SUCCESS
}

/// Dispatches the parsed command.
async fn run(cli: Cli) -> Result<()> {
  let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
  let store_path = cli.store.clone().unwrap_or_else(Store::default_path);
  let interaction = ConsoleInteraction::new(cli.accept_defaults);

  match cli.command {
    Commands::Init(args) => init(&interaction, &config_path, &store_path, args).await,
    Commands::Clean => clean(&interaction, &store_path).await,
    Commands::Key(args) => {
      let (_, store) = environment(&config_path, &store_path).await?;
      key(&interaction, &store, args).await
    },
    Commands::Import(args) => {
      let (config, store) = environment(&config_path, &store_path).await?;
      import(&interaction, &config, &store, args).await
    },
    Commands::List => {
      let (_, store) = environment(&config_path, &store_path).await?;
      list(&interaction, &store).await
    },
    Commands::Ask(args) => {
      let (config, store) = environment(&config_path, &store_path).await?;
      ask(&interaction, &config, &store, args).await
    },
    Commands::Login(args) => {
      let (config, store) = environment(&config_path, &store_path).await?;
      login(&interaction, &config, &store, args).await
    },
    Commands::Logout => {
      let (_, store) = environment(&config_path, &store_path).await?;
      logout(&interaction, &store).await
    },
    Commands::Sync => {
      let (config, store) = environment(&config_path, &store_path).await?;
      sync(&interaction, &config, &store).await
    },
  }
}
