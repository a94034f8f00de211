//! Sealkeep command-line interface.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sealkeep_core::Config;

/// Sealkeep - per-identity encryption of small secrets
#[derive(Parser)]
#[command(name = "sealkeep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "SEALKEEP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "sealkeep=info",
            1 => "sealkeep=debug",
            _ => "sealkeep=trace",
        }
    }

    /// Load the configuration selected by `--config`, or the default one.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let config = match &self.config {
            Some(path) => Config::load_or_default(path)?,
            None => Config::load_default()?,
        };
        Ok(config)
    }
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Encrypt a value under an id's master secret
    Encrypt(commands::encrypt::EncryptArgs),

    /// Decrypt a base64 ciphertext
    Decrypt(commands::decrypt::DecryptArgs),

    /// Delete an id's master secret
    Delete(commands::delete::DeleteArgs),

    /// Show secret store availability for an id
    Status(commands::status::StatusArgs),

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    if matches!(cli.command, Commands::Version) {
        println!("sealkeep {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = cli.load_config()?;
    match cli.command {
        Commands::Encrypt(args) => commands::encrypt::run(args, &config),
        Commands::Decrypt(args) => commands::decrypt::run(args, &config),
        Commands::Delete(args) => commands::delete::run(args, &config),
        Commands::Status(args) => commands::status::run(args, &config),
        Commands::Version => Ok(()),
    }
}
