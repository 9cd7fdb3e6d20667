//! CLI command definitions and handlers.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Load configuration with graceful fallback to defaults.
///
/// This function should be used by all commands to load the user's
/// configuration. If the config file doesn't exist or can't be parsed, it
/// falls back to defaults.
pub fn load_config() -> filepulse_core::config::Config {
    filepulse_core::config::Config::load().unwrap_or_default()
}

pub mod config;
pub mod serve;
pub mod status;

/// FilePulse - Live file monitoring and broadcast server
#[derive(Parser)]
#[command(name = "filepulse")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand)]
pub enum Command {
    /// Watch a file and serve its content to connected observers
    Serve(ServeArgs),

    /// Query the status endpoint of a running server
    Status(StatusArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the serve command
#[derive(clap::Args)]
pub struct ServeArgs {
    /// File to watch (defaults to the configured path)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Port to listen on (defaults to the configured port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Bind to localhost only
    #[arg(long)]
    pub localhost_only: bool,
}

/// Arguments for the status command
#[derive(clap::Args)]
pub struct StatusArgs {
    /// Base URL of the running server
    #[arg(long, default_value = "http://localhost:5000")]
    pub url: String,

    /// Print the raw JSON response
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the config command
#[derive(clap::Args)]
pub struct ConfigArgs {
    /// What to do with the configuration
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init,
}
