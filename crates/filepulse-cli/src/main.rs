//! FilePulse CLI - Live file monitoring and broadcast server
//!
//! FilePulse watches a single text file and disseminates its latest content
//! to connected observers over REST, SSE, long-polling, and WebSockets.
//!
//! ## Quick Start
//!
//! ```bash
//! # Serve the default file.txt on port 5000
//! filepulse serve
//!
//! # Watch a specific file
//! filepulse serve --file notes.txt --port 8080
//! ```

#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

use anyhow::Result;
use clap::Parser;

mod commands;

use commands::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => commands::serve::run(args).await,
        Command::Status(args) => commands::status::run(args).await,
        Command::Config(args) => commands::config::run(&args),
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,filepulse=info,filepulse_core=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
