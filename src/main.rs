mod cli;
mod server;
mod tools;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use longmem::config::LongmemConfig;

#[derive(Parser)]
#[command(name = "longmem", version, about = "Long-term event memory for AI agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (stdio transport)
    Serve,
    /// Add one event, given as a JSON object
    Add {
        /// Event mapping, e.g. '{"action":"run","args":{"command":"ls"}}'
        json: String,
    },
    /// Add every event in a JSON Lines file
    Ingest {
        /// Path to a file with one JSON object per line
        path: PathBuf,
    },
    /// Search stored events by similarity
    Search {
        query: String,
        /// Maximum number of results
        #[arg(short)]
        k: Option<usize>,
    },
    /// Show document counts and index metadata
    Stats,
    /// Delete all stored events
    Reset,
    /// Manage the local embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.longmem/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = LongmemConfig::load()?;

    // stdout carries MCP JSON-RPC; logs go to stderr.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => server::serve_stdio(config).await?,
        Command::Add { json } => cli::add::add(&config, &json).await?,
        Command::Ingest { path } => cli::ingest::ingest(&config, &path).await?,
        Command::Search { query, k } => cli::search::search(&config, &query, k).await?,
        Command::Stats => cli::stats::stats(&config)?,
        Command::Reset => cli::reset::reset(&config)?,
        Command::Model { action } => match action {
            ModelAction::Download => cli::model_download(&config.embedding).await?,
        },
    }

    Ok(())
}
