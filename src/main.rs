//! # Brieflens CLI (`brief`)
//!
//! Ask questions about a legal practice, search its documents, inspect
//! what is loaded, or start the HTTP tool server.
//!
//! ## Usage
//!
//! ```bash
//! brief --config ./config/brief.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `brief ask "<question>"` | Answer a question with cited sources |
//! | `brief search "<query>"` | Rank document chunks for a query |
//! | `brief stats` | Corpus, index and registry summary |
//! | `brief documents` | List loaded documents |
//! | `brief serve` | Start the HTTP tool server |
//!
//! Without `--config`, `./config/brief.toml` is used if it exists and the
//! built-in demo practice otherwise.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use brieflens::config::{self, Config};
use brieflens::{ask, logging, server, stats};

const DEFAULT_CONFIG_PATH: &str = "./config/brief.toml";

/// Brieflens: question answering over a legal practice's documents.
#[derive(Parser)]
#[command(
    name = "brief",
    about = "Brieflens: question answering over a legal practice's documents and registry",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/brief.toml`; when that file does not exist the
    /// built-in defaults (demo practice, extractive answers) are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question.
    ///
    /// Registry questions ("how many clients") are answered exactly;
    /// everything else is answered from the best-matching document chunks.
    Ask {
        /// The question, in plain English.
        question: String,

        /// Print the full response as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Rank document chunks by similarity to a query.
    Search {
        query: String,

        /// Maximum number of results (defaults to `[retrieval].top_k`).
        #[arg(long)]
        limit: Option<usize>,

        /// Only chunks whose client, matter or document name contains this.
        #[arg(long)]
        client: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Show corpus, index and registry statistics.
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// List loaded documents.
    Documents,

    /// Start the HTTP tool server on `[server].bind`.
    Serve,
}

fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => config::load_config(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                config::load_config(default)
            } else {
                tracing::debug!("no config file found, using defaults");
                Ok(Config::minimal())
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let cfg = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Ask { question, json } => {
            ask::run_ask(&cfg, &question, json).await?;
        }
        Commands::Search {
            query,
            limit,
            client,
            json,
        } => {
            ask::run_search(&cfg, &query, limit, client.as_deref(), json)?;
        }
        Commands::Stats { json } => {
            stats::run_stats(&cfg, json)?;
        }
        Commands::Documents => {
            stats::run_documents(&cfg)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
