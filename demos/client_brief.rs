//! Example: a custom Brieflens server with an extra Rust tool.
//!
//! Adds a **`ClientBriefTool`** that gathers everything the practice holds
//! about one client: its documents, the best-matching chunks for a topic,
//! and an answer to a question about that topic.
//!
//! # Running
//!
//! ```bash
//! cargo run --example client_brief -- serve
//!
//! # In another terminal:
//! curl -s http://localhost:7341/tools/list | jq .
//! curl -s -X POST http://localhost:7341/tools/client_brief \
//!   -H 'Content-Type: application/json' \
//!   -d '{"client": "Johnson Corporation", "topic": "damages"}' | jq .
//! ```
//!
//! Without `--config` the demo practice is served.

use anyhow::{bail, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;

use brieflens::config::{self, Config};
use brieflens::server::run_server_with_extensions;
use brieflens::traits::{SearchOptions, Tool, ToolContext, ToolRegistry};

// ═══════════════════════════════════════════════════════════════════════
// Client Brief Tool
// ═══════════════════════════════════════════════════════════════════════

/// Summarizes one client's documents around a topic.
struct ClientBriefTool;

#[async_trait]
impl Tool for ClientBriefTool {
    fn name(&self) -> &str {
        "client_brief"
    }

    fn description(&self) -> &str {
        "Documents, top passages and an answer about one client and topic"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "client": { "type": "string", "description": "Client name" },
                "topic": { "type": "string", "description": "What to look for" },
                "limit": { "type": "integer", "default": 3 }
            },
            "required": ["client", "topic"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let client = params["client"].as_str().unwrap_or("").trim();
        let topic = params["topic"].as_str().unwrap_or("").trim();
        if client.is_empty() || topic.is_empty() {
            bail!("client and topic must not be empty");
        }
        let limit = params["limit"].as_u64().unwrap_or(3) as usize;

        let documents = ctx.documents(Some(client)).await;
        if documents.is_empty() {
            bail!("client not found: {}", client);
        }

        let passages = ctx
            .search(
                topic,
                SearchOptions {
                    limit: Some(limit.max(1)),
                    client: Some(client.to_string()),
                },
            )
            .await?;

        let question = format!("What does {} say about {}?", client, topic);
        let answer = ctx.ask(&question).await?;

        Ok(json!({
            "client": client,
            "documents": documents,
            "passages": passages
                .iter()
                .map(|p| json!({
                    "document": p.document,
                    "matter": p.matter,
                    "score": p.score,
                    "preview": p.preview,
                }))
                .collect::<Vec<_>>(),
            "answer": answer.answer,
            "sources": answer.sources,
        }))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// CLI
// ═══════════════════════════════════════════════════════════════════════

/// Brieflens server with the client brief tool.
#[derive(Parser)]
#[command(name = "client-brief", about = "Brieflens server with a client brief tool")]
struct Cli {
    /// Path to configuration file (TOML). Defaults to the demo practice.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the tool server with the client brief tool.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    brieflens::logging::init_logging(false);
    let cli = Cli::parse();
    let cfg = match cli.config {
        Some(path) => config::load_config(&path)?,
        None => Config::minimal(),
    };

    match cli.command {
        Commands::Serve => {
            let mut tools = ToolRegistry::new();
            tools.register(Box::new(ClientBriefTool));

            println!("Starting server with ClientBriefTool on {}...", cfg.server.bind);
            run_server_with_extensions(&cfg, tools).await?;
        }
    }

    Ok(())
}
