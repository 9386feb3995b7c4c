//! Question answering and chunk search for the CLI and tool server.
//!
//! [`ask_question`] is the single entry point both surfaces use: it routes
//! through the practice's retrieval session and, when configured, replaces
//! the extractive answer with a generated one from the same sources.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::config::Config;
use crate::ingest::{load_practice, Practice};
use crate::llm;
use crate::models::{SourceCitation, NOT_SPECIFIED};
use brieflens_core::router::Route;
use brieflens_core::search::{search, ChunkFilter};

/// How the final answer text was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    Tool,
    Extractive,
    Generative,
}

impl AnswerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerMode::Tool => "tool",
            AnswerMode::Extractive => "extractive",
            AnswerMode::Generative => "generative",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
    pub sources: Vec<SourceCitation>,
    pub route: Route,
    pub mode: AnswerMode,
}

/// Answer `query` from the practice.
///
/// Fails only for a blank question. Generative failures fall back to the
/// extractive answer with a warning.
pub async fn ask_question(config: &Config, practice: &mut Practice, query: &str) -> Result<AskResponse> {
    if query.trim().is_empty() {
        bail!("query must not be empty");
    }

    let routed = practice.answer(query);
    let mut response = AskResponse {
        question: query.to_string(),
        answer: routed.answer,
        sources: routed.sources,
        mode: match routed.route {
            Route::ToolMatched { .. } => AnswerMode::Tool,
            Route::RetrievalFallback => AnswerMode::Extractive,
        },
        route: routed.route,
    };

    if response.mode == AnswerMode::Extractive
        && !response.sources.is_empty()
        && llm::is_available(&config.llm)
    {
        match llm::generate_answer(&config.llm, query, &response.sources).await {
            Ok(answer) => {
                if answer == NOT_SPECIFIED {
                    response.sources.clear();
                }
                response.answer = answer;
                response.mode = AnswerMode::Generative;
            }
            Err(e) => {
                tracing::warn!(error = %e, "generative answer failed, using extractive answer");
            }
        }
    }

    Ok(response)
}

/// Ranked chunks for `query` with a positive score, optionally limited to
/// one client.
///
/// The client scope is applied before the `limit` cut, so a client's
/// chunks are returned even when other clients' chunks rank higher.
pub fn search_chunks(
    practice: &mut Practice,
    query: &str,
    limit: usize,
    client: Option<&str>,
) -> Result<Vec<SourceCitation>> {
    if query.trim().is_empty() {
        bail!("query must not be empty");
    }
    if limit == 0 {
        bail!("limit must be >= 1");
    }
    practice.refresh_index();

    let index = practice.session.index();
    let filter = client.map(|c| ChunkFilter::Entities(vec![c.to_string()]));
    let k = if filter.is_some() { index.chunk_count() } else { limit };
    let mut hits = search(index, query, k, filter.as_ref());
    hits.retain(|h| h.score > 0.0);
    hits.truncate(limit);
    // keep ranks contiguous after dropping zero scores
    for (i, hit) in hits.iter_mut().enumerate() {
        hit.rank = i + 1;
    }
    Ok(hits)
}

fn tag(source: &SourceCitation) -> String {
    match (&source.client, &source.matter) {
        (Some(client), Some(matter)) => format!(" ({} / {})", client, matter),
        (Some(client), None) => format!(" ({})", client),
        _ => String::new(),
    }
}

fn print_sources(sources: &[SourceCitation]) {
    for s in sources {
        println!(
            "  {}. {}{}  score={:.3}",
            s.rank,
            s.document,
            tag(s),
            s.score
        );
        println!("     {}", s.preview.replace('\n', " "));
    }
}

/// `brief ask`: print the answer and its sources.
pub async fn run_ask(config: &Config, query: &str, json: bool) -> Result<()> {
    let mut practice = load_practice(config)?;
    let response = ask_question(config, &mut practice, query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("{}", response.answer);
    println!();
    let route = match &response.route {
        Route::ToolMatched { tool } => format!("tool:{}", tool),
        Route::RetrievalFallback => "retrieval".to_string(),
    };
    println!("route: {} ({})", route, response.mode.as_str());
    if response.sources.is_empty() {
        println!("sources: none");
    } else {
        println!("sources:");
        print_sources(&response.sources);
    }
    Ok(())
}

/// `brief search`: print ranked chunks.
pub fn run_search(
    config: &Config,
    query: &str,
    limit: Option<usize>,
    client: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut practice = load_practice(config)?;
    let limit = limit.unwrap_or(config.retrieval.top_k);
    let hits = search_chunks(&mut practice, query, limit, client)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }
    print_sources(&hits);
    Ok(())
}
