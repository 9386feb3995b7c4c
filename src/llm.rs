//! Optional generative answers over retrieved chunks.
//!
//! When `[llm].provider = "openai"` and `OPENAI_API_KEY` is set, the
//! question and the numbered retrieved chunks are sent to an
//! OpenAI-compatible chat-completions endpoint. The model is told to answer
//! only from the excerpts and to reply `Not specified` otherwise.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, ... (capped at 2^5)
//!
//! Callers treat every error as "use the extractive answer instead".

use anyhow::{anyhow, bail, Result};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::models::{SourceCitation, NOT_SPECIFIED};

const SYSTEM_PROMPT: &str = "You are a legal practice assistant. Answer the question using only \
the numbered document excerpts provided. Be concise. If the excerpts do not contain the answer, \
reply exactly: Not specified";

/// Whether the generative path is configured and has credentials.
pub fn is_available(config: &LlmConfig) -> bool {
    config.is_enabled() && std::env::var("OPENAI_API_KEY").is_ok()
}

/// Render the user message: numbered excerpts followed by the question.
pub fn build_prompt(question: &str, sources: &[SourceCitation]) -> String {
    let mut prompt = String::from("Document excerpts:\n\n");
    for source in sources {
        let tag = match (&source.client, &source.matter) {
            (Some(client), Some(matter)) => format!(" ({} / {})", client, matter),
            (Some(client), None) => format!(" ({})", client),
            _ => String::new(),
        };
        prompt.push_str(&format!(
            "[{}] {}{}\n{}\n\n",
            source.rank, source.document, tag, source.text
        ));
    }
    prompt.push_str(&format!("Question: {}\nAnswer:", question));
    prompt
}

/// Ask the configured model for an answer grounded in `sources`.
pub async fn generate_answer(
    config: &LlmConfig,
    question: &str,
    sources: &[SourceCitation],
) -> Result<String> {
    let api_key =
        std::env::var("OPENAI_API_KEY").map_err(|_| anyhow!("OPENAI_API_KEY not set"))?;
    let model = config
        .model
        .as_ref()
        .ok_or_else(|| anyhow!("llm.model required"))?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let body = serde_json::json!({
        "model": model,
        "temperature": 0.0,
        "max_tokens": config.max_tokens,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": build_prompt(question, sources) },
        ],
    });

    let mut last_err = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tracing::debug!(attempt, delay_secs = delay.as_secs(), "retrying chat completion");
            tokio::time::sleep(delay).await;
        }

        let resp = client
            .post(&config.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await;

        match resp {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    let json: serde_json::Value = response.json().await?;
                    return parse_chat_response(&json);
                }

                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    last_err = Some(anyhow!("LLM API error {}: {}", status, body_text));
                    continue;
                }

                let body_text = response.text().await.unwrap_or_default();
                bail!("LLM API error {}: {}", status, body_text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("chat completion failed after retries")))
}

/// Extract `choices[0].message.content`, trimmed and non-empty.
pub fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    let content = json
        .pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .ok_or_else(|| anyhow!("Invalid chat response: missing choices[0].message.content"))?
        .trim();
    if content.is_empty() {
        bail!("Invalid chat response: empty content");
    }
    // Models echo the sentinel with trailing punctuation
    if content.trim_end_matches('.').eq_ignore_ascii_case(NOT_SPECIFIED) {
        return Ok(NOT_SPECIFIED.to_string());
    }
    Ok(content.to_string())
}
