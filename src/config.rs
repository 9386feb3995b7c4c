//! TOML configuration.
//!
//! Every section is optional. A missing section takes its defaults, so an
//! empty file (or [`Config::minimal`]) describes the demo practice with
//! extractive answering and no filesystem corpus.

use anyhow::{bail, Context, Result};
use brieflens_core::chunk::{ChunkingParams, DEFAULT_OVERLAP_WORDS, DEFAULT_WINDOW_WORDS};
use brieflens_core::router::{RetrievalSettings, DEFAULT_TOP_K};
use brieflens_core::tfidf::{TfidfParams, DEFAULT_MAX_FEATURES};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Smallest answer budget that still leaves room for a sentence fragment.
const MIN_ANSWER_CHARS: usize = 20;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Directory of practice documents, laid out as `<client>/<matter>/<file>`.
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    /// JSON array of document records.
    #[serde(default)]
    pub records: Option<PathBuf>,
    /// Load the built-in demo clients, matters and documents.
    #[serde(default = "default_true")]
    pub seed_demo: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            root: None,
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
            records: None,
            seed_demo: true,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec![
        "**/*.txt".to_string(),
        "**/*.md".to_string(),
        "**/*.pdf".to_string(),
        "**/*.docx".to_string(),
    ]
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_window_words")]
    pub window_words: usize,
    #[serde(default = "default_overlap_words")]
    pub overlap_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_words: DEFAULT_WINDOW_WORDS,
            overlap_words: DEFAULT_OVERLAP_WORDS,
        }
    }
}

fn default_window_words() -> usize {
    DEFAULT_WINDOW_WORDS
}
fn default_overlap_words() -> usize {
    DEFAULT_OVERLAP_WORDS
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_max_answer_chars")]
    pub max_answer_chars: usize,
    #[serde(default = "default_max_features")]
    pub max_features: usize,
    #[serde(default = "default_true")]
    pub entity_filter: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_answer_chars: default_max_answer_chars(),
            max_features: DEFAULT_MAX_FEATURES,
            entity_filter: true,
        }
    }
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}
fn default_max_answer_chars() -> usize {
    brieflens_core::answer::DEFAULT_MAX_ANSWER_CHARS
}
fn default_max_features() -> usize {
    DEFAULT_MAX_FEATURES
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    2
}
fn default_max_tokens() -> u32 {
    400
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

impl Config {
    /// All-defaults configuration: demo data, extractive answers.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Core retrieval settings derived from this config.
    pub fn retrieval_settings(&self) -> RetrievalSettings {
        RetrievalSettings {
            chunking: ChunkingParams {
                window_words: self.chunking.window_words,
                overlap_words: self.chunking.overlap_words,
            },
            tfidf: TfidfParams {
                max_features: self.retrieval.max_features,
                ..TfidfParams::default()
            },
            top_k: self.retrieval.top_k,
            max_answer_chars: self.retrieval.max_answer_chars,
            entity_filter: self.retrieval.entity_filter,
        }
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.window_words == 0 {
            bail!("chunking.window_words must be > 0");
        }
        if self.chunking.overlap_words >= self.chunking.window_words {
            bail!(
                "chunking.overlap_words ({}) must be < chunking.window_words ({})",
                self.chunking.overlap_words,
                self.chunking.window_words
            );
        }

        if self.retrieval.top_k < 1 {
            bail!("retrieval.top_k must be >= 1");
        }
        if self.retrieval.max_answer_chars < MIN_ANSWER_CHARS {
            bail!("retrieval.max_answer_chars must be >= {}", MIN_ANSWER_CHARS);
        }
        if self.retrieval.max_features == 0 {
            bail!("retrieval.max_features must be > 0");
        }

        match self.llm.provider.as_str() {
            "disabled" | "openai" => {}
            other => bail!(
                "Unknown llm provider: '{}'. Must be disabled or openai.",
                other
            ),
        }
        if self.llm.is_enabled() && self.llm.model.is_none() {
            bail!(
                "llm.model must be specified when provider is '{}'",
                self.llm.provider
            );
        }

        Ok(())
    }
}

/// Parse and validate a TOML config string.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}
