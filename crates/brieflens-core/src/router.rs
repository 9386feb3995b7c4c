//! Question router and retrieval session.
//!
//! Every question goes through two states:
//!
//! - **Tool matched**: the normalized question matches one of the
//!   deterministic [`IntentTool`]s (e.g. "how many clients"). The answer is
//!   computed directly from the [`PracticeRegistry`] and cited as the
//!   internal registry. Retrieval is skipped entirely.
//! - **Retrieval fallback**: the index is rebuilt if the document set has
//!   changed, the question is optionally narrowed to chunks tagged with a
//!   name it mentions, the top-k chunks are retrieved and an extractive
//!   answer is built from them.
//!
//! All state lives in an explicit [`RetrievalSession`] owned by the
//! caller. Nothing here fails: an empty corpus, an index with no terms or
//! a question with no overlap all degrade to [`NOT_SPECIFIED`] with no
//! sources.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::answer::{extract_answer, DEFAULT_MAX_ANSWER_CHARS};
use crate::chunk::{chunk_documents, ChunkingParams};
use crate::models::{Document, SourceCitation, NOT_SPECIFIED};
use crate::registry::PracticeRegistry;
use crate::search::{search, ChunkFilter};
use crate::tfidf::{TfidfIndex, TfidfParams};

/// Document name used in citations for tool-computed answers.
pub const REGISTRY_SOURCE: &str = "Internal registry";

/// Default number of chunks retrieved per question.
pub const DEFAULT_TOP_K: usize = 5;

const QUERY_SYNONYMS: &[(&str, &str)] = &[
    ("customers", "clients"),
    ("customer", "client"),
    ("docs", "documents"),
    ("doc", "document"),
    ("files", "documents"),
    ("cases", "matters"),
    ("case", "matter"),
];

/// Capitalized words that start questions rather than name things.
const QUESTION_WORDS: &[&str] = &[
    "what", "who", "whom", "whose", "when", "where", "which", "why", "how", "did", "does", "do",
    "is", "are", "was", "were", "can", "could", "should", "would", "will", "list", "show",
    "tell", "give", "find", "the", "a", "an", "i", "please",
];

static CAPITALIZED_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][\w&'’.-]*(?:\s+[A-Z][\w&'’.-]*)*").expect("entity pattern compiles")
});

/// Lowercase, strip punctuation, collapse whitespace and apply synonyms.
pub fn normalize_query(query: &str) -> String {
    let cleaned: String = query
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned
        .split_whitespace()
        .map(|w| {
            QUERY_SYNONYMS
                .iter()
                .find(|(from, _)| *from == w)
                .map_or(w, |(_, to)| *to)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs of capitalized words in `query`, minus leading question words.
///
/// A crude named-entity heuristic: `"What did Johnson Corporation file?"`
/// yields `["Johnson Corporation"]`. A word ending in a full stop closes
/// its run, and possessive `'s` is dropped.
pub fn extract_entities(query: &str) -> Vec<String> {
    let mut entities: Vec<String> = Vec::new();
    for m in CAPITALIZED_RUN_RE.find_iter(query) {
        let mut run: Vec<&str> = Vec::new();
        for word in m.as_str().split_whitespace() {
            run.push(entity_word(word));
            if word.ends_with('.') {
                push_entity(&mut entities, &run);
                run.clear();
            }
        }
        push_entity(&mut entities, &run);
    }
    entities
}

fn entity_word(word: &str) -> &str {
    let word = word.trim_end_matches(['.', '\'', '’']);
    word.strip_suffix("'s")
        .or_else(|| word.strip_suffix("’s"))
        .unwrap_or(word)
}

fn push_entity(entities: &mut Vec<String>, run: &[&str]) {
    let entity = run
        .iter()
        .copied()
        .skip_while(|w| QUESTION_WORDS.contains(&w.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ");
    if entity.chars().count() >= 2 && !entities.contains(&entity) {
        entities.push(entity);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Intent tools
// ═══════════════════════════════════════════════════════════════════════

/// A deterministic handler for a known question shape.
pub trait IntentTool: Send + Sync {
    /// Stable identifier, used in the `registry:<name>` citation id.
    fn name(&self) -> &str;

    /// Whether this tool handles an already-normalized question.
    fn matches(&self, normalized: &str) -> bool;

    /// Compute the answer from the registry.
    fn answer(&self, registry: &PracticeRegistry) -> String;
}

/// An [`IntentTool`] driven by a regex over the normalized question.
pub struct PatternTool {
    name: &'static str,
    pattern: Regex,
    compute: fn(&PracticeRegistry) -> String,
}

impl PatternTool {
    pub fn new(name: &'static str, pattern: &str, compute: fn(&PracticeRegistry) -> String) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("intent pattern compiles"),
            compute,
        }
    }
}

impl IntentTool for PatternTool {
    fn name(&self) -> &str {
        self.name
    }

    fn matches(&self, normalized: &str) -> bool {
        self.pattern.is_match(normalized)
    }

    fn answer(&self, registry: &PracticeRegistry) -> String {
        (self.compute)(registry)
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let joined = names.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        joined
    }
}

fn format_hours(hours: f64) -> String {
    let rounded = (hours * 100.0).round() / 100.0;
    format!("{}", rounded)
}

/// The built-in tools, in matching priority order.
pub fn builtin_tools() -> Vec<Box<dyn IntentTool>> {
    vec![
        Box::new(PatternTool::new(
            "count_clients",
            r"\b(how many|number of|count of|count) (active )?clients\b",
            |r| r.clients().len().to_string(),
        )),
        Box::new(PatternTool::new(
            "list_clients",
            r"\b(list|show|name|which are|who are)( all| the| our| my)* clients\b",
            |r| join_names(r.clients().iter().map(|c| c.name.as_str())),
        )),
        Box::new(PatternTool::new(
            "count_matters",
            r"\b(how many|number of|count of|count) (open )?matters\b",
            |r| r.matters().len().to_string(),
        )),
        Box::new(PatternTool::new(
            "list_matters",
            r"\b(list|show|name|which are|what are)( all| the| our| my)* matters\b",
            |r| join_names(r.matters().iter().map(|m| m.title.as_str())),
        )),
        Box::new(PatternTool::new(
            "count_documents",
            r"\b(how many|number of|count of|count) documents\b",
            |r| r.documents().len().to_string(),
        )),
        Box::new(PatternTool::new(
            "list_documents",
            r"\b(list|show|name|which are|what are)( all| the| our| my)* documents\b",
            |r| join_names(r.documents().iter().map(|d| d.name.as_str())),
        )),
        Box::new(PatternTool::new(
            "total_hours",
            r"\b(how many|total|sum of)( billable| billed| logged)? hours\b",
            |r| format_hours(r.total_hours()),
        )),
    ]
}

// ═══════════════════════════════════════════════════════════════════════
// Session
// ═══════════════════════════════════════════════════════════════════════

/// Coarse content signature of a document set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CorpusSignature {
    pub documents: usize,
    pub total_chars: usize,
}

impl CorpusSignature {
    pub fn of(docs: &[Document]) -> Self {
        Self {
            documents: docs.len(),
            total_chars: docs.iter().map(|d| d.text.len()).sum(),
        }
    }
}

/// Retrieval tuning, decoupled from application config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalSettings {
    pub chunking: ChunkingParams,
    pub tfidf: TfidfParams,
    pub top_k: usize,
    pub max_answer_chars: usize,
    /// Narrow retrieval to chunks tagged with names the question mentions.
    pub entity_filter: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            chunking: ChunkingParams::default(),
            tfidf: TfidfParams::default(),
            top_k: DEFAULT_TOP_K,
            max_answer_chars: DEFAULT_MAX_ANSWER_CHARS,
            entity_filter: true,
        }
    }
}

/// Which path produced an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Route {
    ToolMatched { tool: String },
    RetrievalFallback,
}

/// An answer with its supporting citations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedAnswer {
    pub answer: String,
    pub sources: Vec<SourceCitation>,
    pub route: Route,
}

impl RoutedAnswer {
    fn not_specified() -> Self {
        Self {
            answer: NOT_SPECIFIED.to_string(),
            sources: Vec::new(),
            route: Route::RetrievalFallback,
        }
    }

    pub fn is_not_specified(&self) -> bool {
        self.answer == NOT_SPECIFIED
    }
}

/// Chunks, index and tools for one logical session.
///
/// Not shareable across concurrent callers; wrap it in a lock if needed.
pub struct RetrievalSession {
    settings: RetrievalSettings,
    index: TfidfIndex,
    signature: Option<CorpusSignature>,
    tools: Vec<Box<dyn IntentTool>>,
    builds: usize,
}

impl RetrievalSession {
    /// A session with the built-in tools and no index yet.
    pub fn new(settings: RetrievalSettings) -> Self {
        Self {
            settings,
            index: TfidfIndex::empty(),
            signature: None,
            tools: builtin_tools(),
            builds: 0,
        }
    }

    /// Add a tool after the built-ins.
    pub fn register_tool(&mut self, tool: Box<dyn IntentTool>) {
        self.tools.push(tool);
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    pub fn index(&self) -> &TfidfIndex {
        &self.index
    }

    /// Signature of the document set the live index was built from.
    pub fn signature(&self) -> Option<CorpusSignature> {
        self.signature
    }

    /// Number of index builds performed so far.
    pub fn builds(&self) -> usize {
        self.builds
    }

    /// Rebuild chunks and index if `docs` differs from the last build.
    ///
    /// Returns `true` when a rebuild happened.
    pub fn ensure_index(&mut self, docs: &[Document]) -> bool {
        let signature = CorpusSignature::of(docs);
        if self.signature == Some(signature) {
            return false;
        }

        let chunks = chunk_documents(docs, &self.settings.chunking);
        self.index = TfidfIndex::build(chunks, &self.settings.tfidf);
        self.signature = Some(signature);
        self.builds += 1;

        tracing::debug!(
            documents = signature.documents,
            chunks = self.index.chunk_count(),
            vocabulary = self.index.vocabulary_len(),
            "rebuilt retrieval index"
        );
        true
    }

    /// Answer from the first matching tool, if any.
    pub fn try_tools(&self, registry: &PracticeRegistry, query: &str) -> Option<RoutedAnswer> {
        let normalized = normalize_query(query);
        let tool = self.tools.iter().find(|t| t.matches(&normalized))?;
        let answer = tool.answer(registry);

        let citation = SourceCitation {
            rank: 1,
            document: REGISTRY_SOURCE.to_string(),
            client: None,
            matter: None,
            chunk_id: format!("registry:{}", tool.name()),
            score: 1.0,
            text: answer.clone(),
            preview: answer.clone(),
        };

        tracing::debug!(tool = tool.name(), "question answered by intent tool");
        Some(RoutedAnswer {
            answer,
            sources: vec![citation],
            route: Route::ToolMatched {
                tool: tool.name().to_string(),
            },
        })
    }

    /// Retrieve the top-k chunks with a positive score for `query`.
    pub fn retrieve(&mut self, docs: &[Document], query: &str) -> Vec<SourceCitation> {
        self.ensure_index(docs);
        if self.index.is_empty() || query.trim().is_empty() {
            return Vec::new();
        }

        let filter = self.entity_filter_for(query);
        let mut hits = search(&self.index, query, self.settings.top_k, filter.as_ref());
        // scores are sorted, so dropping zeros keeps ranks contiguous
        hits.retain(|h| h.score > 0.0);
        hits
    }

    /// Entity filter for `query`, only if some indexed chunk would pass it.
    fn entity_filter_for(&self, query: &str) -> Option<ChunkFilter> {
        if !self.settings.entity_filter {
            return None;
        }
        let entities = extract_entities(query);
        if entities.is_empty() {
            return None;
        }
        let filter = ChunkFilter::Entities(entities);
        if self.index.chunks().iter().any(|c| filter.matches(c)) {
            Some(filter)
        } else {
            None
        }
    }

    /// Route `query`: deterministic tools first, retrieval otherwise.
    pub fn answer_question(&mut self, registry: &PracticeRegistry, query: &str) -> RoutedAnswer {
        if query.trim().is_empty() {
            return RoutedAnswer::not_specified();
        }
        if let Some(answer) = self.try_tools(registry, query) {
            return answer;
        }

        let sources = self.retrieve(registry.documents(), query);
        let answer = answer_from_sources(query, &sources, self.settings.max_answer_chars);
        if answer == NOT_SPECIFIED {
            return RoutedAnswer::not_specified();
        }
        RoutedAnswer {
            answer,
            sources,
            route: Route::RetrievalFallback,
        }
    }
}

/// Concatenate retrieved chunk texts into one context string.
pub fn build_context(sources: &[SourceCitation]) -> String {
    sources
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Extractive answer over the retrieved sources.
pub fn answer_from_sources(query: &str, sources: &[SourceCitation], max_chars: usize) -> String {
    extract_answer(&build_context(sources), query, max_chars)
}
