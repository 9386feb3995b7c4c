//! Core data models used throughout Brieflens.
//!
//! These types represent the documents, chunks, and source citations that
//! flow through the chunking and retrieval pipeline.

use serde::{Deserialize, Serialize};

/// Answer returned whenever nothing in the corpus supports an answer.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Maximum number of characters kept in a chunk or citation preview.
pub const PREVIEW_CHARS: usize = 300;

/// A normalized document: one required text field plus optional
/// client and matter tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    /// Display name (file name or title).
    pub name: String,
    pub client: Option<String>,
    pub matter: Option<String>,
    /// Raw body text.
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            client: None,
            matter: None,
            text: text.into(),
        }
    }

    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    pub fn with_matter(mut self, matter: impl Into<String>) -> Self {
        self.matter = Some(matter.into());
        self
    }

    /// Whether the body holds anything worth chunking.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// A word window of a document's text, the unit of retrieval.
///
/// Chunks are produced wholesale by an index build and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    /// `"{document_id}#{chunk_index}"`.
    pub id: String,
    pub document_id: String,
    pub document_name: String,
    pub client: Option<String>,
    pub matter: Option<String>,
    /// Position within the parent document, restarting at 0 per document.
    pub chunk_index: usize,
    pub text: String,
    /// First [`PREVIEW_CHARS`] characters of `text`.
    pub preview: String,
    /// SHA-256 of `text`, hex encoded.
    pub hash: String,
}

/// A ranked retrieval hit as rendered by the outer layers.
///
/// Recomputed for every query; never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceCitation {
    /// 1-based, contiguous after filtering.
    pub rank: usize,
    pub document: String,
    pub client: Option<String>,
    pub matter: Option<String>,
    pub chunk_id: String,
    /// Cosine similarity in `[0.0, 1.0]`.
    pub score: f64,
    pub text: String,
    pub preview: String,
}

impl SourceCitation {
    /// Build a citation for `chunk` at the given rank and score.
    pub fn from_chunk(chunk: &Chunk, rank: usize, score: f64) -> Self {
        Self {
            rank,
            document: chunk.document_name.clone(),
            client: chunk.client.clone(),
            matter: chunk.matter.clone(),
            chunk_id: chunk.id.clone(),
            score,
            text: chunk.text.clone(),
            preview: chunk.preview.clone(),
        }
    }
}

/// Take at most [`PREVIEW_CHARS`] characters of `text`.
pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
