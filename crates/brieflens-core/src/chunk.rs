//! Overlapping word-window chunker.
//!
//! Splits document text into [`Chunk`]s of a fixed number of
//! whitespace-separated words, with consecutive windows sharing a fixed
//! number of words. Each chunk carries its parent document's name and
//! client/matter tags, a per-document index, a preview, and a SHA-256
//! hash of its text.
//!
//! # Algorithm
//!
//! 1. Tokenize the text on whitespace.
//! 2. Step through the tokens by `max(1, window - overlap)`.
//! 3. Emit `tokens[start..min(start + window, n)]` for every step.
//! 4. Stop once a window reaches the final token; the last window may be
//!    shorter than `window`.
//!
//! Documents whose text is empty or whitespace-only produce no chunks.
//!
//! # Example
//!
//! ```rust
//! use brieflens_core::chunk::{chunk_documents, ChunkingParams};
//! use brieflens_core::models::Document;
//!
//! let docs = vec![Document::new("d1", "memo.txt", "one two three four five")];
//! let params = ChunkingParams { window_words: 3, overlap_words: 1 };
//! let chunks = chunk_documents(&docs, &params);
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[0].text, "one two three");
//! assert_eq!(chunks[1].text, "three four five");
//! ```

use std::ops::Range;

use sha2::{Digest, Sha256};

use crate::models::{preview, Chunk, Document};

/// Default window size in words.
pub const DEFAULT_WINDOW_WORDS: usize = 320;

/// Default number of words shared by consecutive windows.
pub const DEFAULT_OVERLAP_WORDS: usize = 64;

/// Window and overlap sizes, both in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingParams {
    pub window_words: usize,
    pub overlap_words: usize,
}

impl Default for ChunkingParams {
    fn default() -> Self {
        Self {
            window_words: DEFAULT_WINDOW_WORDS,
            overlap_words: DEFAULT_OVERLAP_WORDS,
        }
    }
}

impl ChunkingParams {
    /// Distance between the starts of consecutive windows.
    pub fn step(&self) -> usize {
        self.window_words.saturating_sub(self.overlap_words).max(1)
    }
}

/// Token ranges covered by each window over `n_tokens` tokens.
///
/// Every token falls in at least one range, and consecutive ranges
/// overlap by exactly `overlap_words` tokens except where the final
/// range is cut short by the end of the text.
pub fn word_windows(n_tokens: usize, params: &ChunkingParams) -> Vec<Range<usize>> {
    let window = params.window_words.max(1);
    let step = params.step();

    let mut ranges = Vec::new();
    let mut start = 0;
    while start < n_tokens {
        let end = (start + window).min(n_tokens);
        ranges.push(start..end);
        if end == n_tokens {
            break;
        }
        start += step;
    }
    ranges
}

/// Chunk a single document. Returns an empty list for blank text.
pub fn chunk_document(doc: &Document, params: &ChunkingParams) -> Vec<Chunk> {
    let tokens: Vec<&str> = doc.text.split_whitespace().collect();
    word_windows(tokens.len(), params)
        .into_iter()
        .enumerate()
        .map(|(index, range)| make_chunk(doc, index, &tokens[range].join(" ")))
        .collect()
}

/// Chunk every document in order, producing one flat list.
pub fn chunk_documents(docs: &[Document], params: &ChunkingParams) -> Vec<Chunk> {
    docs.iter()
        .filter(|d| d.has_text())
        .flat_map(|d| chunk_document(d, params))
        .collect()
}

/// Create a single [`Chunk`] with a deterministic id and SHA-256 content hash.
fn make_chunk(doc: &Document, index: usize, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: format!("{}#{}", doc.id, index),
        document_id: doc.id.clone(),
        document_name: doc.name.clone(),
        client: doc.client.clone(),
        matter: doc.matter.clone(),
        chunk_index: index,
        text: text.to_string(),
        preview: preview(text),
        hash,
    }
}
