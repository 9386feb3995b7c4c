//! Data models used by the application layer.
//!
//! The retrieval types live in `brieflens-core` and are re-exported here.
//! [`SourceItem`] is the raw shape a corpus source produces before it is
//! normalized into a [`Document`].

pub use brieflens_core::models::{Chunk, Document, SourceCitation, NOT_SPECIFIED, PREVIEW_CHARS};
pub use brieflens_core::registry::{Client, Matter, TimeEntry};

/// Raw item produced by a corpus source before normalization.
#[derive(Debug, Clone)]
pub struct SourceItem {
    /// Where the item came from: `"filesystem"`, `"records"` or `"demo"`.
    pub source: String,
    /// Identifier unique within the source (relative path, record id).
    pub source_id: String,
    pub title: String,
    pub client: Option<String>,
    pub matter: Option<String>,
    pub content_type: String,
    pub body: String,
}

impl SourceItem {
    /// Normalize into a [`Document`] keyed by `"{source}:{source_id}"`.
    pub fn into_document(self) -> Document {
        Document {
            id: format!("{}:{}", self.source, self.source_id),
            name: self.title,
            client: self.client,
            matter: self.matter,
            text: self.body,
        }
    }
}
