//! # Brieflens Core
//!
//! Pure, synchronous retrieval logic for Brieflens: document models,
//! word-window chunking, the TF-IDF index, cosine similarity search,
//! extractive answering and the question router.
//!
//! This crate contains no tokio, filesystem I/O or network code. Document
//! text arrives already in memory; everything here runs to completion
//! inside a single call.
//!
//! ```text
//! Documents ──▶ chunk ──▶ tfidf::TfidfIndex ──┐
//!                                             ▼
//! Question ──▶ router ──(tool)──▶ registry   search ──▶ answer
//!                 │                             ▲
//!                 └──────(fallback)─────────────┘
//! ```
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | `Document`, `Chunk`, `SourceCitation`, the `NOT_SPECIFIED` sentinel |
//! | [`chunk`] | Overlapping word-window chunker |
//! | [`tfidf`] | Unigram + bigram TF-IDF vectorizer and sparse index |
//! | [`search`] | Cosine similarity top-k search with metadata filtering |
//! | [`answer`] | Keyword-scored extractive answerer |
//! | [`registry`] | In-memory clients, matters, documents and time entries |
//! | [`router`] | Deterministic intent tools and the `RetrievalSession` |

pub mod answer;
pub mod chunk;
pub mod models;
pub mod registry;
pub mod router;
pub mod search;
pub mod tfidf;
