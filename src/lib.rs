//! # Brieflens
//!
//! Question answering over a legal practice's documents and registry.
//!
//! Brieflens loads a practice (clients, matters, time entries and
//! documents) from demo data, JSON records and a directory of files, and
//! answers plain-English questions with cited sources. Questions with a
//! known shape ("how many clients") are answered from the registry;
//! everything else is answered extractively from the best TF-IDF matches,
//! or with `Not specified` when nothing supports an answer.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────────┐
//! │   Sources    │──▶│   Practice   │──▶│ RetrievalSession  │
//! │ demo/JSON/FS │   │  registry    │   │ tools → TF-IDF →  │
//! └──────────────┘   └──────────────┘   │ extractive answer │
//!                                       └─────────┬─────────┘
//!                          ┌──────────────────────┤
//!                          ▼                      ▼
//!                     ┌──────────┐          ┌──────────┐
//!                     │   CLI    │          │   HTTP   │
//!                     │ (brief)  │          │  tools   │
//!                     └──────────┘          └──────────┘
//! ```
//!
//! The retrieval core (chunking, TF-IDF, search, extractive answers and
//! the router) lives in the `brieflens-core` crate.
//!
//! ## Quick Start
//!
//! ```bash
//! brief ask "How many clients do we have?"
//! brief ask "What did Johnson Corporation file?"
//! brief search "lease renewal" --client Riverside
//! brief serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Source items and re-exported core types |
//! | [`extract`] | PDF and DOCX text extraction |
//! | [`connector_fs`] | Filesystem corpus |
//! | [`seed`] | Demo practice data |
//! | [`ingest`] | Record normalization and practice loading |
//! | [`llm`] | Optional generative answers |
//! | [`ask`] | Question answering and search entry points |
//! | [`stats`] | Corpus statistics |
//! | [`traits`] | Tool trait and registry |
//! | [`server`] | HTTP tool server |

pub mod ask;
pub mod config;
pub mod connector_fs;
pub mod extract;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod models;
pub mod seed;
pub mod server;
pub mod stats;
pub mod traits;
