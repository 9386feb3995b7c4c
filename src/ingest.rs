//! Corpus loading and record normalization.
//!
//! Builds a [`Practice`] from the configured sources, in this order:
//!
//! 1. Demo data (`[corpus].seed_demo`).
//! 2. JSON records (`[corpus].records`).
//! 3. Files under `[corpus].root`.
//!
//! Every source produces [`SourceItem`]s that are normalized into
//! [`Document`]s. Clients and matters named by document tags are added to
//! the registry if they are not known yet, so the counting tools see the
//! same practice the documents describe.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::config::Config;
use crate::connector_fs;
use crate::models::{Document, SourceItem};
use crate::seed;
use brieflens_core::registry::PracticeRegistry;
use brieflens_core::router::{RetrievalSession, RoutedAnswer};

/// A document record as it appears in a records file or an API call.
///
/// Exactly one text field is used, by precedence: `content_text`, then
/// `content`, then `summary`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "title")]
    pub name: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub matter: Option<String>,
    #[serde(default)]
    pub content_text: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl RawRecord {
    /// The record's text, by field precedence.
    pub fn text(&self) -> Option<&str> {
        self.content_text
            .as_deref()
            .or(self.content.as_deref())
            .or(self.summary.as_deref())
    }

    /// Normalize into a [`SourceItem`]. `fallback_id` names unnamed records.
    pub fn into_source_item(self, fallback_id: &str) -> Result<SourceItem> {
        let body = match self.text() {
            Some(text) => text.to_string(),
            None => bail!(
                "record {} has no content_text, content or summary",
                self.id.as_deref().unwrap_or(fallback_id)
            ),
        };
        let source_id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| fallback_id.to_string());
        let title = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| source_id.clone());

        Ok(SourceItem {
            source: "records".to_string(),
            source_id,
            title,
            client: self.client.filter(|c| !c.trim().is_empty()),
            matter: self.matter.filter(|m| !m.trim().is_empty()),
            content_type: "text/plain".to_string(),
            body,
        })
    }
}

/// Read a JSON array of records, skipping malformed ones with a warning.
pub fn load_records(path: &Path) -> Result<Vec<SourceItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read records file: {}", path.display()))?;
    let records: Vec<RawRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse records file: {}", path.display()))?;
    Ok(normalize_records(records))
}

/// Normalize records, dropping (and logging) those without text.
pub fn normalize_records(records: Vec<RawRecord>) -> Vec<SourceItem> {
    let total = records.len();
    let items: Vec<SourceItem> = records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| {
            let fallback = format!("record-{}", i + 1);
            match record.into_source_item(&fallback) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed record");
                    None
                }
            }
        })
        .collect();
    tracing::info!(records = total, loaded = items.len(), "loaded document records");
    items
}

/// The practice registry plus the retrieval session answering over it.
pub struct Practice {
    pub registry: PracticeRegistry,
    pub session: RetrievalSession,
}

impl Practice {
    pub fn new(config: &Config) -> Self {
        Self {
            registry: PracticeRegistry::new(),
            session: RetrievalSession::new(config.retrieval_settings()),
        }
    }

    /// Add a source item as a document, registering its client and matter.
    pub fn add_item(&mut self, item: SourceItem) -> Result<&Document> {
        if item.body.trim().is_empty() {
            bail!("document text must not be empty: {}", item.source_id);
        }
        if let Some(client) = &item.client {
            self.ensure_client(client)?;
            if let Some(matter) = &item.matter {
                self.ensure_matter(client, matter)?;
            }
        }
        Ok(self.registry.add_document(item.into_document()))
    }

    fn ensure_client(&mut self, name: &str) -> Result<()> {
        if self.registry.find_client(name).is_none() {
            self.registry.add_client(name, None)?;
        }
        Ok(())
    }

    fn ensure_matter(&mut self, client: &str, title: &str) -> Result<()> {
        let known = self
            .registry
            .matters()
            .iter()
            .any(|m| m.client.eq_ignore_ascii_case(client) && m.title.eq_ignore_ascii_case(title));
        if !known {
            self.registry.add_matter(client, title, "open")?;
        }
        Ok(())
    }

    /// Add items, skipping (and logging) the ones that are rejected.
    pub fn add_items(&mut self, items: Vec<SourceItem>) -> usize {
        let mut added = 0;
        for item in items {
            let id = item.source_id.clone();
            match self.add_item(item) {
                Ok(_) => added += 1,
                Err(e) => tracing::warn!(item = %id, error = %e, "skipping document"),
            }
        }
        added
    }

    /// Route a question through the session.
    pub fn answer(&mut self, query: &str) -> RoutedAnswer {
        self.session.answer_question(&self.registry, query)
    }

    /// Rebuild the index now if documents changed since the last build.
    pub fn refresh_index(&mut self) -> bool {
        self.session.ensure_index(self.registry.documents())
    }
}

/// Build the practice from every configured source.
pub fn load_practice(config: &Config) -> Result<Practice> {
    let mut practice = Practice::new(config);

    if config.corpus.seed_demo {
        seed::seed_registry(&mut practice.registry)?;
        practice.add_items(seed::demo_items());
    }

    if let Some(records) = &config.corpus.records {
        let items = load_records(records)?;
        practice.add_items(items);
    }

    let files = connector_fs::scan_filesystem(&config.corpus)?;
    practice.add_items(files);

    tracing::info!(
        clients = practice.registry.clients().len(),
        matters = practice.registry.matters().len(),
        documents = practice.registry.documents().len(),
        "practice loaded"
    );
    Ok(practice)
}
