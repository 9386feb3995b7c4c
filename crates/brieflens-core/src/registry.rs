//! In-memory practice registry: clients, matters, documents and time entries.
//!
//! The registry is the data the router's deterministic tools answer from.
//! It lives for one process and is populated by the application layer
//! (demo seed data, JSON records, files on disk).

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub industry: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matter {
    pub id: String,
    /// Owning client's name.
    pub client: String,
    pub title: String,
    /// Free-form status, e.g. `"open"` or `"closed"`.
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: String,
    pub client: String,
    pub matter: Option<String>,
    pub date: NaiveDate,
    pub hours: f64,
    pub description: String,
}

/// All practice data for one session.
#[derive(Debug, Clone, Default)]
pub struct PracticeRegistry {
    clients: Vec<Client>,
    matters: Vec<Matter>,
    documents: Vec<Document>,
    time_entries: Vec<TimeEntry>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl PracticeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client. Names must be non-blank and unique (case-insensitive).
    pub fn add_client(&mut self, name: &str, industry: Option<&str>) -> Result<&Client> {
        let name = name.trim();
        if name.is_empty() {
            bail!("client name must not be empty");
        }
        if self.find_client(name).is_some() {
            bail!("client already exists: {}", name);
        }
        self.clients.push(Client {
            id: new_id(),
            name: name.to_string(),
            industry: industry.map(str::to_string),
        });
        Ok(&self.clients[self.clients.len() - 1])
    }

    /// Open a matter for an existing client.
    pub fn add_matter(&mut self, client: &str, title: &str, status: &str) -> Result<&Matter> {
        let title = title.trim();
        if title.is_empty() {
            bail!("matter title must not be empty");
        }
        let client = match self.find_client(client) {
            Some(c) => c.name.clone(),
            None => bail!("client not found: {}", client),
        };
        self.matters.push(Matter {
            id: new_id(),
            client,
            title: title.to_string(),
            status: status.to_string(),
        });
        Ok(&self.matters[self.matters.len() - 1])
    }

    /// Add a document, generating an id when it has none.
    pub fn add_document(&mut self, mut doc: Document) -> &Document {
        if doc.id.trim().is_empty() {
            doc.id = new_id();
        }
        self.documents.push(doc);
        &self.documents[self.documents.len() - 1]
    }

    /// Record billable time against an existing client.
    pub fn add_time_entry(
        &mut self,
        client: &str,
        matter: Option<&str>,
        date: NaiveDate,
        hours: f64,
        description: &str,
    ) -> Result<&TimeEntry> {
        if !(hours > 0.0 && hours.is_finite()) {
            bail!("hours must be a positive number, got {}", hours);
        }
        let client = match self.find_client(client) {
            Some(c) => c.name.clone(),
            None => bail!("client not found: {}", client),
        };
        self.time_entries.push(TimeEntry {
            id: new_id(),
            client,
            matter: matter.map(str::to_string),
            date,
            hours,
            description: description.to_string(),
        });
        Ok(&self.time_entries[self.time_entries.len() - 1])
    }

    pub fn find_client(&self, name: &str) -> Option<&Client> {
        let name = name.trim();
        self.clients
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn matters(&self) -> &[Matter] {
        &self.matters
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn time_entries(&self) -> &[TimeEntry] {
        &self.time_entries
    }

    pub fn total_hours(&self) -> f64 {
        self.time_entries.iter().map(|t| t.hours).sum()
    }
}
