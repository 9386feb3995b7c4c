//! Corpus statistics and document listing.
//!
//! Gives a quick summary of what the practice holds and what the index was
//! built from. Used by `brief stats` and `brief documents`.

use anyhow::Result;
use serde::Serialize;

use crate::config::Config;
use crate::ingest::{load_practice, Practice};

/// Per-client document breakdown.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClientStats {
    pub client: String,
    pub documents: usize,
    pub matters: usize,
    pub hours: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorpusStats {
    pub documents: usize,
    pub chunks: usize,
    pub vocabulary: usize,
    pub total_chars: usize,
    pub clients: usize,
    pub matters: usize,
    pub time_entries: usize,
    pub hours: f64,
    pub untagged_documents: usize,
    pub by_client: Vec<ClientStats>,
}

/// Compute statistics, building the index first if needed.
pub fn corpus_stats(practice: &mut Practice) -> CorpusStats {
    practice.refresh_index();
    let reg = &practice.registry;
    let index = practice.session.index();

    let by_client = reg
        .clients()
        .iter()
        .map(|c| ClientStats {
            client: c.name.clone(),
            documents: reg
                .documents()
                .iter()
                .filter(|d| {
                    d.client
                        .as_deref()
                        .is_some_and(|dc| dc.eq_ignore_ascii_case(&c.name))
                })
                .count(),
            matters: reg.matters().iter().filter(|m| m.client.eq_ignore_ascii_case(&c.name)).count(),
            hours: reg
                .time_entries()
                .iter()
                .filter(|t| t.client.eq_ignore_ascii_case(&c.name))
                .map(|t| t.hours)
                .sum(),
        })
        .collect();

    CorpusStats {
        documents: reg.documents().len(),
        chunks: index.chunk_count(),
        vocabulary: index.vocabulary_len(),
        total_chars: practice
            .session
            .signature()
            .map(|s| s.total_chars)
            .unwrap_or(0),
        clients: reg.clients().len(),
        matters: reg.matters().len(),
        time_entries: reg.time_entries().len(),
        hours: reg.total_hours(),
        untagged_documents: reg.documents().iter().filter(|d| d.client.is_none()).count(),
        by_client,
    }
}

/// `brief stats`: print a summary.
pub fn run_stats(config: &Config, json: bool) -> Result<()> {
    let mut practice = load_practice(config)?;
    let stats = corpus_stats(&mut practice);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Brieflens corpus stats");
    println!("======================");
    println!();
    println!("  Documents:    {}", stats.documents);
    println!("  Chunks:       {}", stats.chunks);
    println!("  Vocabulary:   {}", stats.vocabulary);
    println!("  Characters:   {}", stats.total_chars);
    println!();
    println!("  Clients:      {}", stats.clients);
    println!("  Matters:      {}", stats.matters);
    println!("  Time entries: {} ({} hours)", stats.time_entries, stats.hours);

    if !stats.by_client.is_empty() {
        println!();
        println!("  By client:");
        println!(
            "  {:<32} {:>6} {:>8} {:>8}",
            "CLIENT", "DOCS", "MATTERS", "HOURS"
        );
        println!("  {}", "-".repeat(58));
        for c in &stats.by_client {
            println!(
                "  {:<32} {:>6} {:>8} {:>8.2}",
                c.client, c.documents, c.matters, c.hours
            );
        }
        if stats.untagged_documents > 0 {
            println!("  {:<32} {:>6}", "(untagged)", stats.untagged_documents);
        }
    }

    println!();
    Ok(())
}

/// `brief documents`: list every loaded document.
pub fn run_documents(config: &Config) -> Result<()> {
    let practice = load_practice(config)?;
    let docs = practice.registry.documents();
    if docs.is_empty() {
        println!("No documents.");
        return Ok(());
    }
    println!("{:<32} {:<28} {:<28} {:>7}", "DOCUMENT", "CLIENT", "MATTER", "WORDS");
    for d in docs {
        println!(
            "{:<32} {:<28} {:<28} {:>7}",
            d.name,
            d.client.as_deref().unwrap_or("-"),
            d.matter.as_deref().unwrap_or("-"),
            d.text.split_whitespace().count()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceItem;

    #[test]
    fn test_demo_stats() {
        let mut practice = load_practice(&Config::minimal()).unwrap();
        let stats = corpus_stats(&mut practice);
        assert_eq!(stats.documents, 4);
        assert_eq!(stats.chunks, 4);
        assert!(stats.vocabulary > 0);
        assert_eq!(stats.clients, 3);
        assert_eq!(stats.untagged_documents, 1);

        let meridian = stats
            .by_client
            .iter()
            .find(|c| c.client == "Meridian Health Partners")
            .unwrap();
        assert_eq!(meridian.documents, 1);
        assert_eq!(meridian.matters, 2);
        assert!((meridian.hours - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_client_counts_ignore_tag_case() {
        let mut practice = load_practice(&Config::minimal()).unwrap();
        practice
            .add_item(SourceItem {
                source: "filesystem".to_string(),
                source_id: "johnson corporation/Deposition.txt".to_string(),
                title: "Deposition.txt".to_string(),
                client: Some("johnson corporation".to_string()),
                matter: None,
                content_type: "text/plain".to_string(),
                body: "The deposition of Smith is scheduled for May 3.".to_string(),
            })
            .unwrap();

        let stats = corpus_stats(&mut practice);
        assert_eq!(stats.clients, 3);
        let johnson = stats
            .by_client
            .iter()
            .find(|c| c.client == "Johnson Corporation")
            .unwrap();
        assert_eq!(johnson.documents, 2);
        assert_eq!(stats.untagged_documents, 1);
    }

    #[test]
    fn test_empty_practice_stats() {
        let mut cfg = Config::minimal();
        cfg.corpus.seed_demo = false;
        let mut practice = load_practice(&cfg).unwrap();
        let stats = corpus_stats(&mut practice);
        assert_eq!(stats.documents, 0);
        assert_eq!(stats.chunks, 0);
        assert_eq!(stats.vocabulary, 0);
        assert!(stats.by_client.is_empty());
    }
}
