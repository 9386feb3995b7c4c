//! Filesystem corpus source.
//!
//! Walks `[corpus].root` and turns every matching file into a
//! [`SourceItem`]. The directory layout carries the metadata:
//!
//! ```text
//! root/
//! ├── Johnson Corporation/
//! │   ├── Johnson v. Smith/Complaint.pdf   client + matter
//! │   └── Engagement.txt                   client only
//! └── Firm Policies.md                     untagged
//! ```
//!
//! Text files are read as UTF-8; PDF and DOCX go through [`crate::extract`].
//! Files that cannot be read or extracted are skipped with a warning.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Component, Path};
use walkdir::WalkDir;

use crate::config::CorpusConfig;
use crate::extract;
use crate::models::SourceItem;

pub fn scan_filesystem(corpus: &CorpusConfig) -> Result<Vec<SourceItem>> {
    let root = match &corpus.root {
        Some(root) => root,
        None => return Ok(Vec::new()),
    };
    if !root.exists() {
        bail!("corpus root does not exist: {}", root.display());
    }

    let include_set = build_globset(&corpus.include_globs)?;

    let mut excludes = vec!["**/.git/**".to_string(), "**/.*".to_string()];
    excludes.extend(corpus.exclude_globs.iter().cloned());
    let exclude_set = build_globset(&excludes)?;

    let mut items = Vec::new();

    for entry in WalkDir::new(root).follow_links(corpus.follow_symlinks) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        match file_to_source_item(path, relative) {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(e) => tracing::warn!(file = %rel_str, error = %e, "skipping unreadable file"),
        }
    }

    items.sort_by(|a, b| a.source_id.cmp(&b.source_id));
    tracing::info!(root = %root.display(), files = items.len(), "scanned corpus directory");
    Ok(items)
}

/// Client and matter implied by a path relative to the corpus root.
pub fn tags_for_path(relative: &Path) -> (Option<String>, Option<String>) {
    let dirs: Vec<String> = relative
        .parent()
        .map(|p| {
            p.components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    (dirs.first().cloned(), dirs.get(1).cloned())
}

fn file_to_source_item(path: &Path, relative: &Path) -> Result<Option<SourceItem>> {
    let content_type = match extract::content_type_for_path(path) {
        Some(ct) => ct,
        None => {
            tracing::warn!(file = %relative.display(), "skipping file with unsupported extension");
            return Ok(None);
        }
    };

    let body = if extract::is_binary(content_type) {
        let bytes = std::fs::read(path)?;
        extract::extract_text(&bytes, content_type)?
    } else {
        std::fs::read_to_string(path)?
    };

    let title = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let (client, matter) = tags_for_path(relative);

    Ok(Some(SourceItem {
        source: "filesystem".to_string(),
        source_id: relative.to_string_lossy().replace('\\', "/"),
        title,
        client,
        matter,
        content_type: content_type.to_string(),
        body,
    }))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
