//! MetadataStore trait and the shared metadata snapshot.
//!
//! A store answers the engine's read-only questions about the vault: link
//! adjacency, per-note tags, structural caches, raw text, and link
//! resolution. [`VaultSnapshot`] holds the derived metadata both store
//! implementations compute on `refresh`.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

use super::models::{self, LinkAdjacency, NoteCache};
use super::parser::parse_note;
use super::resolver::{link_path, LinkResolver};

/// Read-only metadata interface consumed by the graph engine.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Re-derive all metadata from the underlying notes
    async fn refresh(&self) -> Result<()>;

    /// All known file paths, notes and attachments
    async fn files(&self) -> Result<Vec<String>>;

    /// source → resolved destination path → count
    async fn resolved_links(&self) -> Result<LinkAdjacency>;

    /// source → unresolved link path → count
    async fn unresolved_links(&self) -> Result<LinkAdjacency>;

    /// Frontmatter and inline tags of a note (empty for unknown paths)
    async fn note_tags(&self, path: &str) -> Result<Vec<String>>;

    /// Structural cache of a markdown note
    async fn file_cache(&self, path: &str) -> Result<Option<NoteCache>>;

    /// Raw text of a note
    async fn read(&self, path: &str) -> Result<String>;

    /// Resolve a link written in `source` to a file path
    async fn resolve_link(&self, link: &str, source: &str) -> Result<Option<String>>;

    /// File extension of a path, without the dot
    fn extension_of<'a>(&self, path: &'a str) -> Option<&'a str> {
        models::extension_of(path)
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Metadata derived from one pass over the vault.
#[derive(Debug, Clone, Default)]
pub struct VaultSnapshot {
    pub resolver: LinkResolver,
    pub caches: HashMap<String, NoteCache>,
    pub tags: HashMap<String, Vec<String>>,
    pub resolved: LinkAdjacency,
    pub unresolved: LinkAdjacency,
}

impl VaultSnapshot {
    /// Build from `(path, text)` pairs; `None` text marks a non-markdown file.
    pub fn build<'a, I>(files: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let files: Vec<(&str, Option<&str>)> = files.into_iter().collect();
        let mut snapshot = Self {
            resolver: LinkResolver::new(files.iter().map(|(p, _)| p.to_string())),
            ..Default::default()
        };

        for (path, text) in &files {
            let Some(text) = text else { continue };
            let cache = parse_note(text);
            snapshot.tags.insert(path.to_string(), cache.all_tags());
            // Notes without links still become graph nodes
            snapshot.resolved.entry(path.to_string()).or_default();
            for link in cache.references() {
                let target = link_path(&link.link);
                if target.is_empty() {
                    continue;
                }
                let (map, dest) = match snapshot.resolver.resolve(&link.link, path) {
                    Some(dest) => (&mut snapshot.resolved, dest),
                    None => (&mut snapshot.unresolved, target.to_string()),
                };
                *map.entry(path.to_string())
                    .or_default()
                    .entry(dest)
                    .or_insert(0) += 1;
            }
            snapshot.caches.insert(path.to_string(), cache);
        }

        tracing::debug!(
            files = files.len(),
            notes = snapshot.caches.len(),
            "Vault snapshot built"
        );
        snapshot
    }

    /// All file paths in lexicographic order.
    pub fn files(&self) -> Vec<String> {
        self.resolver.paths().map(str::to_string).collect()
    }
}
