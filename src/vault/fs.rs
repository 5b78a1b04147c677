//! Filesystem-backed vault.
//!
//! Walks a directory tree, parses every markdown note and registers every
//! other file as an attachment. Hidden files and directories are skipped.
//! Paths are stored relative to the root with `/` separators.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use walkdir::{DirEntry, WalkDir};

use super::models::{is_markdown, LinkAdjacency, NoteCache};
use super::store::{MetadataStore, VaultSnapshot};

pub struct FsVault {
    root: PathBuf,
    snapshot: RwLock<Arc<VaultSnapshot>>,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            snapshot: RwLock::new(Arc::new(VaultSnapshot::default())),
        }
    }

    /// Vault-relative paths of every visible file under the root.
    fn scan(&self) -> Vec<String> {
        let mut paths: Vec<String> = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let rel = e.path().strip_prefix(&self.root).ok()?;
                Some(
                    rel.components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/"),
                )
            })
            .collect();
        paths.sort();
        paths
    }

    async fn current(&self) -> Arc<VaultSnapshot> {
        self.snapshot.read().await.clone()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

#[async_trait]
impl MetadataStore for FsVault {
    async fn refresh(&self) -> Result<()> {
        let paths = self.scan();
        let mut texts: Vec<(String, Option<String>)> = Vec::with_capacity(paths.len());
        for path in paths {
            let text = if is_markdown(&path) {
                let full = self.root.join(&path);
                let text = tokio::fs::read_to_string(&full)
                    .await
                    .with_context(|| format!("Failed to read {}", full.display()))?;
                Some(text)
            } else {
                None
            };
            texts.push((path, text));
        }

        let snapshot =
            VaultSnapshot::build(texts.iter().map(|(p, t)| (p.as_str(), t.as_deref())));
        tracing::info!(
            root = %self.root.display(),
            files = texts.len(),
            "Vault scanned"
        );
        *self.snapshot.write().await = Arc::new(snapshot);
        Ok(())
    }

    async fn files(&self) -> Result<Vec<String>> {
        Ok(self.current().await.files())
    }

    async fn resolved_links(&self) -> Result<LinkAdjacency> {
        Ok(self.current().await.resolved.clone())
    }

    async fn unresolved_links(&self) -> Result<LinkAdjacency> {
        Ok(self.current().await.unresolved.clone())
    }

    async fn note_tags(&self, path: &str) -> Result<Vec<String>> {
        Ok(self
            .current()
            .await
            .tags
            .get(path)
            .cloned()
            .unwrap_or_default())
    }

    async fn file_cache(&self, path: &str) -> Result<Option<NoteCache>> {
        Ok(self.current().await.caches.get(path).cloned())
    }

    async fn read(&self, path: &str) -> Result<String> {
        let full = self.root.join(path);
        tokio::fs::read_to_string(&full)
            .await
            .with_context(|| format!("Failed to read {}", full.display()))
    }

    async fn resolve_link(&self, link: &str, source: &str) -> Result<Option<String>> {
        Ok(self.current().await.resolver.resolve(link, source))
    }
}
