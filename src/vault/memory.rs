//! In-memory vault.
//!
//! Notes are seeded with [`MemoryVault::add_note`] and attachments with
//! [`MemoryVault::add_file`]; metadata is re-derived on `refresh`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::{is_markdown, LinkAdjacency, NoteCache};
use super::store::{MetadataStore, VaultSnapshot};

/// Vault whose files live in memory.
///
/// ```
/// use note_graph_analysis::vault::{MemoryVault, MetadataStore};
/// # tokio_test::block_on(async {
/// let vault = MemoryVault::new();
/// vault.add_note("a.md", "See [[b]]").await;
/// vault.add_note("b.md", "").await;
/// vault.refresh().await.unwrap();
/// assert_eq!(vault.resolved_links().await.unwrap()["a.md"]["b.md"], 1);
/// # });
/// ```
#[derive(Default)]
pub struct MemoryVault {
    /// path → text (`None` for attachments)
    files: RwLock<BTreeMap<String, Option<String>>>,
    snapshot: RwLock<Arc<VaultSnapshot>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a note. Non-markdown paths are stored as text too.
    pub async fn add_note(&self, path: impl Into<String>, text: impl Into<String>) {
        self.files
            .write()
            .await
            .insert(path.into(), Some(text.into()));
    }

    /// Register an attachment with no readable text.
    pub async fn add_file(&self, path: impl Into<String>) {
        self.files.write().await.insert(path.into(), None);
    }

    pub async fn remove(&self, path: &str) -> bool {
        self.files.write().await.remove(path).is_some()
    }

    async fn current(&self) -> Arc<VaultSnapshot> {
        self.snapshot.read().await.clone()
    }
}

#[async_trait]
impl MetadataStore for MemoryVault {
    async fn refresh(&self) -> Result<()> {
        let files = self.files.read().await;
        let snapshot = VaultSnapshot::build(files.iter().map(|(path, text)| {
            // Only markdown text is parsed for structure
            let text = text.as_deref().filter(|_| is_markdown(path));
            (path.as_str(), text)
        }));
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
        self.files
            .read()
            .await
            .get(path)
            .cloned()
            .flatten()
            .ok_or_else(|| anyhow!("No readable note at {}", path))
    }

    async fn resolve_link(&self, link: &str, source: &str) -> Result<Option<String>> {
        Ok(self.current().await.resolver.resolve(link, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refresh_derives_metadata() {
        let vault = MemoryVault::new();
        vault.add_note("a.md", "Links [[b]] and [[missing]] #tag").await;
        vault.add_note("b.md", "nothing").await;
        vault.add_file("img.png").await;

        // Nothing derived before the first refresh
        assert!(vault.resolved_links().await.unwrap().is_empty());

        vault.refresh().await.unwrap();
        let resolved = vault.resolved_links().await.unwrap();
        assert_eq!(resolved["a.md"]["b.md"], 1);
        let unresolved = vault.unresolved_links().await.unwrap();
        assert_eq!(unresolved["a.md"]["missing"], 1);
        assert_eq!(vault.note_tags("a.md").await.unwrap(), vec!["#tag"]);
        assert!(vault.note_tags("nope.md").await.unwrap().is_empty());
        assert!(vault.file_cache("a.md").await.unwrap().is_some());
        assert!(vault.file_cache("img.png").await.unwrap().is_none());
        assert_eq!(vault.files().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_read_and_resolve() {
        let vault = MemoryVault::new();
        vault.add_note("dir/a.md", "text").await;
        vault.add_file("img.png").await;
        vault.refresh().await.unwrap();

        assert_eq!(vault.read("dir/a.md").await.unwrap(), "text");
        assert!(vault.read("img.png").await.is_err());
        assert!(vault.read("nope.md").await.is_err());
        assert_eq!(
            vault.resolve_link("a", "x.md").await.unwrap().as_deref(),
            Some("dir/a.md")
        );
        assert_eq!(vault.extension_of("dir/a.md"), Some("md"));
    }

    #[tokio::test]
    async fn test_remove_then_refresh() {
        let vault = MemoryVault::new();
        vault.add_note("a.md", "[[b]]").await;
        vault.add_note("b.md", "").await;
        vault.refresh().await.unwrap();
        assert!(vault.remove("b.md").await);
        vault.refresh().await.unwrap();
        assert!(vault.resolved_links().await.unwrap()["a.md"].is_empty());
        assert_eq!(vault.unresolved_links().await.unwrap()["a.md"]["b"], 1);
    }
}
