//! Vault metadata → petgraph construction.
//!
//! Builds the directed note graph from resolved and unresolved link
//! adjacency, applying the inclusion filters from [`Settings`]:
//!
//! - **Tags**: a note carrying an excluded tag is dropped
//! - **Regex**: a note whose ID matches the exclusion pattern is dropped
//! - **Extension**: non-markdown notes are dropped unless all extensions are allowed
//!
//! Unresolved sources pass the same filters as any note. Unresolved targets
//! become `<name>.md` nodes and are only checked against the regex, since
//! there is no file to read tags or an extension from.
//! Sources and destinations are visited in lexicographic order so node
//! insertion order is reproducible.

use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::vault::{is_markdown, LinkAdjacency, MetadataStore, MD_EXTENSION};

use super::models::{LinkEdge, NoteGraph, Settings};

/// Note ID → tags (`#tag` form).
pub type NoteTags = HashMap<String, Vec<String>>;

/// Inclusion policy compiled once per build.
struct Inclusion {
    regex: Option<Regex>,
    tags: Vec<String>,
    all_extensions: bool,
}

impl Inclusion {
    fn new(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            regex: settings.exclusion_matcher()?,
            tags: settings.normalized_exclusion_tags(),
            all_extensions: settings.all_file_extensions,
        })
    }

    fn tag_ok(&self, node: &str, tags: &NoteTags) -> bool {
        self.tags.is_empty()
            || tags
                .get(node)
                .is_none_or(|note_tags| !note_tags.iter().any(|t| self.tags.contains(t)))
    }

    fn regex_ok(&self, node: &str) -> bool {
        self.regex.as_ref().is_none_or(|re| !re.is_match(node))
    }

    fn ext_ok(&self, node: &str) -> bool {
        self.all_extensions || is_markdown(node)
    }

    fn includes(&self, node: &str, tags: &NoteTags) -> bool {
        self.tag_ok(node, tags) && self.regex_ok(node) && self.ext_ok(node)
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&String> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    keys
}

/// Build the note graph. Fails only on an invalid exclusion regex.
pub fn build_graph(
    resolved: &LinkAdjacency,
    unresolved: &LinkAdjacency,
    tags: &NoteTags,
    settings: &Settings,
) -> Result<NoteGraph, ConfigError> {
    let inclusion = Inclusion::new(settings)?;
    let mut graph = NoteGraph::new();

    for source in sorted_keys(resolved) {
        if !inclusion.includes(source, tags) {
            continue;
        }
        graph.add_node(source);
        for dest in sorted_keys(&resolved[source]) {
            if inclusion.includes(dest, tags) {
                graph.add_node(dest);
                graph.add_edge(source, dest, LinkEdge { resolved: true });
            }
        }
    }

    if settings.add_unresolved {
        for source in sorted_keys(unresolved) {
            if !inclusion.includes(source, tags) {
                continue;
            }
            graph.add_node(source);
            for dest in sorted_keys(&unresolved[source]) {
                let dest_md = format!("{}.{}", dest, MD_EXTENSION);
                if inclusion.regex_ok(&dest_md) {
                    graph.add_node(&dest_md);
                    graph.add_edge(source, &dest_md, LinkEdge { resolved: false });
                }
            }
        }
    }

    Ok(graph)
}

/// Builds note graphs from a [`MetadataStore`].
pub struct GraphBuilder {
    store: Arc<dyn MetadataStore>,
}

impl GraphBuilder {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Fetch adjacency and tags from the store and build the graph.
    ///
    /// The store is read as-is; call `refresh` on it first for fresh data.
    pub async fn build(&self, settings: &Settings) -> Result<NoteGraph> {
        let resolved = self.store.resolved_links().await?;
        let unresolved = self.store.unresolved_links().await?;

        let mut tags = NoteTags::new();
        if !settings.exclusion_tags.is_empty() {
            let mut notes: Vec<&String> = resolved.keys().chain(unresolved.keys()).collect();
            notes.extend(resolved.values().flat_map(|dests| dests.keys()));
            notes.sort();
            notes.dedup();
            for note in notes {
                tags.insert(note.clone(), self.store.note_tags(note).await?);
            }
        }

        let graph = build_graph(&resolved, &unresolved, &tags, settings)?;
        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Note graph built"
        );
        Ok(graph)
    }
}
