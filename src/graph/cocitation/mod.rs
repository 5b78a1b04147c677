//! Co-citation scorer.
//!
//! For a source note `a`, visits every note linking to `a` and scores each
//! other link, embed and tag in that note by how close it sits to the
//! citations of `a` (see [`rules`]). Within one document a target keeps its
//! best score; across documents scores are summed.

pub mod context;
pub mod rules;

use anyhow::Result;
use std::collections::BTreeMap;

use crate::text::round_number;
use crate::vault::{link_path, MetadataStore, NoteCache, Span, MD_EXTENSION};

use super::models::{CoCitation, CoCitationEntry, CoCitationMap, NoteGraph, Settings};
use context::{Candidate, DocumentContext};

/// Per-document running score and evidence, keyed by raw target.
type DocumentScores = BTreeMap<String, (f64, Vec<CoCitation>)>;

/// Split the references of `pre` into citations of `a` and other candidates.
async fn resolve_references(
    store: &dyn MetadataStore,
    settings: &Settings,
    cache: &NoteCache,
    pre: &str,
    a: &str,
) -> Result<(Vec<Span>, Vec<Candidate>)> {
    let mut own_spans: Vec<Span> = Vec::new();
    let mut candidates: Vec<Candidate> = Vec::new();
    for link in cache.references() {
        let target = match store.resolve_link(&link.link, pre).await? {
            Some(path) => {
                let markdown = store
                    .extension_of(&path)
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(MD_EXTENSION));
                if !settings.all_file_extensions && !markdown {
                    continue;
                }
                path
            }
            None => link_path(&link.link).to_string(),
        };
        if target == a {
            own_spans.push(link.span);
        } else if !target.is_empty() {
            candidates.push(Candidate {
                target,
                span: link.span,
            });
        }
    }
    Ok((own_spans, candidates))
}

/// Co-citation scores of every note cited alongside `a`.
///
/// The result always holds `a` itself with measure `0` and no evidence.
pub async fn co_citations(
    graph: &NoteGraph,
    store: &dyn MetadataStore,
    settings: &Settings,
    a: &str,
) -> Result<CoCitationMap> {
    let mut results = CoCitationMap::new();

    for pre in graph.in_neighbors(a) {
        let cache = match store.file_cache(&pre).await {
            Ok(Some(cache)) => cache,
            Ok(None) => {
                tracing::debug!(document = %pre, "No structural cache, skipping");
                continue;
            }
            Err(e) => {
                tracing::warn!(document = %pre, error = %e, "Failed to load structural cache, skipping");
                continue;
            }
        };
        let text = match store.read(&pre).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(document = %pre, error = %e, "Failed to read note, skipping");
                continue;
            }
        };

        // Resolve every reference up front; scoring itself is synchronous
        let (own_spans, mut candidates) =
            match resolve_references(store, settings, &cache, &pre, a).await {
                Ok(resolved) => resolved,
                Err(e) => {
                    tracing::warn!(document = %pre, error = %e, "Failed to resolve links, skipping");
                    continue;
                }
            };
        if settings.co_tags {
            candidates.extend(cache.tags.iter().map(|tag| Candidate {
                target: tag.tag.clone(),
                span: tag.span,
            }));
        }

        let Some(ctx) = DocumentContext::new(&pre, &text, &cache, &own_spans) else {
            tracing::debug!(document = %pre, "No citation of source found, skipping");
            continue;
        };

        let mut scores = DocumentScores::new();
        for candidate in &candidates {
            let entry = scores
                .entry(candidate.target.clone())
                .or_insert_with(|| (0.0, Vec::new()));
            for scored in rules::score(candidate, &ctx) {
                entry.0 = entry.0.max(scored.measure);
                entry.1.push(CoCitation {
                    sentence: scored.sentence,
                    measure: scored.measure,
                    source: pre.clone(),
                    line: scored.line,
                });
            }
        }

        if settings.co_tags {
            for tag in cache.all_tags() {
                if scores.contains_key(&tag) {
                    continue;
                }
                let evidence = CoCitation {
                    sentence: vec![String::new(), tag.clone(), String::new()],
                    measure: ctx.min_score,
                    source: pre.clone(),
                    line: 0,
                };
                scores.insert(tag, (ctx.min_score, vec![evidence]));
            }
        }

        tracing::debug!(
            document = %pre,
            own_links = ctx.own_links.len(),
            targets = scores.len(),
            "Co-citations scored"
        );
        merge(&mut results, scores, store, settings).await?;
    }

    for entry in results.values_mut() {
        entry.measure = round_number(entry.measure);
    }
    results.insert(
        a.to_string(),
        CoCitationEntry {
            measure: 0.0,
            co_citations: Vec::new(),
            resolved: true,
        },
    );
    Ok(results)
}

/// Fold one document's scores into the global result under canonical names.
async fn merge(
    results: &mut CoCitationMap,
    scores: DocumentScores,
    store: &dyn MetadataStore,
    settings: &Settings,
) -> Result<()> {
    for (key, (measure, evidence)) in scores {
        let (name, resolved) = match store.resolve_link(&key, "").await? {
            Some(path) => (path, true),
            None if key.starts_with('#') => (key, true),
            None if settings.add_unresolved => (format!("{}.{}", key, MD_EXTENSION), false),
            None => continue,
        };

        let entry = results.entry(name).or_insert_with(|| CoCitationEntry {
            measure: 0.0,
            co_citations: Vec::new(),
            resolved,
        });
        entry.measure += measure;
        entry.co_citations.extend(evidence);
    }
    Ok(())
}
