//! Result ranking and presentation.
//!
//! Turns raw algorithm output into the ordered rows a view shows for one
//! source note, applies the display filters from [`Settings`], and renders
//! algorithm names and notices as user-facing text.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::graph::{Algorithm, AlgorithmOutput, NoteGraph, Notice, Settings};
use crate::text::round_number;

/// Sort direction for the measure column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Descending,
    Ascending,
}

/// One row of a ranked result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub to: String,
    pub measure: f64,
    /// Source and target are linked in either direction
    pub linked: bool,
    pub resolved: bool,
    /// Evidence: shared neighbours, triangles, or co-citation sentences
    pub extra: Vec<String>,
}

/// Rank score-shaped output and co-citations for `source`.
///
/// Community outputs have no per-node measure and yield no rows; use
/// [`community_members`] for those.
pub fn rank(
    graph: &NoteGraph,
    source: &str,
    output: &AlgorithmOutput,
    settings: &Settings,
    order: SortOrder,
) -> Vec<RankedResult> {
    let row = |to: &str, measure: f64, resolved: bool, extra: Vec<String>| RankedResult {
        to: to.to_string(),
        measure,
        linked: graph.is_linked(source, to),
        resolved,
        extra,
    };

    let rows: Vec<RankedResult> = match output {
        AlgorithmOutput::Scores(map) => map
            .iter()
            .map(|(to, entry)| row(to, entry.measure, graph.is_resolved(to), entry.extra.clone()))
            .collect(),
        AlgorithmOutput::Hits(hits) => hits
            .authorities
            .iter()
            .map(|(to, authority)| {
                let hub = hits.hubs.get(to).copied().unwrap_or(0.0);
                row(
                    to,
                    *authority,
                    graph.is_resolved(to),
                    vec![format!("hub: {}", round_number(hub))],
                )
            })
            .collect(),
        AlgorithmOutput::CoCitations(map) => map
            .iter()
            .map(|(to, entry)| {
                let extra = entry
                    .co_citations
                    .iter()
                    .map(|c| c.sentence.concat())
                    .collect();
                row(to, entry.measure, entry.resolved, extra)
            })
            .collect(),
        AlgorithmOutput::Communities(_) | AlgorithmOutput::Members(_) => Vec::new(),
    };

    let mut rows: Vec<RankedResult> = rows
        .into_iter()
        .filter(|r| r.to != source)
        .filter(|r| !(settings.exclude_zero && r.measure == 0.0))
        .filter(|r| !(settings.exclude_infinity && !r.measure.is_finite()))
        .filter(|r| !(settings.exclude_linked && r.linked))
        .collect();

    rows.sort_by(|a, b| {
        let by_measure = match order {
            SortOrder::Descending => b.measure.total_cmp(&a.measure),
            SortOrder::Ascending => a.measure.total_cmp(&b.measure),
        };
        by_measure
            .then_with(|| b.extra.len().cmp(&a.extra.len()))
            .then_with(|| a.to.cmp(&b.to))
    });
    rows
}

/// Members of the community containing `source`, or empty for non-community output.
pub fn community_members(output: &AlgorithmOutput, source: &str) -> Vec<String> {
    match output {
        AlgorithmOutput::Members(members) => members.clone(),
        AlgorithmOutput::Communities(communities) => communities
            .values()
            .find(|members| members.iter().any(|m| m == source))
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Algorithm name as shown to the user, honouring renames as `Custom (Original)`.
pub fn display_name(algorithm: Algorithm, settings: &Settings) -> String {
    match settings.algorithm_renames.get(&algorithm) {
        Some(custom) if !custom.trim().is_empty() && custom != algorithm.name() => {
            format!("{} ({})", custom.trim(), algorithm.name())
        }
        _ => algorithm.name().to_string(),
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NodeNotFound { node } => write!(f, "Node \"{}\" not found in the graph.", node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{
        CoCitation, CoCitationEntry, CoCitationMap, HitsResult, LinkEdge, MeasureEntry, ResultMap,
    };
    use std::collections::BTreeMap;

    fn graph() -> NoteGraph {
        let mut g = NoteGraph::new();
        for id in ["a.md", "b.md", "c.md", "ghost.md"] {
            g.add_node(id);
        }
        g.add_edge("a.md", "b.md", LinkEdge { resolved: true });
        g.add_edge("c.md", "ghost.md", LinkEdge { resolved: false });
        g
    }

    fn scores(pairs: &[(&str, f64, usize)]) -> AlgorithmOutput {
        let map: ResultMap = pairs
            .iter()
            .map(|(id, m, n)| {
                (
                    id.to_string(),
                    MeasureEntry {
                        measure: *m,
                        extra: vec!["x".to_string(); *n],
                    },
                )
            })
            .collect();
        AlgorithmOutput::Scores(map)
    }

    fn ids(rows: &[RankedResult]) -> Vec<&str> {
        rows.iter().map(|r| r.to.as_str()).collect()
    }

    #[test]
    fn test_sort_and_tie_breaks() {
        let out = scores(&[
            ("a.md", 1.0, 0),
            ("b.md", 0.5, 1),
            ("c.md", 0.5, 2),
            ("ghost.md", 0.5, 2),
        ]);
        let rows = rank(&graph(), "a.md", &out, &Settings::default(), SortOrder::Descending);
        assert_eq!(ids(&rows), vec!["c.md", "ghost.md", "b.md"]);

        let rows = rank(&graph(), "a.md", &out, &Settings::default(), SortOrder::Ascending);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].measure, 0.5);
    }

    #[test]
    fn test_filters() {
        let out = scores(&[
            ("b.md", 0.0, 0),
            ("c.md", f64::INFINITY, 0),
            ("ghost.md", 0.2, 0),
        ]);
        let rows = rank(&graph(), "a.md", &out, &Settings::default(), SortOrder::Descending);
        assert_eq!(ids(&rows), vec!["ghost.md"]);
        assert!(!rows[0].resolved);
        assert!(!rows[0].linked);

        let keep_all = Settings {
            exclude_zero: false,
            exclude_infinity: false,
            ..Default::default()
        };
        let rows = rank(&graph(), "a.md", &out, &keep_all, SortOrder::Descending);
        assert_eq!(ids(&rows), vec!["c.md", "ghost.md", "b.md"]);
        assert!(rows[2].linked);

        let unlinked = Settings {
            exclude_zero: false,
            exclude_linked: true,
            ..Default::default()
        };
        let rows = rank(&graph(), "a.md", &out, &unlinked, SortOrder::Descending);
        assert!(!ids(&rows).contains(&"b.md"));
    }

    #[test]
    fn test_co_citation_rows() {
        let mut map = CoCitationMap::new();
        map.insert(
            "ghost.md".into(),
            CoCitationEntry {
                measure: 1.0,
                co_citations: vec![CoCitation {
                    sentence: vec!["see ".into(), "[[ghost]]".into(), "".into()],
                    measure: 1.0,
                    source: "c.md".into(),
                    line: 0,
                }],
                resolved: false,
            },
        );
        map.insert("a.md".into(), CoCitationEntry::default());
        let rows = rank(
            &graph(),
            "a.md",
            &AlgorithmOutput::CoCitations(map),
            &Settings::default(),
            SortOrder::Descending,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].extra, vec!["see [[ghost]]"]);
        assert!(!rows[0].resolved);
    }

    #[test]
    fn test_hits_rank_by_authority() {
        let hits = HitsResult {
            hubs: BTreeMap::from([("a.md".into(), 0.7), ("b.md".into(), 0.3)]),
            authorities: BTreeMap::from([("a.md".into(), 0.0), ("b.md".into(), 1.0)]),
        };
        let rows = rank(
            &graph(),
            "c.md",
            &AlgorithmOutput::Hits(hits),
            &Settings::default(),
            SortOrder::Descending,
        );
        assert_eq!(ids(&rows), vec!["b.md"]);
        assert_eq!(rows[0].extra, vec!["hub: 0.3"]);
    }

    #[test]
    fn test_community_members() {
        let communities = BTreeMap::from([
            ("x".to_string(), vec!["a.md".to_string(), "b.md".to_string()]),
            ("y".to_string(), vec!["c.md".to_string()]),
        ]);
        let out = AlgorithmOutput::Communities(communities);
        assert_eq!(community_members(&out, "b.md"), vec!["a.md", "b.md"]);
        assert!(community_members(&out, "zzz.md").is_empty());
        assert!(rank(&graph(), "a.md", &out, &Settings::default(), SortOrder::Descending).is_empty());
    }

    #[test]
    fn test_display_name_and_notice() {
        let mut settings = Settings::default();
        assert_eq!(display_name(Algorithm::AdamicAdar, &settings), "Adamic Adar");
        settings
            .algorithm_renames
            .insert(Algorithm::AdamicAdar, "Predict".into());
        assert_eq!(
            display_name(Algorithm::AdamicAdar, &settings),
            "Predict (Adamic Adar)"
        );

        let notice = Notice::NodeNotFound {
            node: "x.md".into(),
        };
        assert_eq!(notice.to_string(), "Node \"x.md\" not found in the graph.");
    }
}
