//! Graph analysis data models.
//!
//! ## Graph structure
//! - [`NoteNode`] / [`LinkEdge`]: a note and a link between two notes
//! - [`NoteGraph`]: petgraph wrapper with ID ↔ NodeIndex mapping
//!
//! ## Results
//! - [`MeasureEntry`] / [`ResultMap`]: per-node score with evidence
//! - [`CoCitation`] / [`CoCitationEntry`] / [`CoCitationMap`]: text-proximity results
//! - [`Communities`], [`HitsResult`]: community and link-analysis outputs
//! - [`AlgorithmOutput`] / [`AnalysisReport`]: one algorithm invocation
//!
//! ## Configuration
//! - [`Algorithm`]: closed registry of algorithm kinds
//! - [`Settings`] / [`AlgorithmParams`]: engine configuration and per-run overrides

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::Direction;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

use crate::error::ConfigError;
use crate::vault::normalize_tag;

// ============================================================================
// Graph structure
// ============================================================================

/// A note (or unresolved link target) in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteNode {
    /// Vault path, or `<name>.md` for unresolved targets
    pub id: String,
    /// Insertion order, assigned at first appearance
    pub order: usize,
}

/// A directed link between two notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEdge {
    /// Whether the target exists as a real file
    pub resolved: bool,
}

/// Wrapper around `petgraph::DiGraph` with ID ↔ NodeIndex mapping.
///
/// Nodes are unique by ID and edges unique per ordered pair: adding an
/// existing edge updates its weight instead of creating a parallel edge.
#[derive(Debug, Clone, Default)]
pub struct NoteGraph {
    pub graph: DiGraph<NoteNode, LinkEdge>,
    pub id_to_index: HashMap<String, NodeIndex>,
}

impl NoteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node if absent. Returns its index either way.
    pub fn add_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.id_to_index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(NoteNode {
            id: id.to_string(),
            order: self.graph.node_count(),
        });
        self.id_to_index.insert(id.to_string(), idx);
        idx
    }

    /// Add or update the edge `from → to`. Returns `None` if either node is missing.
    pub fn add_edge(&mut self, from: &str, to: &str, edge: LinkEdge) -> Option<EdgeIndex> {
        let from_idx = *self.id_to_index.get(from)?;
        let to_idx = *self.id_to_index.get(to)?;
        Some(self.graph.update_edge(from_idx, to_idx, edge))
    }

    pub fn get_node(&self, id: &str) -> Option<&NoteNode> {
        let idx = self.id_to_index.get(id)?;
        self.graph.node_weight(*idx)
    }

    pub fn get_index(&self, id: &str) -> Option<NodeIndex> {
        self.id_to_index.get(id).copied()
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.id_to_index.contains_key(id)
    }

    pub fn get_edge(&self, from: &str, to: &str) -> Option<LinkEdge> {
        let edge = self.graph.find_edge(self.get_index(from)?, self.get_index(to)?)?;
        self.graph.edge_weight(edge).copied()
    }

    /// All node IDs in insertion order.
    pub fn node_ids(&self) -> Vec<String> {
        self.graph
            .node_indices()
            .map(|idx| self.graph[idx].id.clone())
            .collect()
    }

    /// Undirected neighbourhood (in ∪ out), each node once, in insertion order.
    /// Empty for unknown nodes.
    pub fn neighbors(&self, id: &str) -> Vec<String> {
        let Some(idx) = self.get_index(id) else {
            return vec![];
        };
        let mut seen = HashSet::new();
        let mut out: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .chain(self.graph.neighbors_directed(idx, Direction::Incoming))
            .filter(|n| seen.insert(*n))
            .collect();
        out.sort_by_key(|n| self.graph[*n].order);
        out.into_iter().map(|n| self.graph[n].id.clone()).collect()
    }

    /// Nodes linking to `id`, in insertion order. Empty for unknown nodes.
    pub fn in_neighbors(&self, id: &str) -> Vec<String> {
        let Some(idx) = self.get_index(id) else {
            return vec![];
        };
        let mut out: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .collect();
        out.sort_by_key(|n| self.graph[*n].order);
        out.into_iter().map(|n| self.graph[n].id.clone()).collect()
    }

    /// Number of outgoing edges. Zero for unknown nodes.
    pub fn out_degree(&self, id: &str) -> usize {
        self.get_index(id)
            .map(|idx| self.graph.neighbors_directed(idx, Direction::Outgoing).count())
            .unwrap_or(0)
    }

    /// Whether an edge exists between `a` and `b` in either direction.
    pub fn is_linked(&self, a: &str, b: &str) -> bool {
        match (self.get_index(a), self.get_index(b)) {
            (Some(x), Some(y)) => self.graph.contains_edge(x, y) || self.graph.contains_edge(y, x),
            _ => false,
        }
    }

    /// A node is unresolved when it has incoming edges and none of them resolve.
    pub fn is_resolved(&self, id: &str) -> bool {
        let Some(idx) = self.get_index(id) else {
            return false;
        };
        let mut incoming = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| e.weight().resolved)
            .peekable();
        incoming.peek().is_none() || incoming.any(|resolved| resolved)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

// ============================================================================
// Results
// ============================================================================

/// Score for one target node plus supporting evidence (shared neighbours, triangles).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasureEntry {
    pub measure: f64,
    pub extra: Vec<String>,
}

/// Target node → score. Contains every node of the graph.
pub type ResultMap = BTreeMap<String, MeasureEntry>;

/// One piece of co-citation evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoCitation {
    /// Line text split around the matched span (3 or 5 parts)
    pub sentence: Vec<String>,
    pub measure: f64,
    /// Note the evidence was found in
    pub source: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoCitationEntry {
    pub measure: f64,
    pub co_citations: Vec<CoCitation>,
    pub resolved: bool,
}

/// Target (path or `#tag`) → aggregated co-citation.
pub type CoCitationMap = BTreeMap<String, CoCitationEntry>;

/// Community label → members.
pub type Communities = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitsResult {
    pub hubs: BTreeMap<String, f64>,
    pub authorities: BTreeMap<String, f64>,
}

/// Raw output of one algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum AlgorithmOutput {
    Scores(ResultMap),
    Hits(HitsResult),
    CoCitations(CoCitationMap),
    Communities(Communities),
    /// Members of the source node's community
    Members(Vec<String>),
}

/// Non-fatal condition raised while running an algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    NodeNotFound { node: String },
}

/// Result of one algorithm invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub algorithm: Algorithm,
    pub source: String,
    pub output: AlgorithmOutput,
    pub notices: Vec<Notice>,
    pub node_count: usize,
    pub edge_count: usize,
    pub computation_ms: u64,
    pub computed_at: chrono::DateTime<chrono::Utc>,
}

// ============================================================================
// Algorithm registry
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Algorithm {
    Jaccard,
    Overlap,
    AdamicAdar,
    CommonNeighbours,
    Hits,
    PageRank,
    BetweennessCentrality,
    CoCitations,
    LabelPropagation,
    Louvain,
    ClusteringCoefficient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgorithmCategory {
    Similarity,
    LinkPrediction,
    Centrality,
    CommunityDetection,
    CoCitations,
}

impl std::fmt::Display for AlgorithmCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Similarity => write!(f, "Similarity"),
            Self::LinkPrediction => write!(f, "Link Prediction"),
            Self::Centrality => write!(f, "Centrality"),
            Self::CommunityDetection => write!(f, "Community Detection"),
            Self::CoCitations => write!(f, "Co-Citations"),
        }
    }
}

impl Algorithm {
    pub const ALL: [Algorithm; 11] = [
        Algorithm::CoCitations,
        Algorithm::Hits,
        Algorithm::PageRank,
        Algorithm::BetweennessCentrality,
        Algorithm::AdamicAdar,
        Algorithm::CommonNeighbours,
        Algorithm::Jaccard,
        Algorithm::Overlap,
        Algorithm::LabelPropagation,
        Algorithm::Louvain,
        Algorithm::ClusteringCoefficient,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Jaccard => "Jaccard",
            Self::Overlap => "Overlap",
            Self::AdamicAdar => "Adamic Adar",
            Self::CommonNeighbours => "Common Neighbours",
            Self::Hits => "HITS",
            Self::PageRank => "PageRank",
            Self::BetweennessCentrality => "Betweenness Centrality",
            Self::CoCitations => "Co-Citations",
            Self::LabelPropagation => "Label Propagation",
            Self::Louvain => "Louvain",
            Self::ClusteringCoefficient => "Clustering Coefficient",
        }
    }

    pub fn category(&self) -> AlgorithmCategory {
        match self {
            Self::Jaccard | Self::Overlap => AlgorithmCategory::Similarity,
            Self::AdamicAdar | Self::CommonNeighbours => AlgorithmCategory::LinkPrediction,
            Self::Hits | Self::PageRank | Self::BetweennessCentrality => {
                AlgorithmCategory::Centrality
            }
            Self::LabelPropagation | Self::Louvain | Self::ClusteringCoefficient => {
                AlgorithmCategory::CommunityDetection
            }
            Self::CoCitations => AlgorithmCategory::CoCitations,
        }
    }

    /// Whether the result covers the whole graph rather than the source note.
    pub fn is_global(&self) -> bool {
        matches!(
            self,
            Self::Hits
                | Self::PageRank
                | Self::BetweennessCentrality
                | Self::LabelPropagation
                | Self::ClusteringCoefficient
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Jaccard => "Shared neighbours divided by the union of both neighbourhoods",
            Self::Overlap => "Like Jaccard, but divided by the smaller neighbourhood",
            Self::AdamicAdar => "Predicts links from shared neighbours, weighting rare ones higher",
            Self::CommonNeighbours => "Counts the neighbours two notes share",
            Self::Hits => "Hubs link out to many notes, authorities receive many links",
            Self::PageRank => "Ranks notes by the number and quality of incoming links",
            Self::BetweennessCentrality => {
                "How often a note lies on shortest paths between other notes"
            }
            Self::CoCitations => "Notes most often referenced close to this one",
            Self::LabelPropagation => "Groups notes by repeatedly adopting the commonest neighbour label",
            Self::Louvain => "The modularity community containing this note",
            Self::ClusteringCoefficient => "How connected a note's neighbours are to each other",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    /// Case-insensitive; spaces, `-` and `_` are interchangeable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let squash = |v: &str| {
            v.chars()
                .filter(|c| !matches!(c, ' ' | '-' | '_'))
                .flat_map(char::to_lowercase)
                .collect::<String>()
        };
        let wanted = squash(s);
        if wanted == "commonneighbors" {
            return Ok(Self::CommonNeighbours);
        }
        Self::ALL
            .into_iter()
            .find(|alg| squash(alg.name()) == wanted)
            .ok_or_else(|| ConfigError::UnknownAlgorithm(s.to_string()))
    }
}

impl TryFrom<String> for Algorithm {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Algorithm> for String {
    fn from(alg: Algorithm) -> Self {
        alg.name().to_string()
    }
}

/// Per-run overrides of the settings defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmParams {
    /// Label Propagation iteration count
    pub iterations: Option<usize>,
    /// Louvain resolution
    pub resolution: Option<f64>,
}

// ============================================================================
// Settings
// ============================================================================

fn default_true() -> bool {
    true
}

fn default_algorithm() -> Algorithm {
    Algorithm::CoCitations
}

fn default_algorithms_to_show() -> Vec<Algorithm> {
    vec![
        Algorithm::AdamicAdar,
        Algorithm::Jaccard,
        Algorithm::CoCitations,
        Algorithm::LabelPropagation,
        Algorithm::BetweennessCentrality,
    ]
}

fn default_iterations() -> usize {
    10
}

fn default_resolution() -> f64 {
    10.0
}

/// Engine configuration. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Include non-markdown files as nodes
    #[serde(default = "default_true")]
    pub all_file_extensions: bool,
    /// Add edges for links whose target does not exist
    #[serde(default = "default_true")]
    pub add_unresolved: bool,
    /// Tags participate in co-citation
    #[serde(default = "default_true")]
    pub co_tags: bool,
    /// Notes carrying any of these tags are excluded (`#` optional)
    #[serde(default)]
    pub exclusion_tags: Vec<String>,
    /// Case-insensitive pattern; matching note IDs are excluded
    #[serde(default)]
    pub exclusion_regex: String,
    #[serde(default = "default_algorithm")]
    pub default_algorithm: Algorithm,
    #[serde(default = "default_algorithms_to_show")]
    pub algorithms_to_show: Vec<Algorithm>,
    /// Custom display names
    #[serde(default)]
    pub algorithm_renames: BTreeMap<Algorithm, String>,
    #[serde(default = "default_true")]
    pub exclude_zero: bool,
    #[serde(default = "default_true")]
    pub exclude_infinity: bool,
    #[serde(default)]
    pub exclude_linked: bool,
    #[serde(default = "default_iterations")]
    pub label_propagation_iterations: usize,
    #[serde(default = "default_resolution")]
    pub louvain_resolution: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            all_file_extensions: true,
            add_unresolved: true,
            co_tags: true,
            exclusion_tags: vec![],
            exclusion_regex: String::new(),
            default_algorithm: default_algorithm(),
            algorithms_to_show: default_algorithms_to_show(),
            algorithm_renames: BTreeMap::new(),
            exclude_zero: true,
            exclude_infinity: true,
            exclude_linked: false,
            label_propagation_iterations: default_iterations(),
            louvain_resolution: default_resolution(),
        }
    }
}

impl Settings {
    /// Compile the exclusion pattern. `None` when the pattern is empty.
    pub fn exclusion_matcher(&self) -> Result<Option<Regex>, ConfigError> {
        if self.exclusion_regex.is_empty() {
            return Ok(None);
        }
        RegexBuilder::new(&self.exclusion_regex)
            .case_insensitive(true)
            .build()
            .map(Some)
            .map_err(|source| ConfigError::InvalidRegex {
                pattern: self.exclusion_regex.clone(),
                source,
            })
    }

    /// Exclusion tags in `#tag` form.
    pub fn normalized_exclusion_tags(&self) -> Vec<String> {
        self.exclusion_tags
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| normalize_tag(t))
            .collect()
    }

    /// Check everything that can be wrong before any graph work starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.exclusion_matcher()?;
        check_resolution(self.louvain_resolution)
    }

    /// Reject algorithms left out of `algorithms_to_show`.
    pub fn ensure_enabled(&self, algorithm: Algorithm) -> Result<(), ConfigError> {
        if self.algorithms_to_show.contains(&algorithm) {
            Ok(())
        } else {
            Err(ConfigError::DisabledAlgorithm(algorithm.name().to_string()))
        }
    }

    /// Resolve the effective parameters for one run.
    pub fn params(&self, overrides: AlgorithmParams) -> Result<(usize, f64), ConfigError> {
        let iterations = overrides
            .iterations
            .unwrap_or(self.label_propagation_iterations);
        let resolution = overrides.resolution.unwrap_or(self.louvain_resolution);
        check_resolution(resolution)?;
        Ok((iterations, resolution))
    }
}

fn check_resolution(resolution: f64) -> Result<(), ConfigError> {
    if resolution.is_finite() && resolution > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name: "louvain_resolution",
            reason: format!("must be finite and positive, got {}", resolution),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)]) -> NoteGraph {
        let mut g = NoteGraph::new();
        for (a, b) in edges {
            g.add_node(a);
            g.add_node(b);
            g.add_edge(a, b, LinkEdge { resolved: true });
        }
        g
    }

    // --- NoteGraph ---

    #[test]
    fn test_add_node_idempotent_keeps_order() {
        let mut g = NoteGraph::new();
        let a = g.add_node("a.md");
        let b = g.add_node("b.md");
        assert_eq!(g.add_node("a.md"), a);
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.get_node("b.md").unwrap().order, 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_add_edge_never_duplicates() {
        let mut g = graph(&[("a", "b")]);
        g.add_edge("a", "b", LinkEdge { resolved: false });
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.get_edge("a", "b"), Some(LinkEdge { resolved: false }));
        assert!(g.add_edge("a", "missing", LinkEdge { resolved: true }).is_none());
    }

    #[test]
    fn test_neighbors_undirected_and_safe() {
        let g = graph(&[("x", "y"), ("x", "z"), ("y", "z")]);
        assert_eq!(g.neighbors("x"), vec!["y", "z"]);
        assert_eq!(g.neighbors("z"), vec!["x", "y"]);
        assert_eq!(g.in_neighbors("z"), vec!["x", "y"]);
        assert!(g.neighbors("nope").is_empty());
        assert!(g.in_neighbors("nope").is_empty());
        assert_eq!(g.out_degree("x"), 2);
        assert_eq!(g.out_degree("nope"), 0);
    }

    #[test]
    fn test_is_linked_and_resolved() {
        let mut g = graph(&[("a", "b")]);
        g.add_node("ghost.md");
        g.add_edge("a", "ghost.md", LinkEdge { resolved: false });
        assert!(g.is_linked("b", "a"));
        assert!(!g.is_linked("b", "ghost.md"));
        assert!(g.is_resolved("b"));
        assert!(g.is_resolved("a"));
        assert!(!g.is_resolved("ghost.md"));
        assert!(!g.is_resolved("nope"));
    }

    // --- Algorithm ---

    #[test]
    fn test_algorithm_parse_forms() {
        assert_eq!("adamic-adar".parse::<Algorithm>().unwrap(), Algorithm::AdamicAdar);
        assert_eq!("Adamic Adar".parse::<Algorithm>().unwrap(), Algorithm::AdamicAdar);
        assert_eq!("co_citations".parse::<Algorithm>().unwrap(), Algorithm::CoCitations);
        assert_eq!("pagerank".parse::<Algorithm>().unwrap(), Algorithm::PageRank);
        assert_eq!(
            "common neighbors".parse::<Algorithm>().unwrap(),
            Algorithm::CommonNeighbours
        );
        assert!(matches!(
            "Otsuka-Chiai".parse::<Algorithm>(),
            Err(ConfigError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn test_algorithm_names_roundtrip() {
        for alg in Algorithm::ALL {
            assert_eq!(alg.name().parse::<Algorithm>().unwrap(), alg);
            assert!(!alg.description().is_empty());
        }
    }

    #[test]
    fn test_algorithm_metadata() {
        assert_eq!(Algorithm::Jaccard.category(), AlgorithmCategory::Similarity);
        assert_eq!(
            Algorithm::ClusteringCoefficient.category().to_string(),
            "Community Detection"
        );
        assert!(Algorithm::PageRank.is_global());
        assert!(!Algorithm::Louvain.is_global());
        assert!(!Algorithm::CoCitations.is_global());
    }

    // --- Settings ---

    #[test]
    fn test_settings_defaults() {
        let s = Settings::default();
        assert!(s.all_file_extensions && s.add_unresolved && s.co_tags);
        assert!(s.exclude_zero && s.exclude_infinity && !s.exclude_linked);
        assert_eq!(s.default_algorithm, Algorithm::CoCitations);
        assert_eq!(s.algorithms_to_show.len(), 5);
        assert_eq!(s.label_propagation_iterations, 10);
        assert!((s.louvain_resolution - 10.0).abs() < f64::EPSILON);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_settings_partial_yaml() {
        let yaml = "exclusion_regex: '^archive/'\ndefault_algorithm: adamic-adar\nalgorithm_renames:\n  Jaccard: Similar\n";
        let s: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(s.default_algorithm, Algorithm::AdamicAdar);
        assert_eq!(s.algorithm_renames[&Algorithm::Jaccard], "Similar");
        assert!(s.add_unresolved);
        let re = s.exclusion_matcher().unwrap().unwrap();
        assert!(re.is_match("ARCHIVE/old.md"));
    }

    #[test]
    fn test_settings_invalid_regex_and_resolution() {
        let s = Settings {
            exclusion_regex: "([".into(),
            ..Default::default()
        };
        assert!(matches!(s.validate(), Err(ConfigError::InvalidRegex { .. })));

        let s = Settings {
            louvain_resolution: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            s.validate(),
            Err(ConfigError::InvalidParameter { .. })
        ));
        assert!(Settings::default()
            .params(AlgorithmParams {
                resolution: Some(f64::NAN),
                ..Default::default()
            })
            .is_err());
    }

    #[test]
    fn test_exclusion_tags_normalized() {
        let s = Settings {
            exclusion_tags: vec!["draft".into(), "#private".into(), " ".into()],
            ..Default::default()
        };
        assert_eq!(s.normalized_exclusion_tags(), vec!["#draft", "#private"]);
    }

    #[test]
    fn test_ensure_enabled() {
        let settings = Settings::default();
        assert!(settings.ensure_enabled(Algorithm::Jaccard).is_ok());
        assert!(settings.ensure_enabled(settings.default_algorithm).is_ok());
        assert!(matches!(
            settings.ensure_enabled(Algorithm::Hits),
            Err(ConfigError::DisabledAlgorithm(name)) if name == "HITS"
        ));

        let all = Settings {
            algorithms_to_show: Algorithm::ALL.to_vec(),
            ..Default::default()
        };
        assert!(Algorithm::ALL.iter().all(|a| all.ensure_enabled(*a).is_ok()));
    }

    #[test]
    fn test_params_overrides() {
        let s = Settings::default();
        assert_eq!(s.params(AlgorithmParams::default()).unwrap(), (10, 10.0));
        let p = AlgorithmParams {
            iterations: Some(0),
            resolution: Some(1.0),
        };
        assert_eq!(s.params(p).unwrap(), (0, 1.0));
    }

    #[test]
    fn test_output_serializes_tagged() {
        let out = AlgorithmOutput::Members(vec!["a.md".into()]);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["kind"], "members");
        assert_eq!(json["data"][0], "a.md");
    }
}
