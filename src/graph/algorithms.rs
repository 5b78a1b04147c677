//! Graph analysis algorithms.
//!
//! Every function takes a read-only [`NoteGraph`] and returns a fresh result:
//! - **Neighbourhood measures**: Jaccard, Overlap, Adamic-Adar, Common Neighbours
//! - **HITS**: hub/authority power iteration (custom implementation)
//! - **PageRank**: power iteration (custom implementation)
//! - **Betweenness centrality**: via `rustworkx_core::centrality::betweenness_centrality`
//! - **Label propagation**: synchronous, deterministic tie-break
//! - **Community detection (Louvain)**: custom implementation
//! - **Clustering coefficient**: local coefficient plus the closed triangles
//!
//! Neighbourhoods are undirected. Unknown source nodes behave as nodes with
//! no neighbours. Measures are rounded to [`DECIMALS`](crate::text::DECIMALS)
//! places and never NaN or infinite.

use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::text::{counts, finite_or_zero, intersection, max_key, round_number};

use super::models::{Communities, HitsResult, MeasureEntry, NoteGraph, Notice, ResultMap};

// ============================================================================
// Neighbourhood measures
// ============================================================================

/// Apply `score(|Na|, |Nb|, Na ∩ Nb)` against the source for every node.
fn neighbourhood_measure<F>(graph: &NoteGraph, source: &str, score: F) -> ResultMap
where
    F: Fn(usize, usize, &[String]) -> f64,
{
    let na = graph.neighbors(source);
    graph
        .node_ids()
        .into_iter()
        .map(|to| {
            let nb = graph.neighbors(&to);
            let nab = intersection(&na, &nb);
            let measure = finite_or_zero(score(na.len(), nb.len(), &nab));
            (to, MeasureEntry { measure, extra: nab })
        })
        .collect()
}

/// `|Na ∩ Nb| / |Na ∪ Nb|`, zero when the union is empty.
pub fn jaccard(graph: &NoteGraph, source: &str) -> ResultMap {
    neighbourhood_measure(graph, source, |a, b, nab| {
        let union = a + b - nab.len();
        if union > 0 {
            round_number(nab.len() as f64 / union as f64)
        } else {
            0.0
        }
    })
}

/// `|Na ∩ Nb|² / min(|Na|, |Nb|)`, zero when either side is empty.
pub fn overlap(graph: &NoteGraph, source: &str) -> ResultMap {
    neighbourhood_measure(graph, source, |a, b, nab| {
        let min_degree = a.min(b);
        if min_degree > 0 {
            round_number((nab.len() * nab.len()) as f64 / min_degree as f64)
        } else {
            0.0
        }
    })
}

/// Sum of `1 / ln(outDegree(n))` over shared neighbours with out-degree above one.
pub fn adamic_adar(graph: &NoteGraph, source: &str) -> ResultMap {
    neighbourhood_measure(graph, source, |_, _, nab| {
        let total: f64 = nab
            .iter()
            .map(|n| graph.out_degree(n))
            .filter(|&degree| degree > 1)
            .map(|degree| 1.0 / (degree as f64).ln())
            .sum();
        round_number(total)
    })
}

/// Raw size of the shared neighbourhood.
pub fn common_neighbours(graph: &NoteGraph, source: &str) -> ResultMap {
    neighbourhood_measure(graph, source, |_, _, nab| nab.len() as f64)
}

// ============================================================================
// HITS (power iteration)
// ============================================================================

const HITS_MAX_ITERATIONS: usize = 300;
const HITS_TOLERANCE: f64 = 1e-8;

/// Compute hub and authority scores, each normalised to sum 1.
///
/// A graph without edges keeps the uniform starting scores.
pub fn hits(graph: &NoteGraph) -> HitsResult {
    let g = &graph.graph;
    let n = g.node_count();
    if n == 0 {
        return HitsResult::default();
    }

    let mut hubs = vec![1.0 / n as f64; n];
    let mut auths = vec![1.0 / n as f64; n];

    if g.edge_count() > 0 {
        for _ in 0..HITS_MAX_ITERATIONS {
            let mut new_auths = vec![0.0; n];
            for edge in g.edge_references() {
                new_auths[edge.target().index()] += hubs[edge.source().index()];
            }
            normalize_sum(&mut new_auths);

            let mut new_hubs = vec![0.0; n];
            for edge in g.edge_references() {
                new_hubs[edge.source().index()] += new_auths[edge.target().index()];
            }
            normalize_sum(&mut new_hubs);

            let diff: f64 = hubs
                .iter()
                .zip(&new_hubs)
                .chain(auths.iter().zip(&new_auths))
                .map(|(a, b)| (a - b).abs())
                .sum();
            hubs = new_hubs;
            auths = new_auths;
            if diff < HITS_TOLERANCE {
                break;
            }
        }
    }

    let mut result = HitsResult::default();
    for idx in g.node_indices() {
        let id = g[idx].id.clone();
        result
            .hubs
            .insert(id.clone(), round_number(finite_or_zero(hubs[idx.index()])));
        result
            .authorities
            .insert(id, round_number(finite_or_zero(auths[idx.index()])));
    }
    result
}

fn normalize_sum(values: &mut [f64]) {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        for v in values.iter_mut() {
            *v /= total;
        }
    }
}

// ============================================================================
// PageRank
// ============================================================================

const PAGERANK_DAMPING: f64 = 0.85;
const PAGERANK_TOLERANCE: f64 = 1e-6;
const PAGERANK_MAX_ITERATIONS: usize = 100;

/// Compute PageRank scores for all nodes.
///
/// Rank held by notes without outgoing links is pooled and shared by every
/// note on the next step. Scores sum to ≈ 1.0.
pub fn pagerank(graph: &NoteGraph) -> ResultMap {
    let g = &graph.graph;
    let n = g.node_count();
    if n == 0 {
        return ResultMap::new();
    }
    let uniform = 1.0 / n as f64;

    let outgoing: Vec<Vec<usize>> = g
        .node_indices()
        .map(|idx| {
            g.neighbors_directed(idx, Direction::Outgoing)
                .map(|target| target.index())
                .collect()
        })
        .collect();

    let mut rank = vec![uniform; n];
    for step in 1..=PAGERANK_MAX_ITERATIONS {
        let dangling: f64 = outgoing
            .iter()
            .zip(&rank)
            .filter(|(targets, _)| targets.is_empty())
            .map(|(_, r)| r)
            .sum();
        let teleport = (1.0 - PAGERANK_DAMPING + PAGERANK_DAMPING * dangling) * uniform;

        let mut next = vec![teleport; n];
        for (targets, r) in outgoing.iter().zip(&rank) {
            if targets.is_empty() {
                continue;
            }
            let share = PAGERANK_DAMPING * r / targets.len() as f64;
            for &target in targets {
                next[target] += share;
            }
        }

        let delta: f64 = rank.iter().zip(&next).map(|(old, new)| (old - new).abs()).sum();
        rank = next;
        if delta < PAGERANK_TOLERANCE {
            tracing::trace!(step, "PageRank converged");
            break;
        }
    }

    normalize_sum(&mut rank);
    g.node_indices()
        .zip(rank)
        .map(|(idx, r)| {
            let measure = round_number(finite_or_zero(r));
            (g[idx].id.clone(), MeasureEntry { measure, extra: vec![] })
        })
        .collect()
}

// ============================================================================
// Betweenness Centrality (via rustworkx-core)
// ============================================================================

/// Normalised betweenness centrality, endpoints excluded.
pub fn betweenness_centrality(graph: &NoteGraph) -> ResultMap {
    let g = &graph.graph;
    if g.node_count() == 0 {
        return ResultMap::new();
    }

    let scores = rustworkx_core::centrality::betweenness_centrality(
        g, false, // include_endpoints
        true,  // normalized
        200,   // parallel_threshold
    );

    g.node_indices()
        .map(|idx| {
            let score = scores[idx.index()].unwrap_or(0.0);
            let measure = round_number(finite_or_zero(score));
            (g[idx].id.clone(), MeasureEntry { measure, extra: vec![] })
        })
        .collect()
}

// ============================================================================
// Label Propagation
// ============================================================================

/// Group nodes by label after `iterations` synchronous rounds.
///
/// Every node starts with its own ID as label and adopts the commonest label
/// among its neighbours from the previous round. Ties go to the smallest
/// label; nodes without neighbours keep theirs.
pub fn label_propagation(graph: &NoteGraph, iterations: usize) -> Communities {
    let ids = graph.node_ids();
    let neighbours: HashMap<&str, Vec<String>> = ids
        .iter()
        .map(|id| (id.as_str(), graph.neighbors(id)))
        .collect();
    let mut labels: HashMap<&str, String> =
        ids.iter().map(|id| (id.as_str(), id.clone())).collect();

    for _ in 0..iterations {
        let mut next: HashMap<&str, String> = HashMap::with_capacity(labels.len());
        for id in &ids {
            let around = &neighbours[id.as_str()];
            let label = if around.is_empty() {
                labels[id.as_str()].clone()
            } else {
                let tally = counts(around.iter().map(|n| labels[n.as_str()].as_str()));
                max_key(&tally)
                    .map(str::to_string)
                    .unwrap_or_else(|| labels[id.as_str()].clone())
            };
            next.insert(id.as_str(), label);
        }
        labels = next;
    }

    let mut communities = Communities::new();
    for id in &ids {
        communities
            .entry(labels[id.as_str()].clone())
            .or_default()
            .push(id.clone());
    }
    communities
}

// ============================================================================
// Community Detection: Louvain
// ============================================================================

const LOUVAIN_MAX_PASSES: usize = 100;

/// Unit-weight undirected view of the graph.
struct UndirectedView {
    neighbours: Vec<Vec<usize>>,
    degree: Vec<f64>,
    /// Twice the edge count
    volume: f64,
}

impl UndirectedView {
    fn of(graph: &NoteGraph) -> Self {
        let g = &graph.graph;
        let mut neighbours = vec![Vec::new(); g.node_count()];
        for edge in g.edge_references() {
            let (s, t) = (edge.source().index(), edge.target().index());
            neighbours[s].push(t);
            neighbours[t].push(s);
        }
        let degree: Vec<f64> = neighbours.iter().map(|around| around.len() as f64).collect();
        let volume = degree.iter().sum();
        Self {
            neighbours,
            degree,
            volume,
        }
    }
}

/// Node → community assignment with per-community degree totals.
struct Partition {
    community: Vec<usize>,
    totals: Vec<f64>,
}

impl Partition {
    fn singletons(view: &UndirectedView) -> Self {
        Self {
            community: (0..view.degree.len()).collect(),
            totals: view.degree.clone(),
        }
    }

    /// Links from `node` into each neighbouring community, self-loops excluded.
    ///
    /// Ordered so equal gains always resolve to the same community.
    fn links_from(&self, view: &UndirectedView, node: usize) -> BTreeMap<usize, f64> {
        let mut links = BTreeMap::new();
        for &other in &view.neighbours[node] {
            if other != node {
                *links.entry(self.community[other]).or_insert(0.0) += 1.0;
            }
        }
        links
    }

    /// Move `node` to the neighbouring community with the largest positive
    /// modularity gain. Returns whether it moved.
    fn improve(&mut self, view: &UndirectedView, node: usize, resolution: f64) -> bool {
        let home = self.community[node];
        let links = self.links_from(view, node);
        let k = view.degree[node];
        let m2 = view.volume;
        let attach = |links_to: f64, total: f64| links_to / m2 - resolution * k * total / (m2 * m2);

        let stay = attach(links.get(&home).copied().unwrap_or(0.0), self.totals[home] - k);
        let mut best = (home, 0.0);
        for (&candidate, &links_to) in &links {
            if candidate == home {
                continue;
            }
            let gain = attach(links_to, self.totals[candidate]) - stay;
            if gain > best.1 {
                best = (candidate, gain);
            }
        }

        let (target, _) = best;
        if target == home {
            return false;
        }
        self.totals[home] -= k;
        self.totals[target] += k;
        self.community[node] = target;
        true
    }

    /// Newman modularity at resolution 1.
    fn modularity(&self, view: &UndirectedView) -> f64 {
        let m2 = view.volume;
        if m2 == 0.0 {
            return 0.0;
        }
        let mut internal = vec![0.0; self.totals.len()];
        for (node, around) in view.neighbours.iter().enumerate() {
            let own = self.community[node];
            internal[own] += around
                .iter()
                .filter(|&&other| self.community[other] == own)
                .count() as f64;
        }
        internal
            .iter()
            .zip(&self.totals)
            .map(|(inside, total)| inside / m2 - (total / m2).powi(2))
            .sum()
    }

    /// Community IDs renumbered from 0 in order of first appearance.
    fn compact(&self) -> Vec<u32> {
        let mut renumbered: Vec<Option<u32>> = vec![None; self.community.len()];
        let mut next = 0;
        self.community
            .iter()
            .map(|&c| {
                *renumbered[c].get_or_insert_with(|| {
                    next += 1;
                    next - 1
                })
            })
            .collect()
    }
}

/// Assign every node a community by greedy modularity maximisation.
///
/// Works on the undirected view; reciprocal links count twice. Returns the
/// community ID per node and the modularity of the final partition.
pub fn louvain_communities(graph: &NoteGraph, resolution: f64) -> (HashMap<String, u32>, f64) {
    let g = &graph.graph;
    if g.node_count() == 0 {
        return (HashMap::new(), 0.0);
    }

    let view = UndirectedView::of(graph);
    let mut partition = Partition::singletons(&view);
    if view.volume > 0.0 {
        for pass in 1..=LOUVAIN_MAX_PASSES {
            let mut moved = false;
            for node in 0..g.node_count() {
                moved |= partition.improve(&view, node, resolution);
            }
            if !moved {
                tracing::trace!(pass, "Louvain settled");
                break;
            }
        }
    }

    let modularity = partition.modularity(&view);
    let ids = partition.compact();
    let node_map = g
        .node_indices()
        .map(|idx| (g[idx].id.clone(), ids[idx.index()]))
        .collect();
    (node_map, modularity)
}

/// Members of the source's Louvain community, in insertion order.
///
/// An unknown source yields an empty list and a [`Notice::NodeNotFound`].
pub fn louvain(graph: &NoteGraph, source: &str, resolution: f64) -> (Vec<String>, Option<Notice>) {
    if !graph.has_node(source) {
        return (
            vec![],
            Some(Notice::NodeNotFound {
                node: source.to_string(),
            }),
        );
    }
    let (node_map, modularity) = louvain_communities(graph, resolution);
    let label = node_map.get(source).copied();
    let members: Vec<String> = graph
        .node_ids()
        .into_iter()
        .filter(|id| node_map.get(id).copied() == label)
        .collect();
    tracing::debug!(
        source,
        members = members.len(),
        modularity,
        "Louvain community resolved"
    );
    (members, None)
}

// ============================================================================
// Clustering Coefficient
// ============================================================================

/// Local clustering coefficient per node over the undirected neighbourhood.
///
/// `extra` lists each closed triangle as `"node, a, b"`.
pub fn clustering_coefficient(graph: &NoteGraph) -> ResultMap {
    let g = &graph.graph;
    let mut result = ResultMap::new();

    for idx in g.node_indices() {
        let id = g[idx].id.clone();

        let mut seen = HashSet::new();
        let mut neighbors: Vec<_> = g
            .neighbors_directed(idx, Direction::Outgoing)
            .chain(g.neighbors_directed(idx, Direction::Incoming))
            .filter(|&n| n != idx && seen.insert(n))
            .collect();
        neighbors.sort_by_key(|n| g[*n].order);

        let k = neighbors.len();
        let mut triangles: Vec<String> = Vec::new();
        for i in 0..k {
            for j in (i + 1)..k {
                let (ni, nj) = (neighbors[i], neighbors[j]);
                if g.contains_edge(ni, nj) || g.contains_edge(nj, ni) {
                    triangles.push(format!("{}, {}, {}", id, g[ni].id, g[nj].id));
                }
            }
        }

        let possible = k * k.saturating_sub(1) / 2;
        let coeff = if possible > 0 {
            triangles.len() as f64 / possible as f64
        } else {
            0.0
        };
        result.insert(
            id,
            MeasureEntry {
                measure: round_number(coeff),
                extra: triangles,
            },
        );
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
