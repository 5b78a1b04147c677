//! Note graph analysis.
//!
//! Builds a directed graph of notes from vault link metadata and runs
//! similarity, link-prediction, centrality, community and co-citation
//! algorithms over it.
//!
//! ## Architecture
//!
//! ```text
//! MetadataStore ──► builder ──► NoteGraph (petgraph::DiGraph)
//!                                   │
//!                      algorithms / cocitation
//!                                   │
//!                            AnalysisReport
//!                                   │
//!                   AnalysisEngine (rebuild + dispatch)
//! ```
//!
//! ## Modules
//!
//! - [`models`]: Data structures (NoteGraph, results, Algorithm, Settings)
//! - [`builder`]: Vault metadata → petgraph with inclusion filters
//! - [`algorithms`]: Neighbourhood measures, HITS, PageRank, Betweenness, Label Propagation, Louvain, Clustering
//! - [`cocitation`]: Text-proximity co-citation scorer
//! - [`engine`]: `AnalysisEngine` trait and `NoteGraphEngine`
//! - [`debouncer`]: Coalesces rebuild triggers
//! - [`mock`]: `MockAnalysisEngine` for testing (cfg(test) only)

pub mod algorithms;
pub mod builder;
pub mod cocitation;
pub mod debouncer;
pub mod engine;
pub mod models;

#[cfg(test)]
pub mod mock;

// Re-export primary types for convenience
pub use builder::{build_graph, GraphBuilder, NoteTags};
pub use cocitation::co_citations;
pub use debouncer::AnalysisDebouncer;
pub use engine::{AnalysisEngine, NoteGraphEngine, RebuildStats};
pub use models::{
    Algorithm, AlgorithmCategory, AlgorithmOutput, AlgorithmParams, AnalysisReport, CoCitation,
    CoCitationEntry, CoCitationMap, Communities, HitsResult, LinkEdge, MeasureEntry, NoteGraph,
    NoteNode, Notice, ResultMap, Settings,
};
