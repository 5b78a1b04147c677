//! Analysis engine: owns the note graph and dispatches algorithms.
//!
//! The `AnalysisEngine` trait is the single entry point for consumers (CLI,
//! watcher, embedders). It encapsulates:
//!
//! 1. **Rebuild**: validate settings → refresh the vault → build a fresh graph → swap
//! 2. **Run**: dispatch one [`Algorithm`] against the current graph
//!
//! The trait also enables mocking in downstream consumer tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::vault::MetadataStore;

use super::algorithms;
use super::builder::GraphBuilder;
use super::cocitation::co_citations;
use super::models::{
    Algorithm, AlgorithmOutput, AlgorithmParams, AnalysisReport, NoteGraph, Notice, Settings,
};

// ============================================================================
// Output type
// ============================================================================

/// Summary of one successful rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub computation_ms: u64,
    pub built_at: DateTime<Utc>,
}

// ============================================================================
// Trait
// ============================================================================

/// Analysis engine trait: single entry point for note graph analysis.
///
/// Consumers use `Arc<dyn AnalysisEngine>` for dependency injection.
/// The real implementation (`NoteGraphEngine`) rebuilds from a [`MetadataStore`].
/// A mock implementation (`MockAnalysisEngine`) returns pre-configured reports.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Rebuild the graph from the store.
    ///
    /// On any failure the previous graph stays in place and the error is returned.
    async fn rebuild(&self) -> Result<RebuildStats>;

    /// Run one algorithm for `source` against the current graph.
    ///
    /// Configuration errors surface before any computation; a missing
    /// source is a notice on the report, not an error.
    async fn run(
        &self,
        algorithm: Algorithm,
        source: &str,
        params: AlgorithmParams,
    ) -> Result<AnalysisReport>;

    /// The current graph.
    async fn graph(&self) -> Arc<NoteGraph>;
}

// ============================================================================
// Concrete implementation
// ============================================================================

/// Real analysis engine backed by a [`MetadataStore`].
pub struct NoteGraphEngine {
    store: Arc<dyn MetadataStore>,
    builder: GraphBuilder,
    settings: Settings,
    graph: RwLock<Arc<NoteGraph>>,
}

impl NoteGraphEngine {
    /// Create an engine with an empty graph. Call `rebuild` to populate it.
    pub fn new(store: Arc<dyn MetadataStore>, settings: Settings) -> Self {
        Self {
            builder: GraphBuilder::new(store.clone()),
            store,
            settings,
            graph: RwLock::new(Arc::new(NoteGraph::new())),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

#[async_trait]
impl AnalysisEngine for NoteGraphEngine {
    async fn rebuild(&self) -> Result<RebuildStats> {
        let start = Instant::now();

        // 1. Configuration errors first
        self.settings.validate()?;

        // 2. Fresh metadata
        if let Err(e) = self.store.refresh().await {
            tracing::warn!(error = %e, "Vault refresh failed, keeping previous graph");
            return Err(e);
        }

        // 3. Build into a new graph
        let graph = match self.builder.build(&self.settings).await {
            Ok(graph) => graph,
            Err(e) => {
                tracing::warn!(error = %e, "Graph build failed, keeping previous graph");
                return Err(e);
            }
        };

        // 4. Swap
        let stats = RebuildStats {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            computation_ms: start.elapsed().as_millis() as u64,
            built_at: Utc::now(),
        };
        *self.graph.write().await = Arc::new(graph);

        tracing::info!(
            nodes = stats.node_count,
            edges = stats.edge_count,
            elapsed_ms = stats.computation_ms,
            "Note graph rebuilt"
        );
        Ok(stats)
    }

    async fn run(
        &self,
        algorithm: Algorithm,
        source: &str,
        params: AlgorithmParams,
    ) -> Result<AnalysisReport> {
        let (iterations, resolution) = self.settings.params(params)?;
        let graph = self.graph().await;
        let start = Instant::now();

        let mut notices = Vec::new();
        if !algorithm.is_global() && algorithm != Algorithm::Louvain && !graph.has_node(source) {
            notices.push(Notice::NodeNotFound {
                node: source.to_string(),
            });
        }

        let output = match algorithm {
            Algorithm::Jaccard => AlgorithmOutput::Scores(algorithms::jaccard(&graph, source)),
            Algorithm::Overlap => AlgorithmOutput::Scores(algorithms::overlap(&graph, source)),
            Algorithm::AdamicAdar => {
                AlgorithmOutput::Scores(algorithms::adamic_adar(&graph, source))
            }
            Algorithm::CommonNeighbours => {
                AlgorithmOutput::Scores(algorithms::common_neighbours(&graph, source))
            }
            Algorithm::Hits => AlgorithmOutput::Hits(algorithms::hits(&graph)),
            Algorithm::PageRank => AlgorithmOutput::Scores(algorithms::pagerank(&graph)),
            Algorithm::BetweennessCentrality => {
                AlgorithmOutput::Scores(algorithms::betweenness_centrality(&graph))
            }
            Algorithm::CoCitations => AlgorithmOutput::CoCitations(
                co_citations(&graph, self.store.as_ref(), &self.settings, source).await?,
            ),
            Algorithm::LabelPropagation => {
                AlgorithmOutput::Communities(algorithms::label_propagation(&graph, iterations))
            }
            Algorithm::Louvain => {
                let (members, notice) = algorithms::louvain(&graph, source, resolution);
                notices.extend(notice);
                AlgorithmOutput::Members(members)
            }
            Algorithm::ClusteringCoefficient => {
                AlgorithmOutput::Scores(algorithms::clustering_coefficient(&graph))
            }
        };

        let computation_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            algorithm = %algorithm,
            source,
            elapsed_ms = computation_ms,
            notices = notices.len(),
            "Algorithm finished"
        );

        Ok(AnalysisReport {
            algorithm,
            source: source.to_string(),
            output,
            notices,
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            computation_ms,
            computed_at: Utc::now(),
        })
    }

    async fn graph(&self) -> Arc<NoteGraph> {
        self.graph.read().await.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================
