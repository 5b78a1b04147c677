//! Mock analysis engine for testing consumers.
//!
//! Returns a pre-configured report without touching a vault, and counts
//! rebuilds so debouncing can be observed.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use super::engine::{AnalysisEngine, RebuildStats};
use super::models::{
    Algorithm, AlgorithmOutput, AlgorithmParams, AnalysisReport, NoteGraph, ResultMap,
};

/// Mock implementation of `AnalysisEngine` for testing.
///
/// Returns the configured output for every run, or empty scores if not configured.
pub struct MockAnalysisEngine {
    output: Option<AlgorithmOutput>,
    graph: Arc<NoteGraph>,
    pub rebuild_count: AtomicU32,
}

impl MockAnalysisEngine {
    /// Create a mock engine that returns empty scores.
    pub fn new() -> Self {
        Self {
            output: None,
            graph: Arc::new(NoteGraph::new()),
            rebuild_count: AtomicU32::new(0),
        }
    }

    /// Create a mock engine with a pre-configured output and graph.
    pub fn with_output(output: AlgorithmOutput, graph: NoteGraph) -> Self {
        Self {
            output: Some(output),
            graph: Arc::new(graph),
            rebuild_count: AtomicU32::new(0),
        }
    }
}

impl Default for MockAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisEngine for MockAnalysisEngine {
    async fn rebuild(&self) -> Result<RebuildStats> {
        self.rebuild_count.fetch_add(1, Ordering::SeqCst);
        Ok(RebuildStats {
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            computation_ms: 0,
            built_at: Utc::now(),
        })
    }

    async fn run(
        &self,
        algorithm: Algorithm,
        source: &str,
        _params: AlgorithmParams,
    ) -> Result<AnalysisReport> {
        Ok(AnalysisReport {
            algorithm,
            source: source.to_string(),
            output: self
                .output
                .clone()
                .unwrap_or_else(|| AlgorithmOutput::Scores(ResultMap::new())),
            notices: vec![],
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            computation_ms: 0,
            computed_at: Utc::now(),
        })
    }

    async fn graph(&self) -> Arc<NoteGraph> {
        self.graph.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::models::LinkEdge;

    #[tokio::test]
    async fn test_mock_returns_empty_by_default() {
        let mock = MockAnalysisEngine::new();
        let report = mock
            .run(Algorithm::Jaccard, "a.md", AlgorithmParams::default())
            .await
            .unwrap();
        assert_eq!(report.node_count, 0);
        assert_eq!(report.output, AlgorithmOutput::Scores(ResultMap::new()));
    }

    #[tokio::test]
    async fn test_mock_returns_configured_output() {
        let mut graph = NoteGraph::new();
        graph.add_node("a.md");
        graph.add_node("b.md");
        graph.add_edge("a.md", "b.md", LinkEdge { resolved: true });
        let mock = MockAnalysisEngine::with_output(
            AlgorithmOutput::Members(vec!["a.md".into(), "b.md".into()]),
            graph,
        );

        let report = mock
            .run(Algorithm::Louvain, "a.md", AlgorithmParams::default())
            .await
            .unwrap();
        assert_eq!(report.edge_count, 1);
        assert_eq!(
            report.output,
            AlgorithmOutput::Members(vec!["a.md".into(), "b.md".into()])
        );

        let stats = mock.rebuild().await.unwrap();
        assert_eq!(stats.node_count, 2);
        assert_eq!(mock.rebuild_count.load(Ordering::SeqCst), 1);
    }
}
