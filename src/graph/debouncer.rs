//! Rebuild debouncer for vault watching.
//!
//! Coalesces rapid-fire rebuild triggers (e.g., from file watcher events)
//! into a single `rebuild` call after a configurable quiet period.
//!
//! ## Design
//!
//! Uses an mpsc channel + timeout loop:
//! 1. `trigger()` sends a non-blocking message
//! 2. Background task waits for the first trigger, then keeps consuming
//!    triggers until `debounce_ms` of silence (no new triggers)
//! 3. After the quiet period, runs `rebuild`
//! 4. The loop is sequential, no concurrent rebuilds
//!
//! ## Usage
//!
//! ```ignore
//! let debouncer = AnalysisDebouncer::new(engine, 500);
//! debouncer.trigger(); // non-blocking
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::engine::{AnalysisEngine, RebuildStats};

/// Debounced rebuild trigger. Thread-safe and non-blocking.
pub struct AnalysisDebouncer {
    trigger_tx: mpsc::Sender<()>,
}

impl AnalysisDebouncer {
    /// Create a new debouncer that waits `debounce_ms` of silence before rebuilding.
    ///
    /// Spawns a background tokio task that lives until the debouncer is dropped.
    pub fn new(engine: Arc<dyn AnalysisEngine>, debounce_ms: u64) -> Self {
        Self::with_listener(engine, debounce_ms, None)
    }

    /// Create a debouncer that also reports every successful rebuild on `listener`.
    pub fn with_listener(
        engine: Arc<dyn AnalysisEngine>,
        debounce_ms: u64,
        listener: Option<mpsc::Sender<RebuildStats>>,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<()>(64);
        tokio::spawn(Self::run_loop(engine, rx, debounce_ms, listener));
        Self { trigger_tx: tx }
    }

    /// Request a rebuild.
    ///
    /// Non-blocking: returns immediately. If the channel is full, the trigger
    /// is silently dropped (the pending trigger will still fire).
    pub fn trigger(&self) {
        let _ = self.trigger_tx.try_send(());
    }

    /// Background loop: debounce triggers and rebuild.
    async fn run_loop(
        engine: Arc<dyn AnalysisEngine>,
        mut rx: mpsc::Receiver<()>,
        debounce_ms: u64,
        listener: Option<mpsc::Sender<RebuildStats>>,
    ) {
        let debounce = Duration::from_millis(debounce_ms);

        loop {
            // Wait for the first trigger
            if rx.recv().await.is_none() {
                break; // channel closed, debouncer dropped
            }
            let mut coalesced = 1usize;

            // Debounce: keep consuming triggers until quiet period
            loop {
                match tokio::time::timeout(debounce, rx.recv()).await {
                    Ok(Some(())) => coalesced += 1,
                    Ok(None) => return, // channel closed
                    Err(_) => break,    // timeout = quiet period elapsed
                }
            }

            match engine.rebuild().await {
                Ok(stats) => {
                    tracing::info!(
                        triggers = coalesced,
                        nodes = stats.node_count,
                        edges = stats.edge_count,
                        "Debounced rebuild finished"
                    );
                    if let Some(ref listener) = listener {
                        if listener.send(stats).await.is_err() {
                            tracing::debug!("Rebuild listener closed");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(triggers = coalesced, error = %e, "Debounced rebuild failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::mock::MockAnalysisEngine;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_debounce_coalesces_rapid_triggers() {
        let mock = Arc::new(MockAnalysisEngine::new());
        let debouncer = AnalysisDebouncer::new(mock.clone(), 100); // 100ms debounce

        // Fire 10 triggers in rapid succession
        for _ in 0..10 {
            debouncer.trigger();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        // Wait for debounce period + processing
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(
            mock.rebuild_count.load(Ordering::SeqCst),
            1,
            "10 rapid triggers should coalesce into 1 rebuild"
        );
    }

    #[tokio::test]
    async fn test_debounce_separate_bursts() {
        let mock = Arc::new(MockAnalysisEngine::new());
        let (tx, mut rx) = mpsc::channel(4);
        let debouncer = AnalysisDebouncer::with_listener(mock.clone(), 50, Some(tx));

        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(150)).await;
        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(mock.rebuild_count.load(Ordering::SeqCst), 2);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_debounce_no_trigger_no_call() {
        let mock = Arc::new(MockAnalysisEngine::new());
        let _debouncer = AnalysisDebouncer::new(mock.clone(), 50);

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(
            mock.rebuild_count.load(Ordering::SeqCst),
            0,
            "No triggers should produce 0 rebuilds"
        );
    }
}
