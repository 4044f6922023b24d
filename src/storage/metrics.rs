use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::Dir;

/// Hooks the storage engine calls as it mutates and scans the graph.
///
/// Implementations must be cheap; the hooks sit on the edge-creation and
/// adjacency-scan paths.
pub trait StorageMetrics: Send + Sync {
    /// Records the creation of a new edge.
    fn edge_created(&self);

    /// Records a node being tombstoned.
    fn node_marked_removed(&self);

    /// Records the start of an adjacency scan in the given direction.
    fn adjacency_scan(&self, direction: Dir);

    /// Records a compaction pass that dropped `removed` nodes.
    fn compaction(&self, removed: u64);
}

/// A no-op implementation of [`StorageMetrics`] that discards everything.
#[derive(Default)]
pub struct NoopMetrics;

impl StorageMetrics for NoopMetrics {
    fn edge_created(&self) {}
    fn node_marked_removed(&self) {}
    fn adjacency_scan(&self, _direction: Dir) {}
    fn compaction(&self, _removed: u64) {}
}

/// A thread-safe counter-based implementation of [`StorageMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Number of edges created.
    pub edges_created: AtomicU64,

    /// Number of `mark_removed` calls.
    pub nodes_marked_removed: AtomicU64,

    /// Number of outgoing-only adjacency scans.
    pub adjacency_scans_out: AtomicU64,

    /// Number of incoming-only adjacency scans.
    pub adjacency_scans_in: AtomicU64,

    /// Number of unfiltered adjacency scans.
    pub adjacency_scans_both: AtomicU64,

    /// Number of compaction passes that removed at least one node.
    pub compactions: AtomicU64,

    /// Total nodes dropped by compaction.
    pub nodes_compacted: AtomicU64,
}

impl StorageMetrics for CounterMetrics {
    fn edge_created(&self) {
        self.edges_created.fetch_add(1, Ordering::Relaxed);
    }

    fn node_marked_removed(&self) {
        self.nodes_marked_removed.fetch_add(1, Ordering::Relaxed);
    }

    fn adjacency_scan(&self, direction: Dir) {
        let counter = match direction {
            Dir::Out => &self.adjacency_scans_out,
            Dir::In => &self.adjacency_scans_in,
            Dir::Both => &self.adjacency_scans_both,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn compaction(&self, removed: u64) {
        self.compactions.fetch_add(1, Ordering::Relaxed);
        self.nodes_compacted.fetch_add(removed, Ordering::Relaxed);
    }
}

/// Returns the default metrics implementation, [`NoopMetrics`], in an [`Arc`].
pub fn default_metrics() -> Arc<dyn StorageMetrics> {
    Arc::new(NoopMetrics)
}
