//! Lazy node deletion and in-place node compaction.

use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::types::{EdgeId, GraphError, NodeId, Result};

use super::cursor::{Dir, EdgeIter};
use super::flags::EdgeFlags;
use super::graph::{link_cell, GraphStorage};
use super::payload::{edge, node, Payload};

const INT_BYTES: u64 = 4;

impl<X: Payload> GraphStorage<X> {
    /// Tombstones `node`. Nothing changes until [`Self::optimize`].
    pub fn mark_removed(&mut self, node: NodeId) -> Result<()> {
        self.check_node(node)?;
        self.removed
            .get_or_insert_with(RoaringBitmap::new)
            .insert(node.0);
        self.metrics.node_marked_removed();
        Ok(())
    }

    /// True when `node` is tombstoned and awaiting compaction.
    pub fn is_removed(&self, node: NodeId) -> bool {
        self.removed
            .as_ref()
            .is_some_and(|removed| removed.contains(node.0))
    }

    /// Number of tombstoned nodes.
    pub fn removed_count(&self) -> u64 {
        self.removed.as_ref().map_or(0, RoaringBitmap::len)
    }

    /// Drops every tombstoned node and renumbers the survivors densely.
    ///
    /// Edges touching removed nodes are unlinked from their neighbours' lists
    /// but keep their slots; edge ids are stable. The highest live nodes move
    /// into the freed slots, and every edge touching a moved node is rewritten
    /// with its new id. Moving stops once the next donor would land above the
    /// slot it fills; the node count still shrinks by the number removed.
    pub fn optimize(&mut self) -> Result<()> {
        self.check_initialized()?;
        let removed = match self.removed.take() {
            Some(removed) if !removed.is_empty() => removed,
            _ => {
                self.trim_nodes();
                return Ok(());
            }
        };
        let removed_count = removed.len();
        info!(
            nodes = self.node_count,
            removed = removed_count,
            "graph.optimize.start"
        );

        let mut neighbours = RoaringBitmap::new();
        for del in &removed {
            for (_, adj) in self.incident_edges(del)? {
                if !removed.contains(adj) {
                    neighbours.insert(adj);
                }
            }
        }

        let mut remap: FxHashMap<u32, u32> = FxHashMap::default();
        let mut to_move = i64::from(self.node_count);
        for del in &removed {
            to_move -= 1;
            while to_move >= 0 && removed.contains(to_move as u32) {
                to_move -= 1;
            }
            if to_move < i64::from(del) {
                break;
            }
            remap.insert(to_move as u32, del);
        }

        for base in &neighbours {
            let mut prev = None;
            for (edge, adj) in self.incident_edges(base)? {
                if removed.contains(adj) {
                    self.unlink_edge(edge, prev, base, adj);
                } else {
                    prev = Some(edge);
                }
            }
        }

        let mut to_rewrite = RoaringBitmap::new();
        for &old in remap.keys() {
            to_rewrite.insert(old);
            for (edge, adj) in self.incident_edges(old)? {
                if removed.contains(adj) {
                    return Err(GraphError::Corruption(format!(
                        "moved node {old} still links removed node {adj} via edge {edge}"
                    )));
                }
                to_rewrite.insert(adj);
            }
        }

        for (&old, &new) in &remap {
            for cell in 0..self.node_ints {
                let value = self.node_cell(old, cell);
                self.set_node_cell(new, cell, value);
            }
        }

        let mut rewritten = 0u32;
        for id in 0..self.edge_count {
            let (a, b) = self.endpoints(id);
            if !to_rewrite.contains(a) && !to_rewrite.contains(b) {
                continue;
            }
            // Unlinked records keep their stale endpoints.
            if removed.contains(a) || removed.contains(b) {
                continue;
            }
            let new_a = remap.get(&a).copied().unwrap_or(a);
            let new_b = remap.get(&b).copied().unwrap_or(b);
            let link_a = self.edge_cell(id, link_cell(a, b));
            let link_b = self.edge_cell(id, link_cell(b, a));
            let distance = self.edge_cell(id, edge::DIST);
            let flags = EdgeFlags::from_raw(self.edge_cell(id, edge::FLAGS));
            if self.write_edge(id, new_a, new_b, link_a, link_b, distance, flags) {
                self.reverse_geometry(id)?;
            }
            rewritten += 1;
        }

        let old_count = self.node_count;
        self.node_count -= removed_count as u32;
        self.clear_node_records(u64::from(self.node_count), u64::from(old_count));
        self.trim_nodes();
        self.metrics.compaction(removed_count);
        info!(
            nodes = self.node_count,
            moved = remap.len(),
            edges_rewritten = rewritten,
            "graph.optimize.complete"
        );
        Ok(())
    }

    /// `(edge, adj)` pairs of `node`'s whole adjacency list, in list order.
    pub(super) fn incident_edges(&self, node: u32) -> Result<Vec<(u32, u32)>> {
        let head = EdgeId::from_raw(self.node_cell(node, node::EDGE_REF));
        EdgeIter::new(self, NodeId(node), Dir::Both, head)
            .map(|state| state.map(|s| (s.edge.0, s.adj.0)))
            .collect()
    }

    fn clear_node_records(&mut self, from: u64, to: u64) {
        self.init_node_records(from, to);
        for index in from..to {
            self.set_node_cell(index as u32, node::LAT, 0);
            self.set_node_cell(index as u32, node::LON, 0);
        }
    }

    fn trim_nodes(&mut self) {
        let bytes = u64::from(self.node_count) * self.node_ints * INT_BYTES;
        self.nodes.trim_to(bytes);
        debug!(
            nodes = self.node_count,
            capacity = self.nodes.capacity(),
            "graph.nodes.trim"
        );
    }
}
