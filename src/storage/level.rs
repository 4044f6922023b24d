//! Hierarchy extension: node levels, shortcut edges and one-sided unlinking.

use tracing::debug;

use crate::types::{EdgeId, GraphError, NodeId, Result};

use super::cursor::{EdgeCursorMut, EdgeState};
use super::graph::{link_cell, GraphStorage};
use super::payload::{level, node, Level, Shortcut};

/// Graph storage carrying a level per node and a skipped-edge pair per edge.
pub type LevelGraphStorage = GraphStorage<Level>;

impl GraphStorage<Level> {
    /// Sets the hierarchy level of `node`, growing the node array if needed.
    pub fn set_level(&mut self, node: NodeId, value: i32) -> Result<()> {
        self.ensure_node_index(node.0)?;
        self.set_node_cell(node.0, level::NODE_LEVEL, value);
        Ok(())
    }

    /// Hierarchy level of `node`; 0 until set.
    pub fn level(&self, node: NodeId) -> Result<i32> {
        self.check_node(node)?;
        Ok(self.node_cell(node.0, level::NODE_LEVEL))
    }

    /// Unlinks `state.edge` from one adjacency list without freeing it.
    ///
    /// With `same_direction` the edge leaves `state.base`'s list and `prev`
    /// must be its predecessor there (`None` for the list head). Otherwise the
    /// edge leaves `state.adj`'s list and the predecessor is looked up by a
    /// scan; an edge already absent from that list is left alone.
    pub fn disconnect(
        &mut self,
        state: &EdgeState<Shortcut>,
        prev: Option<EdgeId>,
        same_direction: bool,
    ) -> Result<EdgeId> {
        self.check_state(state)?;
        let (edge, base, adj) = (state.edge.0, state.base.0, state.adj.0);
        if same_direction {
            self.check_predecessor(edge, prev, base)?;
            self.unlink_edge(edge, prev.map(|p| p.0), base, adj);
        } else {
            let mut found = false;
            let mut tmp_prev = None;
            for (candidate, _) in self.incident_edges(adj)? {
                if candidate == edge {
                    found = true;
                    break;
                }
                tmp_prev = Some(candidate);
            }
            if found {
                self.unlink_edge(edge, tmp_prev, adj, base);
            }
        }
        debug!(edge, base, adj, same_direction, "graph.level.disconnect");
        Ok(state.edge)
    }

    fn check_predecessor(&self, edge: u32, prev: Option<EdgeId>, base: u32) -> Result<()> {
        let link = match prev {
            None => self.node_cell(base, node::EDGE_REF),
            Some(prev) => {
                self.check_edge(prev)?;
                let other = self.other_node(base, prev.0);
                self.edge_cell(prev.0, link_cell(base, other))
            }
        };
        if link != edge as i32 {
            return Err(GraphError::Invalid(format!(
                "{prev:?} does not precede edge {edge} in node {base}'s list"
            )));
        }
        Ok(())
    }
}

impl EdgeCursorMut<'_, Level> {
    /// Marks the edge as a shortcut over `first` and `second`, or clears it
    /// when both are `None`. Setting exactly one is rejected.
    pub fn set_skipped_edges(
        &mut self,
        first: Option<EdgeId>,
        second: Option<EdgeId>,
    ) -> Result<&mut Self> {
        if first.is_some() != second.is_some() {
            return Err(GraphError::Invalid(format!(
                "skipped edges of a shortcut must both be set or both unset, got {first:?} and {second:?}"
            )));
        }
        let edge = self.edge().0;
        self.graph
            .set_edge_cell(edge, level::SKIP_EDGE1, EdgeId::to_raw(first));
        self.graph
            .set_edge_cell(edge, level::SKIP_EDGE2, EdgeId::to_raw(second));
        Ok(self)
    }

    /// The bypassed edge pair, if this edge is a shortcut.
    pub fn skipped_edges(&self) -> Option<(EdgeId, EdgeId)> {
        self.state().data.skipped
    }

    /// True when a valid skipped-edge pair is stored.
    pub fn is_shortcut(&self) -> bool {
        self.state().data.is_shortcut()
    }
}
