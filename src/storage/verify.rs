use tracing::warn;

use crate::types::{EdgeId, NodeId};

use super::cursor::{Dir, EdgeIter};
use super::graph::GraphStorage;
use super::payload::{node, Payload};

impl<X: Payload> GraphStorage<X> {
    /// Walks every node and adjacency list and describes what is inconsistent.
    ///
    /// An empty result means the structure is sound. Tombstoned nodes are legal
    /// until [`Self::optimize`] runs and are not reported.
    pub fn verify(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for index in 0..self.node_count {
            let id = NodeId(index);
            if self.is_removed(id) {
                continue;
            }
            let (lat, lon) = match (self.latitude(id), self.longitude(id)) {
                (Ok(lat), Ok(lon)) => (lat, lon),
                _ => continue,
            };
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                problems.push(format!("node {index} has invalid coordinates {lat},{lon}"));
            }

            let head = EdgeId::from_raw(self.node_cell(index, node::EDGE_REF));
            for state in EdgeIter::new(self, id, Dir::Both, head) {
                let state = match state {
                    Ok(state) => state,
                    Err(err) => {
                        problems.push(format!("node {index}: adjacency list unreadable: {err}"));
                        break;
                    }
                };
                let (a, b) = self.endpoints(state.edge.0);
                if a != index && b != index {
                    problems.push(format!(
                        "edge {} in node {index}'s list connects {a} and {b}",
                        state.edge
                    ));
                }
                if state.adj.0 >= self.node_count {
                    problems.push(format!(
                        "edge {} of node {index} points to {} past node count {}",
                        state.edge, state.adj, self.node_count
                    ));
                }
            }
        }
        if !problems.is_empty() {
            warn!(problems = problems.len(), "graph.verify.problems");
        }
        problems
    }
}
