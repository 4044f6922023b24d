//! Read iterators and the write cursor over adjacency lists.

use crate::types::{EdgeId, NodeId, Result};

use super::flags::EdgeFlags;
use super::geo::{self, PointList};
use super::graph::{link_cell, GraphStorage, MAX_ADJACENCY_HOPS};
use super::payload::{edge, Payload};

/// Direction filter applied while walking a node's adjacency list.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Dir {
    /// Edges that can be travelled away from the base node.
    Out,
    /// Edges that can be travelled towards the base node.
    In,
    /// Every incident edge.
    Both,
}

impl Dir {
    /// True when edges leaving the base node are accepted.
    pub fn includes_out(self) -> bool {
        matches!(self, Dir::Out | Dir::Both)
    }

    /// True when edges arriving at the base node are accepted.
    pub fn includes_in(self) -> bool {
        matches!(self, Dir::In | Dir::Both)
    }

    /// Whether an edge with `flags` (oriented from the base node) passes.
    pub fn accepts(self, flags: EdgeFlags) -> bool {
        (self.includes_in() || flags.is_forward()) && (self.includes_out() || flags.is_backward())
    }
}

/// One edge as seen from a base node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeState<E = ()> {
    /// Edge id.
    pub edge: EdgeId,
    /// Node the edge was reached from.
    pub base: NodeId,
    /// The other endpoint.
    pub adj: NodeId,
    /// Flags oriented from `base` towards `adj`.
    pub flags: EdgeFlags,
    /// Length in meters.
    pub distance: f64,
    /// Payload-specific data, `()` for plain graphs.
    pub data: E,
}

/// Iterator over the adjacency list of one node.
///
/// Yields `Err` once and then stops when the list is structurally broken.
pub struct EdgeIter<'a, X: Payload> {
    graph: &'a GraphStorage<X>,
    base: NodeId,
    dir: Dir,
    next: Option<EdgeId>,
    hops: usize,
    done: bool,
}

impl<'a, X: Payload> EdgeIter<'a, X> {
    pub(super) fn new(
        graph: &'a GraphStorage<X>,
        base: NodeId,
        dir: Dir,
        head: Option<EdgeId>,
    ) -> Self {
        Self {
            graph,
            base,
            dir,
            next: head,
            hops: 0,
            done: false,
        }
    }

    /// Node whose list is walked.
    pub fn base(&self) -> NodeId {
        self.base
    }

    fn advance(&mut self) -> Result<Option<EdgeState<X::EdgeData>>> {
        let graph = self.graph;
        let base = self.base.0;
        while let Some(current) = self.next {
            if self.hops >= MAX_ADJACENCY_HOPS {
                return Err(graph.corruption(
                    base,
                    format!("no end of adjacency list after {MAX_ADJACENCY_HOPS} hops"),
                ));
            }
            self.hops += 1;
            graph.check_link(base, current.0)?;
            let adj = graph.other_node(base, current.0);
            let next = graph.edge_cell(current.0, link_cell(base, adj));
            if next == current.0 as i32 {
                return Err(graph.corruption(base, format!("edge {current} links to itself")));
            }
            self.next = EdgeId::from_raw(next);
            let state = graph.read_state(current.0, base, adj);
            if self.dir.accepts(state.flags) {
                return Ok(Some(state));
            }
        }
        Ok(None)
    }
}

impl<X: Payload> Iterator for EdgeIter<'_, X> {
    type Item = Result<EdgeState<X::EdgeData>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(state)) => Some(Ok(state)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<X: Payload> std::iter::FusedIterator for EdgeIter<'_, X> {}

/// A stored edge record in canonical orientation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawEdge {
    /// Edge id.
    pub edge: EdgeId,
    /// Lower endpoint.
    pub node_a: NodeId,
    /// Higher endpoint.
    pub node_b: NodeId,
    /// Length in meters.
    pub distance: f64,
    /// Flags relative to `node_a`.
    pub flags: EdgeFlags,
}

/// Iterator over every edge record, including edges no longer linked.
pub struct AllEdges<'a, X: Payload> {
    graph: &'a GraphStorage<X>,
    next: u32,
}

impl<X: Payload> Iterator for AllEdges<'_, X> {
    type Item = RawEdge;

    fn next(&mut self) -> Option<RawEdge> {
        if self.next >= self.graph.edge_count {
            return None;
        }
        let id = self.next;
        self.next += 1;
        let (a, b) = self.graph.endpoints(id);
        Some(RawEdge {
            edge: EdgeId(id),
            node_a: NodeId(a),
            node_b: NodeId(b),
            distance: geo::int_to_dist(self.graph.edge_cell(id, edge::DIST)),
            flags: EdgeFlags::from_raw(self.graph.edge_cell(id, edge::FLAGS)),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.graph.edge_count - self.next) as usize;
        (left, Some(left))
    }
}

impl<X: Payload> GraphStorage<X> {
    /// Iterates all edge records by id.
    pub fn all_edges(&self) -> AllEdges<'_, X> {
        AllEdges {
            graph: self,
            next: 0,
        }
    }
}

/// Exclusive handle on one edge, oriented from `base` to `adj`.
///
/// Returned by [`GraphStorage::add_edge`] and [`GraphStorage::edge_props_mut`];
/// holds the storage mutably, so no iterator can observe a half-written edge.
pub struct EdgeCursorMut<'a, X: Payload> {
    pub(super) graph: &'a mut GraphStorage<X>,
    edge: EdgeId,
    base: NodeId,
    adj: NodeId,
}

impl<'a, X: Payload> EdgeCursorMut<'a, X> {
    pub(super) fn new(graph: &'a mut GraphStorage<X>, edge: EdgeId, base: NodeId, adj: NodeId) -> Self {
        Self {
            graph,
            edge,
            base,
            adj,
        }
    }

    /// Edge id.
    pub fn edge(&self) -> EdgeId {
        self.edge
    }

    /// Node the cursor is oriented from.
    pub fn base(&self) -> NodeId {
        self.base
    }

    /// The other endpoint.
    pub fn adj(&self) -> NodeId {
        self.adj
    }

    /// Current record as seen from `base`.
    pub fn state(&self) -> EdgeState<X::EdgeData> {
        self.graph.read_state(self.edge.0, self.base.0, self.adj.0)
    }

    /// Flags oriented from `base`.
    pub fn flags(&self) -> EdgeFlags {
        self.state().flags
    }

    /// Length in meters.
    pub fn distance(&self) -> f64 {
        geo::int_to_dist(self.graph.edge_cell(self.edge.0, edge::DIST))
    }

    /// Overwrites the length.
    pub fn set_distance(&mut self, meters: f64) -> &mut Self {
        self.graph
            .set_edge_cell(self.edge.0, edge::DIST, geo::dist_to_int(meters));
        self
    }

    /// Overwrites the flags; `flags` are read relative to `base`.
    pub fn set_flags(&mut self, flags: EdgeFlags) -> &mut Self {
        let (edge, base, adj) = (self.edge.0, self.base.0, self.adj.0);
        let link_base = self.graph.edge_cell(edge, link_cell(base, adj));
        let link_adj = self.graph.edge_cell(edge, link_cell(adj, base));
        let distance = self.graph.edge_cell(edge, edge::DIST);
        self.graph
            .write_edge(edge, base, adj, link_base, link_adj, distance, flags);
        self
    }

    /// Pillar points ordered from `base`.
    pub fn way_geometry(&self) -> Result<PointList> {
        self.graph
            .read_geometry(self.edge.0, self.base.0, self.adj.0)
    }

    /// Stores pillar points given in order from `base`; empty clears them.
    ///
    /// Each call appends a new block to the geometry store.
    pub fn set_way_geometry(&mut self, points: &PointList) -> Result<&mut Self> {
        self.graph
            .write_geometry(self.edge.0, self.base.0, self.adj.0, points)?;
        Ok(self)
    }
}
