//! Narrow read-only capabilities that search and path code depend on.

use crate::types::{EdgeId, NodeId, Result};

use super::cursor::{Dir, EdgeIter, EdgeState};
use super::geo::{GeoPoint, PointList};
use super::graph::GraphStorage;
use super::payload::{Level, Payload, Shortcut};

/// Read access to adjacency, edge lookup and coordinates.
pub trait RoutingGraph {
    /// Payload decoded with every edge.
    type EdgeData: Copy + std::fmt::Debug + PartialEq;

    /// Iterator returned by [`RoutingGraph::edges`].
    type Edges<'a>: Iterator<Item = Result<EdgeState<Self::EdgeData>>>
    where
        Self: 'a;

    /// Number of node slots.
    fn node_count(&self) -> u32;

    /// Edges of `node` accepted by `dir`.
    fn edges(&self, node: NodeId, dir: Dir) -> Self::Edges<'_>;

    /// `edge` oriented so that `end` is the adjacent node.
    fn edge_props(&self, edge: EdgeId, end: NodeId) -> Result<Option<EdgeState<Self::EdgeData>>>;

    /// Pillar points of `state`, ordered from its base node.
    fn way_geometry(&self, state: &EdgeState<Self::EdgeData>) -> Result<PointList>;

    /// Coordinates of `node`.
    fn point(&self, node: NodeId) -> Result<GeoPoint>;
}

/// Hierarchy information on top of [`RoutingGraph`].
pub trait LevelView: RoutingGraph<EdgeData = Shortcut> {
    /// Hierarchy level of `node`.
    fn level(&self, node: NodeId) -> Result<i32>;
}

impl<X: Payload> RoutingGraph for GraphStorage<X> {
    type EdgeData = X::EdgeData;
    type Edges<'a> = EdgeIter<'a, X>
    where
        Self: 'a;

    fn node_count(&self) -> u32 {
        GraphStorage::node_count(self)
    }

    fn edges(&self, node: NodeId, dir: Dir) -> EdgeIter<'_, X> {
        GraphStorage::edges(self, node, dir)
    }

    fn edge_props(&self, edge: EdgeId, end: NodeId) -> Result<Option<EdgeState<X::EdgeData>>> {
        GraphStorage::edge_props(self, edge, end)
    }

    fn way_geometry(&self, state: &EdgeState<X::EdgeData>) -> Result<PointList> {
        GraphStorage::way_geometry(self, state)
    }

    fn point(&self, node: NodeId) -> Result<GeoPoint> {
        Ok(GeoPoint::new(self.latitude(node)?, self.longitude(node)?))
    }
}

impl LevelView for GraphStorage<Level> {
    fn level(&self, node: NodeId) -> Result<i32> {
        GraphStorage::level(self, node)
    }
}
