use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::storage::{EdgeState, PointList, RoutingGraph};
use crate::types::{EdgeId, GraphError, NodeId, Result};

use super::spt::{EntryRef, ShortestPathTree};
use super::weighting::{travel_time, Weighting};

/// A route through the graph, or the empty not-found result.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Path {
    found: bool,
    nodes: Vec<NodeId>,
    edges: Vec<EdgeId>,
    points: PointList,
    weight: f64,
    distance: f64,
    time: f64,
    #[serde(skip)]
    elapsed: Duration,
}

impl Path {
    /// The result of a search that reached no target.
    pub fn not_found() -> Self {
        Self::default()
    }

    /// True when a route exists.
    pub fn found(&self) -> bool {
        self.found
    }

    /// Tower nodes from start to target.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Traversed edge ids in order.
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Tower and pillar coordinates from start to target.
    pub fn points(&self) -> &PointList {
        &self.points
    }

    /// Sum of edge weights under the search's weighting.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Length in meters.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Travel time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Time spent assembling the path. Diagnostic only.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Merges a forward and a backward shortest-path-tree chain into a [`Path`].
///
/// Both chains must end at the same meeting node: `edge_entry` is the entry of
/// the search started at the source, `edge_entry_to` the one started at the
/// target. With `switch_to_from` set the two roles are swapped first.
pub struct PathBidirRef<'a, G: ?Sized, W> {
    graph: &'a G,
    weighting: W,
    edge_entry: Option<EntryRef>,
    edge_entry_to: Option<EntryRef>,
    switch_to_from: bool,
}

impl<'a, G, W> PathBidirRef<'a, G, W>
where
    G: RoutingGraph + ?Sized,
    W: Weighting,
{
    /// Creates an extractor with no chains attached.
    pub fn new(graph: &'a G, weighting: W) -> Self {
        Self {
            graph,
            weighting,
            edge_entry: None,
            edge_entry_to: None,
            switch_to_from: false,
        }
    }

    /// Sets the meeting entry of the source-side chain.
    pub fn edge_entry(mut self, entry: Option<EntryRef>) -> Self {
        self.edge_entry = entry;
        self
    }

    /// Sets the meeting entry of the target-side chain.
    pub fn edge_entry_to(mut self, entry: Option<EntryRef>) -> Self {
        self.edge_entry_to = entry;
        self
    }

    /// Swaps the roles of the two chains before extraction.
    pub fn switch_to_from(mut self, switch: bool) -> Self {
        self.switch_to_from = switch;
        self
    }

    /// Walks both chains from the meeting node to their roots.
    ///
    /// A missing chain yields [`Path::not_found`]. Chains that do not share a
    /// meeting node, or that reference edges not touching their end nodes,
    /// are reported as [`GraphError::Corruption`].
    pub fn extract(&self, tree: &ShortestPathTree) -> Result<Path> {
        let (Some(from_entry), Some(to_entry)) = (self.edge_entry, self.edge_entry_to) else {
            return Ok(Path::not_found());
        };
        let meeting_from = self.meeting_node(tree, from_entry)?;
        let meeting_to = self.meeting_node(tree, to_entry)?;
        if meeting_from != meeting_to {
            return Err(GraphError::Corruption(format!(
                "chains meet at different nodes: {meeting_from} and {meeting_to}"
            )));
        }

        let started = Instant::now();
        let (head, tail) = if self.switch_to_from {
            (to_entry, from_entry)
        } else {
            (from_entry, to_entry)
        };

        // A chain can hold each entry at most once; anything longer loops.
        let limit = tree.len();
        let mut states = Vec::new();
        let mut current = head;
        while let Some(edge) = tree.get(current)?.edge {
            if states.len() >= limit {
                return Err(cyclic_chain(limit));
            }
            states.push(self.props(edge, tree.get(current)?.end_node)?);
            current = tree.parent(current)?;
        }
        let from = tree.get(current)?.end_node;
        states.reverse();

        let head_len = states.len();
        let mut current = tail;
        while let Some(edge) = tree.get(current)?.edge {
            if states.len() - head_len >= limit {
                return Err(cyclic_chain(limit));
            }
            let parent = tree.parent(current)?;
            states.push(self.props(edge, tree.get(parent)?.end_node)?);
            current = parent;
        }

        let mut path = self.assemble(from, &states)?;
        path.elapsed = started.elapsed();
        debug!(
            nodes = path.nodes.len(),
            weight = path.weight,
            elapsed_us = path.elapsed.as_micros() as u64,
            "routing.path.extract"
        );
        Ok(path)
    }

    fn meeting_node(&self, tree: &ShortestPathTree, entry: EntryRef) -> Result<NodeId> {
        let entry = tree.get(entry)?;
        if let Some(edge) = entry.edge {
            self.props(edge, entry.end_node)?;
        }
        Ok(entry.end_node)
    }

    fn props(&self, edge: EdgeId, end: NodeId) -> Result<EdgeState<G::EdgeData>> {
        self.graph.edge_props(edge, end)?.ok_or_else(|| {
            GraphError::Corruption(format!("edge {edge} does not end at node {end}"))
        })
    }

    fn assemble(&self, from: NodeId, states: &[EdgeState<G::EdgeData>]) -> Result<Path> {
        let mut path = Path {
            found: true,
            nodes: Vec::with_capacity(states.len() + 1),
            edges: Vec::with_capacity(states.len()),
            ..Path::default()
        };
        path.nodes.push(from);
        let tower = self.graph.point(from)?;
        path.points.push(tower.lat, tower.lon);

        let mut last = from;
        for state in states {
            if state.base != last {
                return Err(GraphError::Corruption(format!(
                    "edge {} starts at {} but the path is at {last}",
                    state.edge, state.base
                )));
            }
            path.distance += state.distance;
            path.weight += self.weighting.weight(state.distance, state.flags);
            path.time += travel_time(state.distance, state.flags);
            path.edges.push(state.edge);
            path.nodes.push(state.adj);

            for pillar in self.graph.way_geometry(state)?.iter() {
                path.points.push(pillar.lat, pillar.lon);
            }
            let tower = self.graph.point(state.adj)?;
            path.points.push(tower.lat, tower.lon);
            last = state.adj;
        }
        Ok(path)
    }
}

fn cyclic_chain(limit: usize) -> GraphError {
    GraphError::Corruption(format!("tree chain longer than its {limit} entries"))
}
