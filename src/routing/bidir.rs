use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::storage::{Dir, RoutingGraph};
use crate::types::{NodeId, Result};

use super::path::{Path, PathBidirRef};
use super::spt::{EntryRef, ShortestPathTree, SptEntry};
use super::weighting::{Shortest, Weighting};

/// Heap item ordered so that [`BinaryHeap`] pops the lowest weight first.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    weight: f64,
    entry: EntryRef,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other.weight.total_cmp(&self.weight)
    }
}

/// One direction of the search.
struct Side {
    dir: Dir,
    best: FxHashMap<NodeId, EntryRef>,
    heap: BinaryHeap<Candidate>,
    settled: FxHashSet<NodeId>,
    current: Option<EntryRef>,
}

impl Side {
    fn new(dir: Dir, root: EntryRef, node: NodeId) -> Self {
        let mut best = FxHashMap::default();
        best.insert(node, root);
        Self {
            dir,
            best,
            heap: BinaryHeap::new(),
            settled: FxHashSet::default(),
            current: Some(root),
        }
    }
}

/// Cheapest meeting found so far.
#[derive(Clone, Copy, Debug)]
struct Meeting {
    entry: EntryRef,
    other: EntryRef,
    switch_to_from: bool,
    weight: f64,
}

/// Bidirectional Dijkstra growing one tree from the source over outgoing
/// edges and one from the target over incoming edges.
///
/// The search stops once the two frontier weights together reach the best
/// meeting weight; the two chains are then merged by [`PathBidirRef`].
pub struct DijkstraBidirectionRef<'a, G, W = Shortest> {
    graph: &'a G,
    weighting: W,
    skip_nodes: FxHashSet<NodeId>,
    visited: usize,
}

impl<'a, G: RoutingGraph> DijkstraBidirectionRef<'a, G, Shortest> {
    /// Shortest-distance search over `graph`.
    pub fn new(graph: &'a G) -> Self {
        Self::with_weighting(graph, Shortest)
    }
}

impl<'a, G: RoutingGraph, W: Weighting> DijkstraBidirectionRef<'a, G, W> {
    /// Search over `graph` minimising `weighting`.
    pub fn with_weighting(graph: &'a G, weighting: W) -> Self {
        Self {
            graph,
            weighting,
            skip_nodes: FxHashSet::default(),
            visited: 0,
        }
    }

    /// Excludes `node` from every later search.
    pub fn add_skip_node(&mut self, node: NodeId) -> &mut Self {
        self.skip_nodes.insert(node);
        self
    }

    /// Nodes settled by the last [`Self::calc_path`].
    pub fn calc_visited_nodes(&self) -> usize {
        self.visited
    }

    /// Finds the cheapest route from `from` to `to`.
    ///
    /// `from == to` yields [`Path::not_found`].
    pub fn calc_path(&mut self, from: NodeId, to: NodeId) -> Result<Path> {
        self.visited = 0;
        if from == to {
            return Ok(Path::not_found());
        }
        let mut tree = ShortestPathTree::new();
        let from_root = tree.push(SptEntry::root(from));
        let to_root = tree.push(SptEntry::root(to));
        let mut forward = Side::new(Dir::Out, from_root, from);
        let mut backward = Side::new(Dir::In, to_root, to);
        let mut best: Option<Meeting> = None;

        while !self.finished(&tree, &forward, &backward, best)? {
            self.expand(&mut tree, &mut forward, &backward, &mut best, false)?;
            self.expand(&mut tree, &mut backward, &forward, &mut best, true)?;
        }

        let path = match best {
            Some(meeting) => PathBidirRef::new(self.graph, &self.weighting)
                .edge_entry(Some(meeting.entry))
                .edge_entry_to(Some(meeting.other))
                .switch_to_from(meeting.switch_to_from)
                .extract(&tree)?,
            None => Path::not_found(),
        };
        debug!(
            weighting = self.weighting.name(),
            from = from.0,
            to = to.0,
            found = path.found(),
            weight = path.weight(),
            visited = self.visited,
            "routing.bidir.complete"
        );
        Ok(path)
    }

    fn finished(
        &self,
        tree: &ShortestPathTree,
        forward: &Side,
        backward: &Side,
        best: Option<Meeting>,
    ) -> Result<bool> {
        let best = best.map_or(f64::INFINITY, |m| m.weight);
        let weight_of = |side: &Side| -> Result<Option<f64>> {
            side.current
                .map(|entry| tree.get(entry).map(|e| e.weight))
                .transpose()
        };
        Ok(match (weight_of(forward)?, weight_of(backward)?) {
            (None, None) => true,
            (None, Some(to)) => to >= best,
            (Some(from), None) => from >= best,
            (Some(from), Some(to)) => from + to >= best,
        })
    }

    /// Relaxes the edges of `side`'s current node and advances to the next.
    fn expand(
        &mut self,
        tree: &mut ShortestPathTree,
        side: &mut Side,
        other: &Side,
        best: &mut Option<Meeting>,
        switch_to_from: bool,
    ) -> Result<()> {
        let Some(current) = side.current else {
            return Ok(());
        };
        let SptEntry {
            end_node: node,
            weight: base_weight,
            ..
        } = *tree.get(current)?;

        let graph = self.graph;
        for state in graph.edges(node, side.dir) {
            let state = state?;
            let adj = state.adj;
            if self.skip_nodes.contains(&adj) {
                continue;
            }
            let weight = base_weight + self.weighting.weight(state.distance, state.flags);
            let entry = match side.best.get(&adj).copied() {
                None => {
                    let entry = tree.push(SptEntry {
                        edge: Some(state.edge),
                        end_node: adj,
                        weight,
                        parent: Some(current),
                    });
                    side.best.insert(adj, entry);
                    side.heap.push(Candidate { weight, entry });
                    entry
                }
                Some(entry) => {
                    let known = tree.get_mut(entry)?;
                    if known.weight > weight {
                        known.edge = Some(state.edge);
                        known.weight = weight;
                        known.parent = Some(current);
                        side.heap.push(Candidate { weight, entry });
                    }
                    entry
                }
            };

            if let Some(&meet) = other.best.get(&adj) {
                let total = tree.get(entry)?.weight + tree.get(meet)?.weight;
                if best.map_or(true, |m| total < m.weight) {
                    *best = Some(Meeting {
                        entry,
                        other: meet,
                        switch_to_from,
                        weight: total,
                    });
                }
            }
        }

        side.settled.insert(node);
        self.visited += 1;
        side.current = None;
        while let Some(candidate) = side.heap.pop() {
            let entry = tree.get(candidate.entry)?;
            if candidate.weight > entry.weight || side.settled.contains(&entry.end_node) {
                continue;
            }
            side.current = Some(candidate.entry);
            break;
        }
        Ok(())
    }
}
