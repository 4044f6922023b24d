#![forbid(unsafe_code)]

use std::fmt::Write as _;
use std::marker::PhantomData;
use std::sync::Arc;

use roaring::RoaringBitmap;
use tracing::{debug, info, warn};

use crate::primitives::store::{DataAccess, Directory};
use crate::types::{EdgeId, GraphError, NodeId, Result, NO_EDGE};

use super::cursor::{Dir, EdgeCursorMut, EdgeIter, EdgeState};
use super::flags::EdgeFlags;
use super::geo::{self, BBox, PointList};
use super::metrics::{default_metrics, StorageMetrics};
use super::options::GraphOptions;
use super::payload::{edge, node, Payload, Plain};

const INT_BYTES: u64 = 4;

/// Upper bound on adjacency-list hops before a walk is reported as corrupt.
pub const MAX_ADJACENCY_HOPS: usize = 10_000;

/// Smallest number of records allocated by [`GraphStorage::create`].
const MIN_INIT_RECORDS: u64 = 100;

mod header {
    //! Header slots written on flush.
    pub const NODES_FINGERPRINT: usize = 0;
    pub const NODES_ENTRY_INTS: usize = 1;
    pub const NODES_COUNT: usize = 2;
    pub const NODES_MIN_LON: usize = 3;
    pub const NODES_MAX_LON: usize = 4;
    pub const NODES_MIN_LAT: usize = 5;
    pub const NODES_MAX_LAT: usize = 6;
    pub const EDGES_ENTRY_INTS: usize = 0;
    pub const EDGES_COUNT: usize = 1;
    pub const GEOMETRY_MAX_REF: usize = 0;
}

/// Node and edge arrays with adjacency lists threaded through the edge records.
///
/// Each node record holds the id of one incident edge; each edge record holds
/// the next edge for both endpoints, so a node's incident edges form a singly
/// linked list without any per-node allocation. Edges are stored once with
/// `node_a <= node_b`, and direction flags are swapped on read when viewed from
/// the higher endpoint.
///
/// Life cycle: construct with [`GraphStorage::new`], then either
/// [`GraphStorage::create`] or [`GraphStorage::load`], then use.
/// The storage is single-writer: mutation needs `&mut self`, so readers and
/// writers cannot interleave on the same instance.
pub struct GraphStorage<X: Payload = Plain> {
    pub(super) directory: Directory,
    pub(super) nodes: Box<dyn DataAccess>,
    pub(super) edges: Box<dyn DataAccess>,
    pub(super) geometry: Box<dyn DataAccess>,
    pub(super) node_ints: u64,
    pub(super) edge_ints: u64,
    pub(super) node_count: u32,
    pub(super) edge_count: u32,
    /// Next free cell in the geometry store; 0 is reserved for "no geometry".
    pub(super) max_geo_ref: u32,
    pub(super) bounds: BBox,
    pub(super) removed: Option<RoaringBitmap>,
    pub(super) initialized: bool,
    pub(super) node_hint: u32,
    pub(super) metrics: Arc<dyn StorageMetrics>,
    _payload: PhantomData<fn() -> X>,
}

impl<X: Payload> GraphStorage<X> {
    /// Binds the three stores in `options.directory`. Nothing is allocated
    /// until [`Self::create`] or [`Self::load`].
    pub fn new(options: GraphOptions) -> Result<Self> {
        let GraphOptions {
            directory,
            segment_size,
            node_hint,
            metrics,
        } = options;
        let nodes = directory.find_create("nodes", segment_size)?;
        let edges = directory.find_create("edges", segment_size)?;
        let geometry = directory.find_create("geometry", segment_size)?;
        Ok(Self {
            directory,
            nodes,
            edges,
            geometry,
            node_ints: X::node_ints() as u64,
            edge_ints: X::edge_ints() as u64,
            node_count: 0,
            edge_count: 0,
            max_geo_ref: 1,
            bounds: BBox::INVERSE,
            removed: None,
            initialized: false,
            node_hint,
            metrics: metrics.unwrap_or_else(default_metrics),
            _payload: PhantomData,
        })
    }

    /// Convenience constructor: an in-memory storage created with defaults.
    pub fn in_memory() -> Result<Self> {
        let mut graph = Self::new(GraphOptions::default())?;
        graph.create_default()?;
        Ok(graph)
    }

    /// Directory the stores live in.
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Changes the segment size of all stores; only valid before creation.
    pub fn set_segment_size(&mut self, bytes: u32) -> Result<()> {
        if self.initialized {
            return Err(GraphError::Config(
                "segment size cannot change after create or load".into(),
            ));
        }
        self.nodes.set_segment_size(bytes)?;
        self.edges.set_segment_size(bytes)?;
        self.geometry.set_segment_size(bytes)
    }

    /// Allocates empty stores sized for about `node_hint` nodes.
    pub fn create(&mut self, node_hint: u32) -> Result<()> {
        self.check_not_initialized()?;
        let records = (u64::from(node_hint) * 4).max(MIN_INIT_RECORDS);
        self.nodes.create(records * self.node_ints * INT_BYTES)?;
        self.init_node_records(0, self.node_capacity());
        self.edges.create(records * self.edge_ints * INT_BYTES)?;
        self.geometry.create(records * INT_BYTES)?;
        self.initialized = true;
        info!(
            kind = X::KIND,
            node_hint,
            node_capacity = self.node_capacity(),
            "graph.create"
        );
        Ok(())
    }

    /// [`Self::create`] with the hint from [`GraphOptions::node_hint`].
    pub fn create_default(&mut self) -> Result<()> {
        self.create(self.node_hint)
    }

    /// Number of node slots in use (highest referenced id + 1).
    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    /// Number of edges ever created; ids are `0..edge_count`.
    pub fn edge_count(&self) -> u32 {
        self.edge_count
    }

    /// Bounding box of every coordinate written so far.
    pub fn bounds(&self) -> BBox {
        self.bounds
    }

    /// Writes the node's coordinates, growing the node array if needed.
    pub fn set_node(&mut self, node: NodeId, lat: f64, lon: f64) -> Result<()> {
        self.ensure_node_index(node.0)?;
        self.set_node_cell(node.0, node::LAT, geo::degree_to_int(lat));
        self.set_node_cell(node.0, node::LON, geo::degree_to_int(lon));
        self.bounds.update(lat, lon);
        Ok(())
    }

    /// Latitude of `node` in degrees.
    pub fn latitude(&self, node: NodeId) -> Result<f64> {
        self.check_node(node)?;
        Ok(geo::int_to_degree(self.node_cell(node.0, node::LAT)))
    }

    /// Longitude of `node` in degrees.
    pub fn longitude(&self, node: NodeId) -> Result<f64> {
        self.check_node(node)?;
        Ok(geo::int_to_degree(self.node_cell(node.0, node::LON)))
    }

    /// Adds an edge between `a` and `b` and returns a cursor oriented from `a`.
    ///
    /// `flags` are read relative to `a`; the edge is stored with the lower id
    /// first and the flags swapped to match. A self-loop is linked once.
    pub fn add_edge(
        &mut self,
        a: NodeId,
        b: NodeId,
        distance: f64,
        flags: EdgeFlags,
    ) -> Result<EdgeCursorMut<'_, X>> {
        self.ensure_node_index(a.0.max(b.0))?;
        let edge = self.internal_edge_add(a.0, b.0, geo::dist_to_int(distance), flags)?;
        self.metrics.edge_created();
        Ok(EdgeCursorMut::new(self, EdgeId(edge), a, b))
    }

    /// Adds an edge with the default car flags.
    pub fn add_road(
        &mut self,
        a: NodeId,
        b: NodeId,
        distance: f64,
        both_directions: bool,
    ) -> Result<EdgeCursorMut<'_, X>> {
        self.add_edge(a, b, distance, EdgeFlags::default_car(both_directions))
    }

    /// Iterates the edges of `node` accepted by `dir`.
    ///
    /// Nodes past [`Self::node_count`] yield nothing.
    pub fn edges(&self, node: NodeId, dir: Dir) -> EdgeIter<'_, X> {
        self.metrics.adjacency_scan(dir);
        let head = if node.0 < self.node_count {
            EdgeId::from_raw(self.node_cell(node.0, node::EDGE_REF))
        } else {
            None
        };
        EdgeIter::new(self, node, dir, head)
    }

    /// Outgoing edges of `node`.
    pub fn outgoing(&self, node: NodeId) -> EdgeIter<'_, X> {
        self.edges(node, Dir::Out)
    }

    /// Incoming edges of `node`.
    pub fn incoming(&self, node: NodeId) -> EdgeIter<'_, X> {
        self.edges(node, Dir::In)
    }

    /// Number of edges of `node` accepted by `dir`.
    pub fn degree(&self, node: NodeId, dir: Dir) -> Result<usize> {
        let mut count = 0;
        for state in self.edges(node, dir) {
            state?;
            count += 1;
        }
        Ok(count)
    }

    /// Resolves `edge` oriented so that `end` is the adjacent node.
    ///
    /// Returns `Ok(None)` when `end` is neither endpoint.
    pub fn edge_props(
        &self,
        edge: EdgeId,
        end: NodeId,
    ) -> Result<Option<EdgeState<X::EdgeData>>> {
        let Some((base, adj)) = self.orient_towards(edge, end)? else {
            return Ok(None);
        };
        Ok(Some(self.read_state(edge.0, base, adj)))
    }

    /// Mutable variant of [`Self::edge_props`].
    pub fn edge_props_mut(
        &mut self,
        edge: EdgeId,
        end: NodeId,
    ) -> Result<Option<EdgeCursorMut<'_, X>>> {
        let Some((base, adj)) = self.orient_towards(edge, end)? else {
            return Ok(None);
        };
        Ok(Some(EdgeCursorMut::new(self, edge, NodeId(base), NodeId(adj))))
    }

    /// Pillar points of the edge, ordered from `state.base` towards `state.adj`.
    ///
    /// Ids outside the graph are `OutOfBounds`; a state whose nodes are not
    /// the edge's endpoints is `Invalid`.
    pub fn way_geometry<E>(&self, state: &EdgeState<E>) -> Result<PointList> {
        self.check_state(state)?;
        self.read_geometry(state.edge.0, state.base.0, state.adj.0)
    }

    /// Renders the records around `node` and its adjacency list.
    pub fn debug_dump(&self, node: NodeId, area: u32) -> String {
        let mut out = String::new();
        let _ = write!(out, "--- node {node} ---");
        let min = node.0.saturating_sub(area / 2);
        let max = self.node_count.min(node.0.saturating_add(area / 2 + 1));
        for index in min..max {
            let cells: Vec<String> = (0..self.node_ints)
                .map(|cell| self.node_cell(index, cell).to_string())
                .collect();
            let _ = write!(out, "\n{index}: {}", cells.join(",\t"));
        }
        if node.0 >= self.node_count {
            return out;
        }
        let mut current = self.node_cell(node.0, node::EDGE_REF);
        let _ = write!(out, "\n--- edges {current} ---");
        for _ in 0..1000 {
            if current <= NO_EDGE || current as u32 >= self.edge_count {
                break;
            }
            let edge = current as u32;
            let cells: Vec<String> = (0..self.edge_ints)
                .map(|cell| self.edge_cell(edge, cell).to_string())
                .collect();
            let _ = write!(out, "\n{edge}: {}", cells.join(",\t"));
            let other = self.other_node(node.0, edge);
            current = self.edge_cell(edge, link_cell(node.0, other));
        }
        out
    }

    /// Copies all records into `other`, which must use the same record widths.
    pub fn copy_to<Y: Payload>(&self, other: &mut GraphStorage<Y>) -> Result<()> {
        if other.node_ints != self.node_ints || other.edge_ints != self.edge_ints {
            return Err(GraphError::Config(format!(
                "record widths differ: nodes {} vs {}, edges {} vs {}; use copy_to_generic",
                self.node_ints, other.node_ints, self.edge_ints, other.edge_ints
            )));
        }
        self.edges.copy_to(other.edges.as_mut())?;
        other.edge_count = self.edge_count;
        self.nodes.copy_to(other.nodes.as_mut())?;
        other.init_node_records(self.node_capacity(), other.node_capacity());
        other.node_count = self.node_count;
        self.geometry.copy_to(other.geometry.as_mut())?;
        other.max_geo_ref = self.max_geo_ref;
        other.bounds = self.bounds;
        other.removed = self.removed.clone();
        other.initialized = true;
        debug!(
            nodes = self.node_count,
            edges = self.edge_count,
            "graph.copy.complete"
        );
        Ok(())
    }

    /// Copies this graph into a new storage bound to `directory`.
    pub fn copy_to_directory(&self, directory: &Directory) -> Result<GraphStorage<X>> {
        if directory.same_location(&self.directory) {
            return Err(GraphError::Config(format!(
                "cannot copy graph into its own directory {directory:?}"
            )));
        }
        let options = GraphOptions::new(directory.clone())
            .segment_size(self.nodes.segment_size())
            .node_hint(self.node_hint)
            .metrics(Arc::clone(&self.metrics));
        let mut copy = GraphStorage::<X>::new(options)?;
        self.copy_to(&mut copy)?;
        Ok(copy)
    }

    /// Re-inserts every node and linked edge into `other`, whatever its layout.
    ///
    /// Edge ids in `other` follow insertion order and may differ from ours.
    pub fn copy_to_generic<Y: Payload>(&self, other: &mut GraphStorage<Y>) -> Result<()> {
        if !other.initialized {
            other.create(self.node_count)?;
        }
        for index in 0..self.node_count {
            let node = NodeId(index);
            other.set_node(node, self.latitude(node)?, self.longitude(node)?)?;
        }
        let mut seen = RoaringBitmap::new();
        for index in 0..self.node_count {
            for state in self.edges(NodeId(index), Dir::Both) {
                let state = state?;
                if !seen.insert(state.edge.0) {
                    continue;
                }
                let points = self.way_geometry(&state)?;
                let mut cursor = other.add_edge(state.base, state.adj, state.distance, state.flags)?;
                if !points.is_empty() {
                    cursor.set_way_geometry(&points)?;
                }
            }
        }
        Ok(())
    }

    /// Persists headers and all three stores.
    pub fn flush(&mut self) -> Result<()> {
        self.check_initialized()?;
        self.nodes.set_header(header::NODES_FINGERPRINT, X::fingerprint());
        self.nodes.set_header(header::NODES_ENTRY_INTS, self.node_ints as i32);
        self.nodes.set_header(header::NODES_COUNT, self.node_count as i32);
        self.nodes.set_header(header::NODES_MIN_LON, geo::degree_to_int(self.bounds.min_lon));
        self.nodes.set_header(header::NODES_MAX_LON, geo::degree_to_int(self.bounds.max_lon));
        self.nodes.set_header(header::NODES_MIN_LAT, geo::degree_to_int(self.bounds.min_lat));
        self.nodes.set_header(header::NODES_MAX_LAT, geo::degree_to_int(self.bounds.max_lat));

        self.edges.set_header(header::EDGES_ENTRY_INTS, self.edge_ints as i32);
        self.edges.set_header(header::EDGES_COUNT, self.edge_count as i32);

        self.geometry.set_header(header::GEOMETRY_MAX_REF, self.max_geo_ref as i32);

        self.geometry.flush()?;
        self.edges.flush()?;
        self.nodes.flush()?;
        info!(
            nodes = self.node_count,
            edges = self.edge_count,
            geometry_cells = self.max_geo_ref,
            "graph.flush.complete"
        );
        Ok(())
    }

    /// Restores a previously flushed graph.
    ///
    /// Returns `Ok(false)` when the directory holds no edge store. A missing
    /// node or geometry store, a version disagreement or a layout fingerprint
    /// from another variant is a configuration error.
    pub fn load(&mut self) -> Result<bool> {
        self.check_not_initialized()?;
        if !self.edges.load_existing()? {
            return Ok(false);
        }
        if !self.nodes.load_existing()? {
            return Err(GraphError::Config(format!(
                "cannot load nodes store from {:?}",
                self.directory
            )));
        }
        if !self.geometry.load_existing()? {
            return Err(GraphError::Config(format!(
                "cannot load geometry store from {:?}",
                self.directory
            )));
        }
        let version = self.edges.version();
        if self.nodes.version() != version || self.geometry.version() != version {
            return Err(GraphError::Config(format!(
                "store versions disagree: nodes {}, edges {version}, geometry {}",
                self.nodes.version(),
                self.geometry.version()
            )));
        }
        let fingerprint = self.nodes.header(header::NODES_FINGERPRINT);
        if fingerprint != X::fingerprint() {
            return Err(GraphError::Config(format!(
                "stored layout fingerprint {fingerprint:#x} does not match {} layout",
                X::KIND
            )));
        }
        let node_ints = self.nodes.header(header::NODES_ENTRY_INTS);
        let edge_ints = self.edges.header(header::EDGES_ENTRY_INTS);
        if node_ints as u64 != self.node_ints || edge_ints as u64 != self.edge_ints {
            return Err(GraphError::Config(format!(
                "stored record widths {node_ints}/{edge_ints} do not match {}/{}",
                self.node_ints, self.edge_ints
            )));
        }

        let node_count = self.nodes.header(header::NODES_COUNT);
        let edge_count = self.edges.header(header::EDGES_COUNT);
        let max_geo_ref = self.geometry.header(header::GEOMETRY_MAX_REF);
        if node_count < 0 || edge_count < 0 || max_geo_ref < 1 {
            return Err(GraphError::Corruption(format!(
                "negative counters: nodes {node_count}, edges {edge_count}, geometry {max_geo_ref}"
            )));
        }
        self.node_count = node_count as u32;
        self.edge_count = edge_count as u32;
        self.max_geo_ref = max_geo_ref as u32;
        if self.node_capacity() < u64::from(self.node_count)
            || self.edge_capacity() < u64::from(self.edge_count)
            || self.geometry.capacity() < u64::from(self.max_geo_ref) * INT_BYTES
        {
            return Err(GraphError::Corruption(
                "stored counters exceed allocated stores".into(),
            ));
        }

        let bounds = BBox {
            min_lon: geo::int_to_degree(self.nodes.header(header::NODES_MIN_LON)),
            max_lon: geo::int_to_degree(self.nodes.header(header::NODES_MAX_LON)),
            min_lat: geo::int_to_degree(self.nodes.header(header::NODES_MIN_LAT)),
            max_lat: geo::int_to_degree(self.nodes.header(header::NODES_MAX_LAT)),
        };
        self.bounds = if bounds.is_valid() { bounds } else { BBox::INVERSE };
        self.initialized = true;
        info!(
            kind = X::KIND,
            nodes = self.node_count,
            edges = self.edge_count,
            version,
            "graph.load.complete"
        );
        Ok(true)
    }

    /// Bytes allocated by the node and edge stores.
    pub fn capacity(&self) -> u64 {
        self.nodes.capacity() + self.edges.capacity()
    }

    #[inline]
    pub(super) fn node_cell(&self, node: u32, cell: u64) -> i32 {
        self.nodes
            .get_int((u64::from(node) * self.node_ints + cell) * INT_BYTES)
    }

    #[inline]
    pub(super) fn set_node_cell(&mut self, node: u32, cell: u64, value: i32) {
        self.nodes
            .set_int((u64::from(node) * self.node_ints + cell) * INT_BYTES, value);
    }

    #[inline]
    pub(super) fn edge_cell(&self, edge: u32, cell: u64) -> i32 {
        self.edges
            .get_int((u64::from(edge) * self.edge_ints + cell) * INT_BYTES)
    }

    #[inline]
    pub(super) fn set_edge_cell(&mut self, edge: u32, cell: u64, value: i32) {
        self.edges
            .set_int((u64::from(edge) * self.edge_ints + cell) * INT_BYTES, value);
    }

    pub(super) fn node_capacity(&self) -> u64 {
        self.nodes.capacity() / (self.node_ints * INT_BYTES)
    }

    fn edge_capacity(&self) -> u64 {
        self.edges.capacity() / (self.edge_ints * INT_BYTES)
    }

    pub(super) fn check_initialized(&self) -> Result<()> {
        if !self.initialized {
            return Err(GraphError::Config(
                "graph storage used before create or load".into(),
            ));
        }
        Ok(())
    }

    fn check_not_initialized(&self) -> Result<()> {
        if self.initialized {
            return Err(GraphError::Config("graph storage already initialized".into()));
        }
        Ok(())
    }

    pub(super) fn check_node(&self, node: NodeId) -> Result<()> {
        if node.0 >= self.node_count {
            return Err(GraphError::OutOfBounds(format!(
                "node {node} outside [0, {})",
                self.node_count
            )));
        }
        Ok(())
    }

    pub(super) fn check_edge(&self, edge: EdgeId) -> Result<()> {
        if edge.0 >= self.edge_count {
            return Err(GraphError::OutOfBounds(format!(
                "edge {edge} outside [0, {})",
                self.edge_count
            )));
        }
        Ok(())
    }

    /// Validates a caller-supplied state against the stored record.
    pub(super) fn check_state<E>(&self, state: &EdgeState<E>) -> Result<()> {
        self.check_edge(state.edge)?;
        self.check_node(state.base)?;
        self.check_node(state.adj)?;
        let (a, b) = self.endpoints(state.edge.0);
        let (base, adj) = (state.base.0, state.adj.0);
        if (base, adj) != (a, b) && (base, adj) != (b, a) {
            return Err(GraphError::Invalid(format!(
                "edge {} connects {a} and {b}, not {base} and {adj}",
                state.edge
            )));
        }
        Ok(())
    }

    /// Grows `store` to hold at least `bytes`, by at least half its size.
    fn grow(store: &mut dyn DataAccess, bytes: u64) -> Result<()> {
        let current = store.capacity();
        if bytes <= current {
            return Ok(());
        }
        store.ensure_capacity(bytes.max(current + current / 2))
    }

    /// Writes the empty record (no edges, default payload) into `from..to`.
    pub(super) fn init_node_records(&mut self, from: u64, to: u64) {
        for index in from..to {
            let index = index as u32;
            self.set_node_cell(index, node::EDGE_REF, NO_EDGE);
            for (offset, value) in X::NODE_DEFAULTS.iter().enumerate() {
                self.set_node_cell(index, node::BASE_INTS as u64 + offset as u64, *value);
            }
        }
    }

    pub(super) fn ensure_node_index(&mut self, node: u32) -> Result<()> {
        self.check_initialized()?;
        if node < self.node_count {
            return Ok(());
        }
        if node > i32::MAX as u32 {
            return Err(GraphError::OutOfBounds(format!("node id {node} exceeds i32 range")));
        }
        self.node_count = node + 1;
        let old_capacity = self.node_capacity();
        if u64::from(self.node_count) <= old_capacity {
            return Ok(());
        }
        let bytes = u64::from(self.node_count) * self.node_ints * INT_BYTES;
        Self::grow(self.nodes.as_mut(), bytes)?;
        let new_capacity = self.node_capacity();
        self.init_node_records(old_capacity, new_capacity);
        Ok(())
    }

    fn next_edge(&mut self) -> Result<u32> {
        let edge = self.edge_count;
        if edge >= i32::MAX as u32 {
            return Err(GraphError::Config(format!(
                "too many edges; id {edge} would not fit a link cell"
            )));
        }
        let bytes = (u64::from(edge) + 1) * self.edge_ints * INT_BYTES;
        Self::grow(self.edges.as_mut(), bytes)?;
        self.edge_count += 1;
        Ok(edge)
    }

    /// Both list tails are resolved before anything is written, so a corrupt
    /// list leaves the graph unchanged.
    fn internal_edge_add(&mut self, a: u32, b: u32, distance: i32, flags: EdgeFlags) -> Result<u32> {
        let tail_a = self.list_tail(a)?;
        let tail_b = if a != b { Some(self.list_tail(b)?) } else { None };
        let edge = self.next_edge()?;
        self.write_edge(edge, a, b, NO_EDGE, NO_EDGE, distance, flags);
        self.set_edge_cell(edge, edge::GEO, 0);
        for (offset, value) in X::EDGE_DEFAULTS.iter().enumerate() {
            self.set_edge_cell(edge, edge::BASE_INTS as u64 + offset as u64, *value);
        }
        self.attach_to_tail(a, tail_a, edge);
        if let Some(tail_b) = tail_b {
            self.attach_to_tail(b, tail_b, edge);
        }
        Ok(edge)
    }

    /// Terminal link of `node`'s list, or `None` when the list is empty.
    fn list_tail(&self, node: u32) -> Result<Option<(u32, u64)>> {
        match EdgeId::from_raw(self.node_cell(node, node::EDGE_REF)) {
            Some(head) => self.last_link(node, head.0).map(Some),
            None => Ok(None),
        }
    }

    fn attach_to_tail(&mut self, node: u32, tail: Option<(u32, u64)>, edge: u32) {
        match tail {
            Some((last, cell)) => self.set_edge_cell(last, cell, edge as i32),
            None => self.set_node_cell(node, node::EDGE_REF, edge as i32),
        }
    }

    /// Finds the edge and link cell holding the terminal link of `node`'s list.
    fn last_link(&self, node: u32, head: u32) -> Result<(u32, u64)> {
        let mut current = head;
        for _ in 0..MAX_ADJACENCY_HOPS {
            self.check_link(node, current)?;
            let other = self.other_node(node, current);
            let cell = link_cell(node, other);
            let next = self.edge_cell(current, cell);
            if next == NO_EDGE {
                return Ok((current, cell));
            }
            if next == current as i32 {
                return Err(self.corruption(node, format!("edge {current} links to itself")));
            }
            current = next as u32;
        }
        Err(self.corruption(
            node,
            format!("adjacency list longer than {MAX_ADJACENCY_HOPS} hops"),
        ))
    }

    pub(super) fn check_link(&self, node: u32, edge: u32) -> Result<()> {
        if edge >= self.edge_count {
            return Err(self.corruption(
                node,
                format!("link to edge {edge} outside [0, {})", self.edge_count),
            ));
        }
        Ok(())
    }

    pub(super) fn corruption(&self, node: u32, detail: String) -> GraphError {
        warn!(node, detail = %detail, "graph.adjacency.corrupt");
        GraphError::Corruption(format!(
            "node {node}: {detail}\n{}",
            self.debug_dump(NodeId(node), 10)
        ))
    }

    /// Writes the base cells of `edge` in canonical order.
    ///
    /// Returns true when the endpoints were swapped to keep `node_a <= node_b`.
    pub(super) fn write_edge(
        &mut self,
        edge: u32,
        mut this: u32,
        mut other: u32,
        mut link_this: i32,
        mut link_other: i32,
        distance: i32,
        mut flags: EdgeFlags,
    ) -> bool {
        let swapped = this > other;
        if swapped {
            std::mem::swap(&mut this, &mut other);
            std::mem::swap(&mut link_this, &mut link_other);
            flags = flags.swap_direction();
        }
        self.set_edge_cell(edge, edge::NODE_A, this as i32);
        self.set_edge_cell(edge, edge::NODE_B, other as i32);
        self.set_edge_cell(edge, edge::LINK_A, link_this);
        self.set_edge_cell(edge, edge::LINK_B, link_other);
        self.set_edge_cell(edge, edge::DIST, distance);
        self.set_edge_cell(edge, edge::FLAGS, flags.raw());
        swapped
    }

    pub(super) fn endpoints(&self, edge: u32) -> (u32, u32) {
        (
            self.edge_cell(edge, edge::NODE_A) as u32,
            self.edge_cell(edge, edge::NODE_B) as u32,
        )
    }

    #[inline]
    pub(super) fn other_node(&self, node: u32, edge: u32) -> u32 {
        let (a, b) = self.endpoints(edge);
        if a == node {
            b
        } else {
            a
        }
    }

    /// Returns `(base, adj)` for `edge` when `end` is one of its endpoints.
    fn orient_towards(&self, edge: EdgeId, end: NodeId) -> Result<Option<(u32, u32)>> {
        self.check_edge(edge)?;
        self.check_node(end)?;
        let (a, b) = self.endpoints(edge.0);
        Ok(if end.0 == b {
            Some((a, b))
        } else if end.0 == a {
            Some((b, a))
        } else {
            None
        })
    }

    /// Decodes `edge` as seen from `base`.
    pub(super) fn read_state(&self, edge: u32, base: u32, adj: u32) -> EdgeState<X::EdgeData> {
        let mut flags = EdgeFlags::from_raw(self.edge_cell(edge, edge::FLAGS));
        if base > adj {
            flags = flags.swap_direction();
        }
        EdgeState {
            edge: EdgeId(edge),
            base: NodeId(base),
            adj: NodeId(adj),
            flags,
            distance: geo::int_to_dist(self.edge_cell(edge, edge::DIST)),
            data: X::edge_data(|cell| self.edge_cell(edge, edge::BASE_INTS as u64 + cell)),
        }
    }

    /// Splices `edge` out of `base`'s list; `prev` is its predecessor there.
    pub(super) fn unlink_edge(&mut self, edge: u32, prev: Option<u32>, base: u32, adj: u32) {
        let next = self.edge_cell(edge, link_cell(base, adj));
        match prev {
            None => self.set_node_cell(base, node::EDGE_REF, next),
            Some(prev) => {
                let cell = if self.edge_cell(prev, edge::NODE_A) as u32 == base {
                    edge::LINK_A
                } else {
                    edge::LINK_B
                };
                self.set_edge_cell(prev, cell, next);
            }
        }
    }

    fn geometry_cell(&self, index: u32) -> i32 {
        self.geometry.get_int(u64::from(index) * INT_BYTES)
    }

    fn set_geometry_cell(&mut self, index: u32, value: i32) {
        self.geometry.set_int(u64::from(index) * INT_BYTES, value);
    }

    /// Reads the block referenced by `edge`; returns `(ref, count)` or `None`.
    fn geometry_block(&self, edge: u32) -> Result<Option<(u32, u32)>> {
        let geo_ref = self.edge_cell(edge, edge::GEO);
        if geo_ref <= 0 {
            return Ok(None);
        }
        let geo_ref = geo_ref as u32;
        if geo_ref >= self.max_geo_ref {
            return Err(GraphError::Corruption(format!(
                "edge {edge} geometry ref {geo_ref} past end {}",
                self.max_geo_ref
            )));
        }
        let count = self.geometry_cell(geo_ref);
        if count < 0 || u64::from(geo_ref) + 1 + 2 * count as u64 > u64::from(self.max_geo_ref) {
            return Err(GraphError::Corruption(format!(
                "edge {edge} geometry block at {geo_ref} claims {count} points"
            )));
        }
        Ok(Some((geo_ref, count as u32)))
    }

    pub(super) fn read_geometry(&self, edge: u32, base: u32, adj: u32) -> Result<PointList> {
        let Some((geo_ref, count)) = self.geometry_block(edge)? else {
            return Ok(PointList::default());
        };
        let mut points = PointList::with_capacity(count as usize);
        for i in 0..count {
            let cell = geo_ref + 1 + i * 2;
            points.push(
                geo::int_to_degree(self.geometry_cell(cell)),
                geo::int_to_degree(self.geometry_cell(cell + 1)),
            );
        }
        if base > adj {
            points.reverse();
        }
        Ok(points)
    }

    pub(super) fn write_geometry(
        &mut self,
        edge: u32,
        base: u32,
        adj: u32,
        points: &PointList,
    ) -> Result<()> {
        if points.is_empty() {
            self.set_edge_cell(edge, edge::GEO, 0);
            return Ok(());
        }
        let len = points.len() as u64;
        let geo_ref = self.max_geo_ref;
        let end = u64::from(geo_ref) + 1 + 2 * len;
        if end > i32::MAX as u64 {
            return Err(GraphError::Config("geometry store exceeds i32 addressing".into()));
        }
        Self::grow(self.geometry.as_mut(), end * INT_BYTES)?;
        self.max_geo_ref = end as u32;
        self.set_edge_cell(edge, edge::GEO, geo_ref as i32);
        self.set_geometry_cell(geo_ref, len as i32);

        let last = points.len() - 1;
        for (i, point) in points.iter().enumerate() {
            let slot = if base > adj { last - i } else { i };
            let cell = geo_ref + 1 + (slot as u32) * 2;
            self.set_geometry_cell(cell, geo::degree_to_int(point.lat));
            self.set_geometry_cell(cell + 1, geo::degree_to_int(point.lon));
        }
        Ok(())
    }

    /// Reverses the stored point order of `edge`'s block in place.
    pub(super) fn reverse_geometry(&mut self, edge: u32) -> Result<()> {
        let Some((geo_ref, count)) = self.geometry_block(edge)? else {
            return Ok(());
        };
        let (mut lo, mut hi) = (0u32, count.saturating_sub(1));
        while lo < hi {
            for offset in 0..2 {
                let a = geo_ref + 1 + lo * 2 + offset;
                let b = geo_ref + 1 + hi * 2 + offset;
                let tmp = self.geometry_cell(a);
                self.set_geometry_cell(a, self.geometry_cell(b));
                self.set_geometry_cell(b, tmp);
            }
            lo += 1;
            hi -= 1;
        }
        Ok(())
    }
}

/// Link cell used by `node` inside an edge whose other endpoint is `other`.
#[inline]
pub(super) fn link_cell(node: u32, other: u32) -> u64 {
    if node <= other {
        edge::LINK_A
    } else {
        edge::LINK_B
    }
}

impl<X: Payload> std::fmt::Debug for GraphStorage<X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStorage")
            .field("kind", &X::KIND)
            .field("nodes", &self.node_count)
            .field("edges", &self.edge_count)
            .field("geometry_cells", &self.max_geo_ref)
            .field("bounds", &self.bounds)
            .finish()
    }
}
