//! Graph storage engine: flat node and edge records with intrusive adjacency
//! lists, pillar-point geometry, node compaction and the level extension.

mod compact;
mod cursor;
mod flags;
mod geo;
mod graph;
mod level;
mod metrics;
mod options;
pub(crate) mod payload;
mod verify;
mod view;

/// Adjacency traversal and edge cursors.
pub use cursor::{AllEdges, Dir, EdgeCursorMut, EdgeIter, EdgeState, RawEdge};

/// Edge direction and speed bits.
pub use flags::{EdgeFlags, DEFAULT_SPEED_KMH, SPEED_FACTOR};

/// Unit conversions and coordinate containers.
pub use geo::{
    degree_to_int, dist_to_int, int_to_degree, int_to_dist, BBox, GeoPoint, PointList,
    DEGREE_FACTOR, DIST_FACTOR,
};

/// Core storage implementation.
pub use graph::{GraphStorage, MAX_ADJACENCY_HOPS};

pub use level::LevelGraphStorage;

/// Storage metrics collection hooks.
pub use metrics::{default_metrics, CounterMetrics, NoopMetrics, StorageMetrics};

/// Construction options and file-based configuration.
pub use options::{GraphConfig, GraphOptions, DEFAULT_NODE_HINT};

pub use payload::{Level, Payload, Plain, Shortcut};

/// Read-only capabilities for search code.
pub use view::{LevelView, RoutingGraph};
