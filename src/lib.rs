//! Road-network graph storage and bidirectional path extraction.
//!
//! [`storage::GraphStorage`] keeps nodes and edges in flat integer records
//! with adjacency lists threaded through the edge records, and
//! [`routing`] turns two shortest-path trees into a [`routing::Path`].

#![warn(missing_docs)]

pub mod primitives;
pub mod routing;
pub mod storage;
pub mod types;

pub use storage::{Dir, EdgeFlags, GraphOptions, GraphStorage, LevelGraphStorage};
pub use types::{EdgeId, GraphError, NodeId, Result};
