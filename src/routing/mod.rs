//! Shortest-path trees, path extraction and a reference bidirectional search.

mod bidir;
mod path;
mod spt;
mod weighting;

/// Reference bidirectional Dijkstra.
pub use bidir::DijkstraBidirectionRef;

/// Result path and the bidirectional chain merger.
pub use path::{Path, PathBidirRef};

pub use spt::{EntryRef, ShortestPathTree, SptEntry};

/// Edge cost models.
pub use weighting::{travel_time, Fastest, Shortest, Weighting};
