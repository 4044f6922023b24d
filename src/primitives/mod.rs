//! Low-level primitives the graph storage is built on.
//!
//! The byte store is the only primitive: resizable integer arrays that can be
//! kept in memory or flushed to and restored from a directory.

/// Segment-allocated integer stores and the directories that own them.
pub mod store;
