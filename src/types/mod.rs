#![forbid(unsafe_code)]
//! Identifiers, sentinels and the crate-wide error type.

use std::fmt;

/// Dense node identifier; doubles as the index of the node record.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, serde::Serialize)]
pub struct NodeId(pub u32);

/// Edge identifier, assigned monotonically from zero and never reused.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, serde::Serialize)]
pub struct EdgeId(pub u32);

/// Raw cell value terminating an adjacency list or marking "no edge".
pub const NO_EDGE: i32 = -1;

impl NodeId {
    /// Returns the id as an array index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    /// Returns the id as an array index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn raw(self) -> i32 {
        self.0 as i32
    }

    /// Decodes a stored link cell, mapping the sentinel to `None`.
    #[inline]
    pub(crate) fn from_raw(raw: i32) -> Option<Self> {
        if raw > NO_EDGE {
            Some(EdgeId(raw as u32))
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn to_raw(edge: Option<Self>) -> i32 {
        edge.map_or(NO_EDGE, EdgeId::raw)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(value: u32) -> Self {
        NodeId(value)
    }
}

impl From<NodeId> for u32 {
    fn from(value: NodeId) -> Self {
        value.0
    }
}

impl From<u32> for EdgeId {
    fn from(value: u32) -> Self {
        EdgeId(value)
    }
}

impl From<EdgeId> for u32 {
    fn from(value: EdgeId) -> Self {
        value.0
    }
}

/// Errors raised by the storage engine and the path extractor.
///
/// Every variant except `Io` signals a condition retrying cannot fix: a
/// misconfigured storage, a caller passing ids outside the valid range, or
/// structural corruption of the adjacency lists.
#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    /// Underlying file I/O failed.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// Storage lifecycle or layout misuse.
    #[error("configuration: {0}")]
    Config(String),
    /// An id outside the allocated range.
    #[error("out of bounds: {0}")]
    OutOfBounds(String),
    /// A contract violation by the caller.
    #[error("invalid argument: {0}")]
    Invalid(String),
    /// Structural corruption detected while walking records.
    #[error("corruption: {0}")]
    Corruption(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GraphError>;
