//! Record layouts and the per-variant extra payload.
//!
//! Every node and edge record starts with the fixed base fields below. A
//! [`Payload`] appends extra integer cells to each record and decides how
//! they surface on [`super::EdgeState`].

use std::fmt;

use crate::types::{EdgeId, NO_EDGE};

pub(crate) mod node {
    //! Cell offsets inside a node record.
    pub const EDGE_REF: u64 = 0;
    pub const LAT: u64 = 1;
    pub const LON: u64 = 2;
    pub const BASE_INTS: usize = 3;
}

pub(crate) mod edge {
    //! Cell offsets inside an edge record.
    pub const NODE_A: u64 = 0;
    pub const NODE_B: u64 = 1;
    pub const LINK_A: u64 = 2;
    pub const LINK_B: u64 = 3;
    pub const DIST: u64 = 4;
    pub const FLAGS: u64 = 5;
    pub const GEO: u64 = 6;
    pub const BASE_INTS: usize = 7;
}

/// Extra fixed-size cells carried by every node and edge record.
pub trait Payload: fmt::Debug + Send + Sync + 'static {
    /// Name folded into the layout fingerprint written on flush.
    const KIND: &'static str;

    /// Initial values of the extra node cells, one entry per cell.
    const NODE_DEFAULTS: &'static [i32];

    /// Initial values of the extra edge cells, one entry per cell.
    const EDGE_DEFAULTS: &'static [i32];

    /// Decoded view of the extra edge cells.
    type EdgeData: Copy + fmt::Debug + PartialEq + Send + Sync;

    /// Decodes the extra edge cells; `cell(i)` reads the i-th extra cell.
    fn edge_data(cell: impl Fn(u64) -> i32) -> Self::EdgeData;

    /// Total integers per node record.
    fn node_ints() -> usize {
        node::BASE_INTS + Self::NODE_DEFAULTS.len()
    }

    /// Total integers per edge record.
    fn edge_ints() -> usize {
        edge::BASE_INTS + Self::EDGE_DEFAULTS.len()
    }

    /// CRC32 over the variant name and record widths.
    fn fingerprint() -> i32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(Self::KIND.as_bytes());
        hasher.update(&(Self::node_ints() as u32).to_le_bytes());
        hasher.update(&(Self::edge_ints() as u32).to_le_bytes());
        hasher.finalize() as i32
    }
}

/// Plain road graph: no extra cells.
#[derive(Debug)]
pub enum Plain {}

impl Payload for Plain {
    const KIND: &'static str = "graph";
    const NODE_DEFAULTS: &'static [i32] = &[];
    const EDGE_DEFAULTS: &'static [i32] = &[];
    type EdgeData = ();

    fn edge_data(_cell: impl Fn(u64) -> i32) {}
}

/// Hierarchy graph: a level per node and a skipped-edge pair per edge.
#[derive(Debug)]
pub enum Level {}

pub(crate) mod level {
    //! Extra cell offsets of [`super::Level`], relative to the base record.
    use super::{edge, node};

    pub const NODE_LEVEL: u64 = node::BASE_INTS as u64;
    pub const SKIP_EDGE1: u64 = edge::BASE_INTS as u64;
    pub const SKIP_EDGE2: u64 = edge::BASE_INTS as u64 + 1;
}

/// Shortcut information decoded from a [`Level`] edge record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shortcut {
    /// The two edges bypassed, when the edge is a shortcut.
    pub skipped: Option<(EdgeId, EdgeId)>,
}

impl Shortcut {
    /// True when the edge bypasses two other edges.
    pub fn is_shortcut(&self) -> bool {
        self.skipped.is_some()
    }
}

impl Payload for Level {
    const KIND: &'static str = "level-graph";
    const NODE_DEFAULTS: &'static [i32] = &[0];
    const EDGE_DEFAULTS: &'static [i32] = &[NO_EDGE, NO_EDGE];
    type EdgeData = Shortcut;

    fn edge_data(cell: impl Fn(u64) -> i32) -> Shortcut {
        let first = EdgeId::from_raw(cell(0));
        let second = EdgeId::from_raw(cell(1));
        Shortcut {
            skipped: first.zip(second),
        }
    }
}
