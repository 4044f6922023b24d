//! Arena-backed shortest-path-tree entries.

use crate::types::{EdgeId, GraphError, NodeId, Result};

/// Handle of an entry inside a [`ShortestPathTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryRef(u32);

/// Best known way to reach `end_node` in one search direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SptEntry {
    /// Edge used to reach `end_node`; `None` for a search root.
    pub edge: Option<EdgeId>,
    /// Node this entry settles.
    pub end_node: NodeId,
    /// Accumulated weight from the root.
    pub weight: f64,
    /// Entry `edge` was reached from.
    pub parent: Option<EntryRef>,
}

impl SptEntry {
    /// A root entry for `node` with zero weight.
    pub fn root(node: NodeId) -> Self {
        Self {
            edge: None,
            end_node: node,
            weight: 0.0,
            parent: None,
        }
    }
}

/// Owns the entries of one or more search trees; entries are never freed, so
/// an [`EntryRef`] stays valid for the arena's lifetime.
#[derive(Clone, Debug, Default)]
pub struct ShortestPathTree {
    entries: Vec<SptEntry>,
}

impl ShortestPathTree {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `entry` and returns its handle.
    pub fn push(&mut self, entry: SptEntry) -> EntryRef {
        let id = EntryRef(self.entries.len() as u32);
        self.entries.push(entry);
        id
    }

    /// Entry behind `id`.
    pub fn get(&self, id: EntryRef) -> Result<&SptEntry> {
        self.entries
            .get(id.0 as usize)
            .ok_or_else(|| GraphError::OutOfBounds(format!("tree entry {} of {}", id.0, self.len())))
    }

    /// Mutable entry behind `id`.
    pub fn get_mut(&mut self, id: EntryRef) -> Result<&mut SptEntry> {
        let len = self.len();
        self.entries
            .get_mut(id.0 as usize)
            .ok_or_else(|| GraphError::OutOfBounds(format!("tree entry {} of {len}", id.0)))
    }

    /// Parent of `id`, which must exist when `id` carries an edge.
    pub fn parent(&self, id: EntryRef) -> Result<EntryRef> {
        self.get(id)?.parent.ok_or_else(|| {
            GraphError::Corruption(format!("tree entry {} has an edge but no parent", id.0))
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entry was pushed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
