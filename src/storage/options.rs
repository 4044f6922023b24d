use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::primitives::store::{check_segment_size, Directory, DEFAULT_SEGMENT_SIZE};
use crate::types::{GraphError, Result};

use super::metrics::StorageMetrics;

/// Node-count hint used when [`super::GraphStorage::create`] is called via
/// [`super::GraphStorage::create_default`].
pub const DEFAULT_NODE_HINT: u32 = 100;

/// Configuration supplied when constructing a [`super::GraphStorage`].
#[derive(Clone)]
pub struct GraphOptions {
    /// Where the node, edge and geometry stores live.
    pub directory: Directory,
    /// Segment size in bytes for all three stores.
    pub segment_size: u32,
    /// Node count used to size the initial allocation.
    pub node_hint: u32,
    /// Optional metrics collection implementation.
    pub metrics: Option<Arc<dyn StorageMetrics>>,
}

impl GraphOptions {
    /// Creates options for the given directory with default settings.
    pub fn new(directory: Directory) -> Self {
        Self {
            directory,
            segment_size: DEFAULT_SEGMENT_SIZE,
            node_hint: DEFAULT_NODE_HINT,
            metrics: None,
        }
    }

    /// Sets the segment size of the backing stores.
    pub fn segment_size(mut self, bytes: u32) -> Self {
        self.segment_size = bytes;
        self
    }

    /// Sets the node-count hint for the initial allocation.
    pub fn node_hint(mut self, nodes: u32) -> Self {
        self.node_hint = nodes;
        self
    }

    /// Sets the metrics collection implementation.
    pub fn metrics(mut self, metrics: Arc<dyn StorageMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self::new(Directory::ram())
    }
}

impl std::fmt::Debug for GraphOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphOptions")
            .field("directory", &self.directory)
            .field("segment_size", &self.segment_size)
            .field("node_hint", &self.node_hint)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

/// Storage tunables as read from a TOML document.
///
/// ```toml
/// [storage]
/// location = "/var/lib/roads"
/// segment_size = 1048576
/// node_hint = 5000
/// ```
///
/// Every key is optional; an absent `location` keeps the graph in memory.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GraphConfig {
    #[serde(default)]
    storage: StorageSection,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct StorageSection {
    location: Option<PathBuf>,
    segment_size: Option<u32>,
    node_hint: Option<u32>,
}

impl GraphConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|err| GraphError::Config(format!("failed to parse graph config: {err}")))
    }

    /// Reads and parses the TOML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| {
            GraphError::Config(format!("failed to read graph config {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Configured storage location, if any.
    pub fn location(&self) -> Option<&Path> {
        self.storage.location.as_deref()
    }

    /// Converts the parsed document into [`GraphOptions`], validating values.
    pub fn into_options(self) -> Result<GraphOptions> {
        let directory = match self.storage.location {
            Some(path) => Directory::persistent(path),
            None => Directory::ram(),
        };
        let mut options = GraphOptions::new(directory);
        if let Some(bytes) = self.storage.segment_size {
            check_segment_size(bytes)?;
            options = options.segment_size(bytes);
        }
        if let Some(nodes) = self.storage.node_hint {
            options = options.node_hint(nodes);
        }
        Ok(options)
    }
}
