#![forbid(unsafe_code)]
//! Resizable, segment-allocated integer arrays addressed by byte offset.
//!
//! The graph layer only talks to the [`DataAccess`] trait; [`Directory`]
//! hands out named stores that share one backing location.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::types::{GraphError, Result};

mod ram;

pub use ram::RamDataAccess;

/// Number of integer header slots every store carries.
pub const HEADER_INTS: usize = 20;

/// Default segment size in bytes.
pub const DEFAULT_SEGMENT_SIZE: u32 = 1 << 20;

/// Smallest segment size accepted by [`DataAccess::set_segment_size`].
pub const MIN_SEGMENT_SIZE: u32 = 1 << 7;

/// A growable array of 32-bit integers addressed by byte offset.
///
/// Offsets must be 4-byte aligned and below [`DataAccess::capacity`]; the
/// graph layer guarantees both, so accessors panic rather than return errors.
pub trait DataAccess: fmt::Debug + Send {
    /// Name of the store inside its directory.
    fn name(&self) -> &str;

    /// Backing file, if the store is persisted.
    fn location(&self) -> Option<&Path>;

    /// Allocates an empty store of at least `bytes` capacity.
    fn create(&mut self, bytes: u64) -> Result<()>;

    /// Restores header and payload from the backing file.
    ///
    /// Returns `Ok(false)` when nothing has been persisted yet.
    fn load_existing(&mut self) -> Result<bool>;

    /// Writes header and payload to the backing file, if any.
    fn flush(&mut self) -> Result<()>;

    /// Reads the integer stored at `byte_pos`.
    fn get_int(&self, byte_pos: u64) -> i32;

    /// Writes `value` at `byte_pos`.
    fn set_int(&mut self, byte_pos: u64, value: i32);

    /// Reads header slot `index`.
    fn header(&self, index: usize) -> i32;

    /// Writes header slot `index`.
    fn set_header(&mut self, index: usize, value: i32);

    /// Allocated size in bytes, always a multiple of the segment size.
    fn capacity(&self) -> u64;

    /// Grows the store so at least `bytes` are addressable. New space is zeroed.
    fn ensure_capacity(&mut self, bytes: u64) -> Result<()>;

    /// Releases whole segments past `bytes`.
    fn trim_to(&mut self, bytes: u64);

    /// Segment size in bytes.
    fn segment_size(&self) -> u32;

    /// Changes the segment size; only allowed before the store holds data.
    fn set_segment_size(&mut self, bytes: u32) -> Result<()>;

    /// Format version of the loaded (or to-be-written) payload.
    fn version(&self) -> u32;

    /// Copies headers and the complete payload into `other`.
    fn copy_to(&self, other: &mut dyn DataAccess) -> Result<()> {
        other.ensure_capacity(self.capacity())?;
        let mut pos = 0u64;
        while pos < self.capacity() {
            other.set_int(pos, self.get_int(pos));
            pos += 4;
        }
        for index in 0..HEADER_INTS {
            other.set_header(index, self.header(index));
        }
        Ok(())
    }
}

/// Where a set of stores lives: purely in memory, or persisted below a path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Directory {
    location: Option<PathBuf>,
}

impl Directory {
    /// A directory whose stores never touch the filesystem.
    pub fn ram() -> Self {
        Self { location: None }
    }

    /// A directory whose stores are flushed to files below `path`.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Some(path.into()),
        }
    }

    /// Filesystem location, if persisted.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Returns true when both directories resolve to the same backing location.
    pub fn same_location(&self, other: &Directory) -> bool {
        match (&self.location, &other.location) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Creates the store `name` bound to this directory.
    pub fn find_create(&self, name: &str, segment_size: u32) -> Result<Box<dyn DataAccess>> {
        let path = self.location.as_ref().map(|dir| dir.join(name));
        let store = RamDataAccess::new(name, path, segment_size)?;
        Ok(Box::new(store))
    }
}

pub(crate) fn check_segment_size(bytes: u32) -> Result<()> {
    if bytes < MIN_SEGMENT_SIZE || !bytes.is_power_of_two() {
        return Err(GraphError::Config(format!(
            "segment size {bytes} must be a power of two >= {MIN_SEGMENT_SIZE}"
        )));
    }
    Ok(())
}
