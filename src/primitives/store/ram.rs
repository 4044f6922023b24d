use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::types::{GraphError, Result};

use super::{check_segment_size, DataAccess, HEADER_INTS};

const MAGIC: [u8; 4] = *b"RGDA";

/// Current payload format written by [`RamDataAccess::flush`].
pub const STORE_FORMAT_VERSION: u32 = 1;

mod layout {
    //! Byte ranges of the fixed file prefix.
    use core::ops::Range;

    pub const MAGIC: Range<usize> = 0..4;
    pub const VERSION: Range<usize> = 4..8;
    pub const SEGMENT_SIZE: Range<usize> = 8..12;
    pub const CAPACITY: Range<usize> = 12..20;
    pub const CRC32: Range<usize> = 20..24;
    pub const HEADER_START: usize = 24;
}

const PREFIX_LEN: usize = layout::HEADER_START + HEADER_INTS * 4;

/// Heap-resident store made of equally sized zero-filled segments.
///
/// When bound to a path, [`DataAccess::flush`] writes a single file holding a
/// fixed prefix (magic, version, segment size, capacity, CRC32 of the payload,
/// header slots) followed by the raw payload.
#[derive(Debug)]
pub struct RamDataAccess {
    name: String,
    path: Option<PathBuf>,
    segments: Vec<Box<[u8]>>,
    segment_size: u32,
    segment_shift: u32,
    header: [i32; HEADER_INTS],
    version: u32,
}

impl RamDataAccess {
    /// Creates an empty store; nothing is allocated until `create` or growth.
    pub fn new(name: &str, path: Option<PathBuf>, segment_size: u32) -> Result<Self> {
        check_segment_size(segment_size)?;
        Ok(Self {
            name: name.to_owned(),
            path,
            segments: Vec::new(),
            segment_size,
            segment_shift: segment_size.trailing_zeros(),
            header: [0; HEADER_INTS],
            version: STORE_FORMAT_VERSION,
        })
    }

    #[inline]
    fn locate(&self, byte_pos: u64) -> (usize, usize) {
        let segment = (byte_pos >> self.segment_shift) as usize;
        let offset = (byte_pos & u64::from(self.segment_size - 1)) as usize;
        (segment, offset)
    }

    fn read_file(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(GraphError::Io(err)),
        }
    }

    fn corruption(&self, what: &str) -> GraphError {
        warn!(store = %self.name, reason = what, "store.load.corrupt");
        GraphError::Corruption(format!("store '{}': {what}", self.name))
    }
}

fn slice_u32(bytes: &[u8], range: Range<usize>) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[range]);
    u32::from_le_bytes(buf)
}

fn slice_u64(bytes: &[u8], range: Range<usize>) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[range]);
    u64::from_le_bytes(buf)
}

impl DataAccess for RamDataAccess {
    fn name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn create(&mut self, bytes: u64) -> Result<()> {
        self.segments.clear();
        self.header = [0; HEADER_INTS];
        self.version = STORE_FORMAT_VERSION;
        self.ensure_capacity(bytes.max(u64::from(self.segment_size)))
    }

    fn load_existing(&mut self) -> Result<bool> {
        let Some(path) = self.path.clone() else {
            return Ok(false);
        };
        let Some(bytes) = self.read_file(&path)? else {
            return Ok(false);
        };
        if bytes.len() < PREFIX_LEN {
            return Err(self.corruption("file shorter than prefix"));
        }
        if bytes[layout::MAGIC] != MAGIC {
            return Err(self.corruption("invalid magic"));
        }
        let version = slice_u32(&bytes, layout::VERSION);
        if version == 0 || version > STORE_FORMAT_VERSION {
            return Err(self.corruption(&format!("unsupported format version {version}")));
        }
        let segment_size = slice_u32(&bytes, layout::SEGMENT_SIZE);
        check_segment_size(segment_size).map_err(|_| self.corruption("invalid segment size"))?;
        let capacity = slice_u64(&bytes, layout::CAPACITY);
        let payload = &bytes[PREFIX_LEN..];
        if payload.len() as u64 != capacity || capacity % u64::from(segment_size) != 0 {
            return Err(self.corruption("payload length disagrees with recorded capacity"));
        }
        let expected_crc = slice_u32(&bytes, layout::CRC32);
        if crc32fast::hash(payload) != expected_crc {
            return Err(self.corruption("payload checksum mismatch"));
        }

        self.segment_size = segment_size;
        self.segment_shift = segment_size.trailing_zeros();
        self.version = version;
        for (index, slot) in self.header.iter_mut().enumerate() {
            let start = layout::HEADER_START + index * 4;
            *slot = slice_u32(&bytes, start..start + 4) as i32;
        }
        self.segments = payload
            .chunks(segment_size as usize)
            .map(|chunk| chunk.to_vec().into_boxed_slice())
            .collect();
        debug!(store = %self.name, capacity, version, "store.load.complete");
        Ok(true)
    }

    fn flush(&mut self) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut hasher = crc32fast::Hasher::new();
        for segment in &self.segments {
            hasher.update(segment);
        }
        let mut prefix = [0u8; PREFIX_LEN];
        prefix[layout::MAGIC].copy_from_slice(&MAGIC);
        prefix[layout::VERSION].copy_from_slice(&self.version.to_le_bytes());
        prefix[layout::SEGMENT_SIZE].copy_from_slice(&self.segment_size.to_le_bytes());
        prefix[layout::CAPACITY].copy_from_slice(&self.capacity().to_le_bytes());
        prefix[layout::CRC32].copy_from_slice(&hasher.finalize().to_le_bytes());
        for (index, value) in self.header.iter().enumerate() {
            let start = layout::HEADER_START + index * 4;
            prefix[start..start + 4].copy_from_slice(&value.to_le_bytes());
        }

        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(&prefix)?;
        for segment in &self.segments {
            out.write_all(segment)?;
        }
        out.flush()?;
        out.get_ref().sync_all()?;
        debug!(store = %self.name, capacity = self.capacity(), "store.flush.complete");
        Ok(())
    }

    #[inline]
    fn get_int(&self, byte_pos: u64) -> i32 {
        let (segment, offset) = self.locate(byte_pos);
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.segments[segment][offset..offset + 4]);
        i32::from_le_bytes(buf)
    }

    #[inline]
    fn set_int(&mut self, byte_pos: u64, value: i32) {
        let (segment, offset) = self.locate(byte_pos);
        self.segments[segment][offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn header(&self, index: usize) -> i32 {
        self.header[index]
    }

    fn set_header(&mut self, index: usize, value: i32) {
        self.header[index] = value;
    }

    fn capacity(&self) -> u64 {
        self.segments.len() as u64 * u64::from(self.segment_size)
    }

    fn ensure_capacity(&mut self, bytes: u64) -> Result<()> {
        let segment_size = u64::from(self.segment_size);
        let wanted = bytes.div_ceil(segment_size);
        let wanted = usize::try_from(wanted).map_err(|_| {
            GraphError::Config(format!("store '{}' cannot grow to {bytes} bytes", self.name))
        })?;
        while self.segments.len() < wanted {
            self.segments
                .push(vec![0u8; self.segment_size as usize].into_boxed_slice());
        }
        Ok(())
    }

    fn trim_to(&mut self, bytes: u64) {
        let keep = bytes.div_ceil(u64::from(self.segment_size)).max(1) as usize;
        self.segments.truncate(keep);
    }

    fn segment_size(&self) -> u32 {
        self.segment_size
    }

    fn set_segment_size(&mut self, bytes: u32) -> Result<()> {
        check_segment_size(bytes)?;
        if !self.segments.is_empty() {
            return Err(GraphError::Config(format!(
                "store '{}' already allocated; segment size is fixed",
                self.name
            )));
        }
        self.segment_size = bytes;
        self.segment_shift = bytes.trailing_zeros();
        Ok(())
    }

    fn version(&self) -> u32 {
        self.version
    }
}
