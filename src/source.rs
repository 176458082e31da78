//! Random-access byte sources backing a database.
//!
//! The decoder only ever issues positioned reads at absolute offsets, so a
//! source is anything that can serve those: an open file, a memory map, or
//! a fully materialized buffer. All three return byte-identical data for
//! the same file.

use memmap2::Mmap;
use std::fs::{self, File};
use std::io;
use std::path::Path;

/// Random-access source of database bytes.
///
/// Implementations must be safe to share across threads: every read is an
/// independent positioned read and no shared cursor may be mutated.
pub trait ByteSource: Send + Sync {
    /// Read up to `buf.len()` bytes at `offset`.
    ///
    /// Returns the number of bytes read; `0` signals end of source.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Total length of the source in bytes.
    fn len(&self) -> u64;

    /// Whether the source holds no bytes at all.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// File-backed source.
///
/// Each read is a positioned read against the handle, so a single open file
/// can serve concurrent lookups without seeking a shared stream position.
pub struct FileSource {
    file: File,
    len: u64,
}

impl FileSource {
    /// Open a database file.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self { file, len })
    }
}

impl ByteSource for FileSource {
    #[cfg(unix)]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.file.read_at(buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        use std::os::windows::fs::FileExt;
        self.file.seek_read(buf, offset)
    }

    fn len(&self) -> u64 {
        self.len
    }
}

/// Fully materialized in-memory source.
#[derive(Debug)]
pub struct MemorySource {
    data: Vec<u8>,
}

impl MemorySource {
    /// Load an entire database file into memory.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self { data: fs::read(path)? })
    }

    /// Wrap raw database bytes.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl ByteSource for MemorySource {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        Ok(copy_at(&self.data, offset, buf))
    }

    fn len(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Memory-mapped source.
pub struct MmapSource {
    mmap: Mmap,
}

impl MmapSource {
    /// Memory-map a database file.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { mmap })
    }
}

impl ByteSource for MmapSource {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        Ok(copy_at(&self.mmap, offset, buf))
    }

    fn len(&self) -> u64 {
        self.mmap.len() as u64
    }
}

fn copy_at(data: &[u8], offset: u64, buf: &mut [u8]) -> usize {
    if offset >= data.len() as u64 {
        return 0;
    }
    let start = offset as usize;
    let n = buf.len().min(data.len() - start);
    buf[..n].copy_from_slice(&data[start..start + n]);
    n
}
