//! Database handle: header validation, index search, record decoding and
//! the version probe.

use chrono::NaiveDate;
use std::net::Ipv4Addr;
use std::path::Path;

use super::format::{RecordMode, HEADER_SIZE, INDEX_ENTRY_SIZE, UNKNOWN_AREA};
use super::primitives::ReadPrimitives;
use crate::error::{Error, Result};
use crate::source::{ByteSource, FileSource, MemorySource, MmapSource};

/// A resolved location: country plus a finer area string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub country: String,
    pub area: String,
}

/// Read-only handle over a QQWry database.
///
/// The handle keeps only the index-table bounds from the header; every query
/// is a fresh sequence of positioned reads against the source and nothing is
/// cached, so lookups from multiple threads need no locking.
#[derive(Debug)]
pub struct Database<S> {
    source: S,
    index_start: u32,
    index_end: u32,
}

impl Database<FileSource> {
    /// Open a database served by positioned file reads.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(FileSource::open(path)?)
    }
}

impl Database<MmapSource> {
    /// Open a memory-mapped database.
    pub fn open_mmap(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(MmapSource::open(path)?)
    }
}

impl Database<MemorySource> {
    /// Open a database held in a byte buffer.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::new(MemorySource::from_bytes(data))
    }
}

impl<S: ByteSource> Database<S> {
    /// Validate the header and wrap the source.
    ///
    /// Rejects sources too small for the header, index bounds that are
    /// reversed or off the 7-byte entry grid, tables with fewer than two
    /// entries (the interval search needs both boundary entries), and a
    /// first entry that does not start at 0.0.0.0.
    pub fn new(source: S) -> Result<Self> {
        if source.len() < HEADER_SIZE {
            return Err(Error::Truncated { len: source.len() });
        }
        let index_start = source.read_u32(0)?;
        let index_end = source.read_u32(4)?;
        if index_end <= index_start || (index_end - index_start) % INDEX_ENTRY_SIZE != 0 {
            return Err(Error::InvalidIndex {
                start: index_start,
                end: index_end,
            });
        }
        let first = source.read_u32(u64::from(index_start))?;
        if first != 0 {
            return Err(Error::IndexOrigin(Ipv4Addr::from(first)));
        }
        Ok(Self {
            source,
            index_start,
            index_end,
        })
    }

    /// Number of entries in the index table.
    pub fn entry_count(&self) -> u32 {
        (self.index_end - self.index_start) / INDEX_ENTRY_SIZE + 1
    }

    /// Resolve an IPv4 address to its location.
    pub fn lookup(&self, ip: Ipv4Addr) -> Result<Location> {
        let entry = self.find_range(u32::from(ip))?;
        let record = self.source.read_u24(entry + 4)?;
        let (country, area) = self.decode_address(u64::from(record))?;
        Ok(Location { country, area })
    }

    /// Release date of the database.
    ///
    /// The header's end-of-index field doubles as the pointer container for
    /// a version record whose area half carries the release text, e.g.
    /// `2024年03月01日IP数据`. Release dates are published under UTC+8.
    pub fn version(&self) -> Result<NaiveDate> {
        let record = self.source.read_u24(u64::from(self.index_end) + 4)?;
        let (_, text) = self.decode_address(u64::from(record))?;
        parse_release_date(&text)
    }

    /// Find the offset of the index entry whose range contains `ip`.
    ///
    /// Interval binary search over the 7-byte entry grid: an exact hit on a
    /// range start terminates early; otherwise the search narrows to two
    /// neighboring entries and the left one wins only if its record's range
    /// end still covers `ip`.
    fn find_range(&self, ip: u32) -> Result<u64> {
        let stride = u64::from(INDEX_ENTRY_SIZE);
        let mut start = u64::from(self.index_start);
        let mut end = u64::from(self.index_end);
        loop {
            let mid = start + (((end - start) / stride) >> 1) * stride;
            if end - start == stride {
                let record = self.source.read_u24(mid + 4)?;
                let range_end = self.source.read_u32(u64::from(record))?;
                if ip < range_end {
                    return Ok(mid);
                }
                return Err(Error::NotFound(Ipv4Addr::from(ip)));
            }
            let mid_ip = self.source.read_u32(mid)?;
            if ip > mid_ip {
                start = mid;
            } else if ip < mid_ip {
                end = mid;
            } else {
                return Ok(mid);
            }
        }
    }

    /// Decode the country/area pair of the record at `offset`.
    ///
    /// The record's mode byte sits after its u32 range end; a redirected
    /// country pointer may itself redirect once more.
    fn decode_address(&self, offset: u64) -> Result<(String, String)> {
        match RecordMode::from_byte(self.source.read_u8(offset + 4)?) {
            RecordMode::FullRedirect => {
                let target = u64::from(self.source.read_u24(offset + 5)?);
                let (country, cursor) =
                    match RecordMode::from_byte(self.source.read_u8(target)?) {
                        RecordMode::CountryRedirect => {
                            let country_at = u64::from(self.source.read_u24(target + 1)?);
                            let (country, _) = self.source.read_cstring(country_at)?;
                            (country, target + 4)
                        }
                        _ => self.source.read_cstring(target)?,
                    };
                let area = self.decode_area(cursor)?;
                Ok((country, area))
            }
            RecordMode::CountryRedirect => {
                let target = u64::from(self.source.read_u24(offset + 5)?);
                let (country, _) = self.source.read_cstring(target)?;
                let area = self.decode_area(offset + 8)?;
                Ok((country, area))
            }
            RecordMode::Inline(_) => {
                let (country, cursor) = self.source.read_cstring(offset + 4)?;
                let area = self.decode_area(cursor)?;
                Ok((country, area))
            }
        }
    }

    /// Decode the area string whose mode byte sits at `offset`.
    ///
    /// A redirect with a zero pointer means the area is unrecorded and
    /// yields the [`UNKNOWN_AREA`] sentinel.
    fn decode_area(&self, offset: u64) -> Result<String> {
        match RecordMode::from_byte(self.source.read_u8(offset)?) {
            RecordMode::FullRedirect | RecordMode::CountryRedirect => {
                let target = self.source.read_u24(offset + 1)?;
                if target == 0 {
                    return Ok(UNKNOWN_AREA.to_string());
                }
                let (area, _) = self.source.read_cstring(u64::from(target))?;
                Ok(area)
            }
            RecordMode::Inline(_) => {
                let (area, _) = self.source.read_cstring(offset)?;
                Ok(area)
            }
        }
    }
}

/// Parse the release text into a calendar date.
///
/// `%m`/`%d` accept both zero-padded and unpadded digits, covering the two
/// layouts the database has shipped with (`03月01日` and `3月1日`).
fn parse_release_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y年%m月%d日IP数据")
        .map_err(|_| Error::Version(text.to_string()))
}
