//! Primitive reads over a byte source: fixed-width little-endian integers
//! and GBK-encoded null-terminated strings.

use encoding_rs::GBK;
use std::io;

use crate::error::{Error, Result};
use crate::source::ByteSource;

/// Chunk size for the terminator scan in `read_cstring`.
const SCAN_CHUNK: usize = 64;

/// Fixed-width and string reads layered over any [`ByteSource`].
///
/// Integers are little-endian and zero-extended to `u32`; a read that
/// cannot supply the full width fails with the I/O error kind.
pub trait ReadPrimitives: ByteSource {
    /// Read exactly `buf.len()` bytes at `offset`.
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..])?;
            if n == 0 {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("short read at offset {offset}"),
                )));
            }
            filled += n;
        }
        Ok(())
    }

    /// Read a single byte.
    fn read_u8(&self, offset: u64) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact_at(offset, &mut buf)?;
        Ok(buf[0])
    }

    /// Read a 3-byte little-endian unsigned integer, zero-extended.
    fn read_u24(&self, offset: u64) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact_at(offset, &mut buf[..3])?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Read a 4-byte little-endian unsigned integer.
    fn read_u32(&self, offset: u64) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact_at(offset, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Read a null-terminated GBK string starting at `offset`.
    ///
    /// Returns the decoded text and the offset just past the terminator.
    /// The terminator must appear before end of source, and the captured
    /// bytes must form complete GBK sequences; a dangling lead byte is a
    /// decode error, not a best-effort substitution.
    fn read_cstring(&self, offset: u64) -> Result<(String, u64)> {
        let mut raw = Vec::new();
        let mut pos = offset;
        let mut chunk = [0u8; SCAN_CHUNK];
        loop {
            let n = self.read_at(pos, &mut chunk)?;
            if n == 0 {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("unterminated string at offset {offset}"),
                )));
            }
            match chunk[..n].iter().position(|&b| b == 0) {
                Some(i) => {
                    raw.extend_from_slice(&chunk[..i]);
                    pos += i as u64 + 1;
                    break;
                }
                None => {
                    raw.extend_from_slice(&chunk[..n]);
                    pos += n as u64;
                }
            }
        }
        match GBK.decode_without_bom_handling_and_without_replacement(&raw) {
            Some(text) => Ok((text.into_owned(), pos)),
            None => Err(Error::Decode { offset }),
        }
    }
}

impl<S: ByteSource + ?Sized> ReadPrimitives for S {}
