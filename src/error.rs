//! Error types for qqwry.

use std::net::Ipv4Addr;
use thiserror::Error;

/// Error type for qqwry operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Backing source failed or came up short
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored string is not valid GBK
    #[error("invalid GBK sequence in string at offset {offset}")]
    Decode { offset: u64 },

    /// Address is at or beyond the highest cataloged range
    #[error("no record covers address {0}")]
    NotFound(Ipv4Addr),

    /// Version text matches neither accepted date layout
    #[error("unrecognized version text: {0:?}")]
    Version(String),

    /// Source too small to hold the header
    #[error("truncated database: {len} bytes")]
    Truncated { len: u64 },

    /// Index bounds in the header are unusable
    #[error("invalid index bounds: start={start} end={end}")]
    InvalidIndex { start: u32, end: u32 },

    /// First index entry does not cover the bottom of the address space
    #[error("first index entry starts at {0}, expected 0.0.0.0")]
    IndexOrigin(Ipv4Addr),

    /// Release feed returned an error or an unexpected shape
    #[error("release feed error: {0}")]
    Feed(String),

    /// Download failed
    #[error("download error: {0}")]
    Download(String),

    /// Installer archive could not be read
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// innoextract failed
    #[error("extractor error: {0}")]
    Extract(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for qqwry operations.
pub type Result<T> = std::result::Result<T, Error>;
