//! qqwry - IPv4 geolocation lookups over the QQWry (CZ88) binary database.
//!
//! This crate decodes the legacy `qqwry.dat` format: a header-framed binary
//! search index over 7-byte entries, variable-length records reached through
//! mode-tagged pointer chains, and GBK-encoded null-terminated strings.
//!
//! # Features
//!
//! - **Lookups**: resolve an [`std::net::Ipv4Addr`] to a country/area pair
//! - **Pluggable byte sources**: positioned file reads, memory maps, or
//!   fully in-memory buffers behind one [`ByteSource`] trait
//! - **Version probe**: read the release date embedded in the database
//! - **Auto-update**: discover, download, and install new releases
//! - **Thread-safe**: lookups are stateless positioned reads, safe to share
//!   across threads without locking
//!
//! # Quick Start
//!
//! ```ignore
//! use qqwry::Database;
//!
//! let db = Database::open("qqwry.dat")?;
//! let location = db.lookup("114.114.114.114".parse()?)?;
//! println!("{} {}", location.country, location.area);
//! println!("release {}", db.version()?);
//! ```
//!
//! # Updating
//!
//! For deployments that keep the database current, use [`Updater`]:
//!
//! ```ignore
//! use qqwry::Updater;
//!
//! let updater = Updater::new("qqwry.dat");
//! if updater.update()? {
//!     println!("database updated to {:?}", updater.installed_version()?);
//! }
//! ```
//!
//! The updater compares the feed's latest release date against the date
//! embedded in the local file, so nothing is downloaded when the database
//! is already current. Extraction requires the external `innoextract`
//! binary, since releases ship as an Inno Setup installer inside a zip.

mod error;
mod metadata;

pub mod db;
pub mod source;
pub mod updater;

// Re-export core types
pub use error::{Error, Result};

// Re-export database types
pub use db::{Database, Location, RecordMode, ReadPrimitives, UNKNOWN_AREA};

// Re-export byte sources
pub use source::{ByteSource, FileSource, MemorySource, MmapSource};

// Re-export updater types
pub use updater::{Release, Updater, DEFAULT_CHECK_INTERVAL, DEFAULT_FEED_URL};

// Re-export metadata
pub use metadata::UpdateMetadata;
