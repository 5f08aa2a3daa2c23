//! Durable keyed store of named bit vectors.
//!
//! A [`BitStore`] maps string keys to [`BitVector`](bitdb_core::BitVector)
//! values and persists them in a single append-only log file. An
//! in-memory index, rebuilt on open, maps each live key to the location
//! of its latest record.
//!
//! # Architecture
//!
//! - [`BitStore`] owns the log file handle and the key index
//! - [`record`] frames each put/delete with a CRC32 commit marker
//! - [`StoreConfig`] controls fsync policy, key limits and compaction
//! - [`StoreMetrics`] exposes cumulative counters
//!
//! # File format
//!
//! ```text
//! [MAGIC "BDBS"] [LOG_VERSION u8]
//! [Record 1] [Record 2] ... [Record N]
//!
//! Record:
//! [RECORD_MAGIC "BREC"] [kind u8] [key_len u32] [value_len u32] [crc32 u32] [key] [value]
//! ```
//!
//! `value` is an encoded vector for puts and empty for deletes
//! (tombstones). A record counts as committed only if all of its bytes
//! are present and its checksum matches. On open, an uncommitted tail
//! after the last committed record is truncated; a record that fails its
//! checksum but is followed by committed records is kept and its key
//! reads as [`StoreError::ChecksumMismatch`].
//!
//! # Crash safety
//!
//! Every write appends whole records, so a crash leaves either the old
//! value or the new one. Compaction writes a fresh log next to the old
//! one and renames it into place; an abandoned compaction file is
//! discarded on the next open.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod record;
pub mod store;

pub use config::{StoreConfig, SyncMode};
pub use error::StoreError;
pub use metrics::StoreMetrics;
pub use store::{compaction_path, BitStore};

/// Magic bytes at the start of every store file.
pub const MAGIC: [u8; 4] = *b"BDBS";

/// Current log format version.
pub const LOG_VERSION: u8 = 1;

/// Length of the file header: magic and version.
pub const FILE_HEADER_LEN: u64 = 4 + 1;
