//! Error types for the store.

use std::fmt;
use std::io;
use std::path::PathBuf;

use bitdb_codec::CodecError;
use bitdb_core::BitError;

/// Errors returned by [`BitStore`](crate::BitStore) operations.
#[derive(Debug)]
pub enum StoreError {
    /// The backing file could not be opened, created or recognised.
    Open {
        /// Path of the backing file.
        path: PathBuf,
        /// The underlying failure.
        source: io::Error,
    },
    /// An I/O error occurred on an open store.
    Io(io::Error),
    /// No live record exists for the key.
    KeyNotFound {
        /// The key that was looked up.
        key: String,
    },
    /// The key is empty, too long, or contains a NUL byte.
    InvalidKey {
        /// Why the key was rejected.
        reason: String,
    },
    /// The stored bytes for a key failed codec validation.
    Corrupt {
        /// The key whose record is corrupt.
        key: String,
        /// The codec's diagnosis.
        source: CodecError,
    },
    /// The latest record for a key failed its checksum when the log was
    /// replayed. Put or delete the key to replace it.
    ChecksumMismatch {
        /// The key named by the damaged record.
        key: String,
        /// Offset of the damaged record in the log.
        offset: u64,
    },
    /// A vector operation against stored data failed.
    Bit(BitError),
    /// The [`StoreConfig`](crate::StoreConfig) violates an invariant.
    InvalidConfig {
        /// Description of which invariant was violated.
        reason: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "cannot open store {}: {source}", path.display())
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::KeyNotFound { key } => write!(f, "key not found: {key:?}"),
            Self::InvalidKey { reason } => write!(f, "invalid key: {reason}"),
            Self::Corrupt { key, source } => {
                write!(f, "corrupt record for key {key:?}: {source}")
            }
            Self::ChecksumMismatch { key, offset } => write!(
                f,
                "record for key {key:?} at offset {offset} failed its checksum"
            ),
            Self::Bit(e) => write!(f, "{e}"),
            Self::InvalidConfig { reason } => write!(f, "invalid store config: {reason}"),
        }
    }
}

impl StoreError {
    /// Whether this error means stored bytes are damaged.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. } | Self::ChecksumMismatch { .. })
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Io(e) => Some(e),
            Self::Corrupt { source, .. } => Some(source),
            Self::Bit(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<BitError> for StoreError {
    fn from(e: BitError) -> Self {
        Self::Bit(e)
    }
}
