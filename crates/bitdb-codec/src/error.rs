//! Error types for the vector codec.

use std::fmt;
use std::io;

use bitdb_core::BitError;

/// Errors that can occur while encoding or decoding a vector.
///
/// Every variant except [`Io`](Self::Io) means the input bytes are not a
/// valid encoded vector; see [`is_corrupt`](Self::is_corrupt).
#[derive(Debug)]
pub enum CodecError {
    /// An I/O error occurred on the underlying reader or writer.
    Io(io::Error),
    /// The data does not start with the expected `b"BSET"` magic bytes.
    InvalidMagic,
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the data.
        found: u8,
    },
    /// Fewer bytes than the header declares.
    Truncated {
        /// Number of bytes required.
        expected: usize,
        /// Number of bytes available.
        found: usize,
    },
    /// More bytes than the header declares.
    TrailingBytes {
        /// Number of bytes the header implies.
        expected: usize,
        /// Number of bytes supplied.
        found: usize,
    },
    /// The payload decoded to words that violate the vector invariants.
    InvalidVector(BitError),
}

impl CodecError {
    /// Whether this error means the bytes themselves are bad, as opposed
    /// to a failure of the underlying I/O.
    pub fn is_corrupt(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidMagic => write!(f, "invalid magic bytes (expected b\"BSET\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported format version {found}")
            }
            Self::Truncated { expected, found } => {
                write!(f, "truncated vector: need {expected} bytes, got {found}")
            }
            Self::TrailingBytes { expected, found } => {
                write!(f, "trailing bytes: expected {expected} bytes, got {found}")
            }
            Self::InvalidVector(e) => write!(f, "invalid vector: {e}"),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::InvalidVector(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CodecError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<BitError> for CodecError {
    fn from(e: BitError) -> Self {
        Self::InvalidVector(e)
    }
}
