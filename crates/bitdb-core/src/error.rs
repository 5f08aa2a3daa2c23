//! Error types for bit vector operations.

use std::error::Error;
use std::fmt;

/// Errors returned by [`BitVector`](crate::BitVector) operations.
///
/// Every fallible operation validates its inputs before touching the
/// vector, so an `Err` always means the vector is unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BitError {
    /// The requested universe size cannot be represented.
    InvalidSize {
        /// The size that was requested.
        requested: usize,
        /// The largest supported universe size.
        max: usize,
    },
    /// An index was outside `0..universe_size`.
    OutOfRange {
        /// The offending index.
        index: usize,
        /// Universe size of the vector.
        universe_size: usize,
    },
    /// A range was reversed or extended past the universe.
    InvalidRange {
        /// Range start (inclusive).
        start: usize,
        /// Range end (exclusive).
        end: usize,
        /// Universe size of the vector.
        universe_size: usize,
    },
    /// A binary operation was given vectors of different universe sizes.
    SizeMismatch {
        /// Universe size of the left operand.
        left: usize,
        /// Universe size of the right operand.
        right: usize,
    },
    /// A packed word buffer has the wrong length for its universe size.
    WordCountMismatch {
        /// Number of words the universe size requires.
        expected: usize,
        /// Number of words supplied.
        found: usize,
    },
    /// A packed word buffer has bits set at or above `universe_size`.
    PaddingBitsSet {
        /// Universe size the words were checked against.
        universe_size: usize,
    },
}

impl fmt::Display for BitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSize { requested, max } => {
                write!(f, "universe size {requested} exceeds maximum {max}")
            }
            Self::OutOfRange {
                index,
                universe_size,
            } => {
                write!(f, "index {index} out of range for universe of {universe_size}")
            }
            Self::InvalidRange {
                start,
                end,
                universe_size,
            } => {
                write!(
                    f,
                    "range {start}..{end} is invalid for universe of {universe_size}"
                )
            }
            Self::SizeMismatch { left, right } => {
                write!(f, "universe size mismatch: {left} vs {right}")
            }
            Self::WordCountMismatch { expected, found } => {
                write!(f, "expected {expected} words, found {found}")
            }
            Self::PaddingBitsSet { universe_size } => {
                write!(f, "bits set beyond universe size {universe_size}")
            }
        }
    }
}

impl Error for BitError {}
