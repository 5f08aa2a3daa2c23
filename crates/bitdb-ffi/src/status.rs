//! C-compatible status codes and set-operation selectors.
//!
//! [`BitStatus`] is a `repr(i32)` enum with one code per error kind.
//! Conversions from [`BitError`], [`CodecError`] and [`StoreError`] are
//! provided.

use bitdb_codec::CodecError;
use bitdb_core::{BitError, SetOp};
use bitdb_store::StoreError;

/// C-compatible status code returned by all FFI functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitStatus {
    /// Success.
    Ok = 0,
    /// Handle is invalid, stale or was already destroyed.
    InvalidHandle = -1,
    /// Universe size exceeds the supported maximum.
    InvalidSize = -2,
    /// Index or range outside the vector's universe.
    OutOfRange = -3,
    /// Operands have different universe sizes.
    SizeMismatch = -4,
    /// Encoded bytes or a stored record failed validation.
    CorruptData = -5,
    /// No live record for the key.
    KeyNotFound = -6,
    /// The store file could not be opened or is not a store.
    StoreOpen = -7,
    /// The key is empty or too long.
    InvalidKey = -8,
    /// I/O failure on an open store.
    Io = -9,
    /// An argument is null, malformed, or otherwise invalid.
    InvalidArgument = -10,
    /// Caller-provided buffer is too small. The required length is still
    /// written to the length out-pointer.
    BufferTooSmall = -11,
    /// Internal error (e.g. poisoned mutex after a prior panic).
    InternalError = -12,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

/// Set operation selector accepted as `i32` by the counting and combining
/// entry points.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitSetOp {
    /// `a | b`
    Union = 0,
    /// `a & b`
    Intersect = 1,
    /// `a & !b`
    Difference = 2,
    /// `a ^ b`
    SymmetricDifference = 3,
}

impl BitSetOp {
    /// Decode a selector received from C. Unknown values yield `None`.
    pub fn from_code(code: i32) -> Option<SetOp> {
        match code {
            0 => Some(SetOp::Union),
            1 => Some(SetOp::Intersect),
            2 => Some(SetOp::Difference),
            3 => Some(SetOp::SymmetricDifference),
            _ => None,
        }
    }
}

impl From<&BitStatus> for BitStatus {
    fn from(s: &BitStatus) -> Self {
        *s
    }
}

impl From<&BitError> for BitStatus {
    fn from(e: &BitError) -> Self {
        match e {
            BitError::InvalidSize { .. } => BitStatus::InvalidSize,
            BitError::OutOfRange { .. } | BitError::InvalidRange { .. } => BitStatus::OutOfRange,
            BitError::SizeMismatch { .. } => BitStatus::SizeMismatch,
            BitError::WordCountMismatch { .. } | BitError::PaddingBitsSet { .. } => {
                BitStatus::CorruptData
            }
        }
    }
}

impl From<&CodecError> for BitStatus {
    fn from(e: &CodecError) -> Self {
        match e {
            CodecError::Io(_) => BitStatus::Io,
            _ => BitStatus::CorruptData,
        }
    }
}

impl From<&StoreError> for BitStatus {
    fn from(e: &StoreError) -> Self {
        match e {
            StoreError::Open { .. } => BitStatus::StoreOpen,
            StoreError::Io(_) => BitStatus::Io,
            StoreError::KeyNotFound { .. } => BitStatus::KeyNotFound,
            StoreError::InvalidKey { .. } => BitStatus::InvalidKey,
            StoreError::Corrupt { .. } | StoreError::ChecksumMismatch { .. } => {
                BitStatus::CorruptData
            }
            StoreError::Bit(e) => BitStatus::from(e),
            StoreError::InvalidConfig { .. } => BitStatus::InvalidArgument,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn status_code_values_are_stable() {
        assert_eq!(BitStatus::Ok as i32, 0);
        assert_eq!(BitStatus::InvalidHandle as i32, -1);
        assert_eq!(BitStatus::InvalidSize as i32, -2);
        assert_eq!(BitStatus::OutOfRange as i32, -3);
        assert_eq!(BitStatus::SizeMismatch as i32, -4);
        assert_eq!(BitStatus::CorruptData as i32, -5);
        assert_eq!(BitStatus::KeyNotFound as i32, -6);
        assert_eq!(BitStatus::StoreOpen as i32, -7);
        assert_eq!(BitStatus::InvalidKey as i32, -8);
        assert_eq!(BitStatus::Io as i32, -9);
        assert_eq!(BitStatus::InvalidArgument as i32, -10);
        assert_eq!(BitStatus::BufferTooSmall as i32, -11);
        assert_eq!(BitStatus::InternalError as i32, -12);
        assert_eq!(BitStatus::Panicked as i32, -128);
    }

    #[test]
    fn setop_codes_match_selector_values() {
        for op in [
            BitSetOp::Union,
            BitSetOp::Intersect,
            BitSetOp::Difference,
            BitSetOp::SymmetricDifference,
        ] {
            assert!(BitSetOp::from_code(op as i32).is_some());
        }
        assert_eq!(BitSetOp::from_code(1), Some(SetOp::Intersect));
        assert_eq!(BitSetOp::from_code(4), None);
        assert_eq!(BitSetOp::from_code(-1), None);
    }

    #[test]
    fn bit_errors_map_to_distinct_codes() {
        let cases = [
            (
                BitError::InvalidSize {
                    requested: 1,
                    max: 0,
                },
                BitStatus::InvalidSize,
            ),
            (
                BitError::OutOfRange {
                    index: 9,
                    universe_size: 8,
                },
                BitStatus::OutOfRange,
            ),
            (
                BitError::SizeMismatch { left: 8, right: 9 },
                BitStatus::SizeMismatch,
            ),
            (
                BitError::PaddingBitsSet { universe_size: 3 },
                BitStatus::CorruptData,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(BitStatus::from(&err), status, "{err}");
        }
    }

    #[test]
    fn store_errors_map_through() {
        let bit = StoreError::Bit(BitError::SizeMismatch { left: 1, right: 2 });
        assert_eq!(BitStatus::from(&bit), BitStatus::SizeMismatch);

        let missing = StoreError::KeyNotFound { key: "k".into() };
        assert_eq!(BitStatus::from(&missing), BitStatus::KeyNotFound);

        let io = StoreError::Io(io::Error::other("disk"));
        assert_eq!(BitStatus::from(&io), BitStatus::Io);

        let codec = CodecError::InvalidMagic;
        assert_eq!(BitStatus::from(&codec), BitStatus::CorruptData);

        let damaged = StoreError::ChecksumMismatch {
            key: "k".into(),
            offset: 5,
        };
        assert_eq!(BitStatus::from(&damaged), BitStatus::CorruptData);
    }
}
