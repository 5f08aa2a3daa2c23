//! Binary encoding of bitdb bit vectors.
//!
//! One format serves both inter-process transfer and the records of the
//! on-disk store. Encoding is deterministic: the same vector always
//! produces the same bytes.
//!
//! # Format
//!
//! ```text
//! [MAGIC "BSET"] [VERSION u8] [universe_size u32 LE] [word 0 u64 LE] ... [word N-1 u64 LE]
//! ```
//!
//! `N = ceil(universe_size / 64)`. The total length is exact: a buffer
//! that is shorter or longer than the header implies is rejected, as is
//! one with bits set past `universe_size`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;

pub use codec::{decode, decode_from, encode, encode_into, encoded_len};
pub use error::CodecError;

/// Magic bytes at the start of every encoded vector.
pub const MAGIC: [u8; 4] = *b"BSET";

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;

/// Length of the fixed header: magic, version and universe size.
pub const HEADER_LEN: usize = 4 + 1 + 4;
