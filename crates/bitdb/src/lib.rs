//! bitdb: fixed-universe bit vectors, a compact binary codec and a durable
//! keyed store.
//!
//! This is the facade crate that re-exports the public API of the bitdb
//! sub-crates. For most users, adding `bitdb` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use bitdb::prelude::*;
//!
//! let mut v = BitVector::new(16)?;
//! v.set_many(&[2, 5, 9])?;
//! assert_eq!(v.count(), 3);
//! assert_eq!(v.to_index_list(), vec![2, 5, 9]);
//!
//! let w = BitVector::from_indices(16, &[5, 6])?;
//! assert_eq!(v.setop_count(&w, SetOp::Intersect)?, 1);
//!
//! let bytes = bitdb::codec::encode(&v);
//! assert_eq!(bitdb::codec::decode(&bytes)?, v);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`bits`] | `bitdb-core` | `BitVector`, `SetOp`, `BitError` |
//! | [`codec`] | `bitdb-codec` | Binary encoding and decoding |
//! | [`store`] | `bitdb-store` | `BitStore`, configuration and metrics |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Bit vectors and set algebra (`bitdb-core`).
pub use bitdb_core as bits;

/// Binary vector encoding (`bitdb-codec`).
///
/// [`codec::encode`] and [`codec::decode`] for byte buffers,
/// [`codec::encode_into`] and [`codec::decode_from`] for streams.
pub use bitdb_codec as codec;

/// Durable keyed storage of vectors (`bitdb-store`).
pub use bitdb_store as store;

/// Common imports for typical bitdb usage.
///
/// ```rust
/// use bitdb::prelude::*;
/// ```
pub mod prelude {
    pub use bitdb_core::{BitError, BitVector, SetOp};

    pub use bitdb_codec::CodecError;

    pub use bitdb_store::{BitStore, StoreConfig, StoreError, SyncMode};
}
