//! Core bit vector types for the bitdb workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the dense, fixed-universe [`BitVector`], the [`SetOp`] word operations
//! shared by the vector and the store, and the [`BitError`] type.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bitvec;
pub mod error;
pub mod iter;
pub mod setop;

pub use bitvec::{BitVector, MAX_UNIVERSE_SIZE, WORD_BITS};
pub use error::BitError;
pub use iter::Ones;
pub use setop::SetOp;
