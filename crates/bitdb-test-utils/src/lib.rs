//! Test utilities and fixtures for bitdb development.
//!
//! Provides a seeded [`VectorGen`] for reproducible random vectors,
//! [`ScratchDir`] for throwaway store files, and a small set of
//! hand-picked [`fixtures`] covering word-boundary edge cases.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::path::{Path, PathBuf};

use bitdb_core::BitVector;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

pub use fixtures::{edge_universes, sample_vectors};

/// Deterministic random vector generator.
///
/// The same seed always yields the same sequence of vectors, so failures
/// reproduce across runs and machines.
pub struct VectorGen {
    rng: ChaCha8Rng,
}

impl VectorGen {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// A vector over `0..universe_size` where each bit is set with
    /// probability `density` (clamped to `[0, 1]`).
    pub fn vector(&mut self, universe_size: usize, density: f64) -> BitVector {
        let threshold = (density.clamp(0.0, 1.0) * u32::MAX as f64) as u32;
        let indices: Vec<usize> = (0..universe_size)
            .filter(|_| self.rng.next_u32() < threshold)
            .collect();
        BitVector::from_indices(universe_size, &indices).unwrap()
    }

    /// `count` indices drawn uniformly from `0..universe_size`, with
    /// repetition and in no particular order.
    pub fn indices(&mut self, universe_size: usize, count: usize) -> Vec<usize> {
        assert!(universe_size > 0, "cannot draw from an empty universe");
        (0..count)
            .map(|_| (self.rng.next_u64() % universe_size as u64) as usize)
            .collect()
    }

    /// A printable key of the given length.
    pub fn key(&mut self, len: usize) -> String {
        const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789_";
        (0..len)
            .map(|_| ALPHABET[(self.rng.next_u32() as usize) % ALPHABET.len()] as char)
            .collect()
    }
}

/// A temporary directory holding one store file, removed on drop.
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Root of the scratch directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the default store file inside the directory.
    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("bits.db")
    }
}

impl Default for ScratchDir {
    fn default() -> Self {
        Self::new()
    }
}
