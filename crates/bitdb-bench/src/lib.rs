//! Benchmark profiles for bitdb.
//!
//! - [`Profile::sparse`]: 1M-bit universe, 0.1% density
//! - [`Profile::dense`]: 1M-bit universe, 50% density
//! - [`Profile::small`]: 4096-bit universe, 10% density
//!
//! [`Profile::vectors`] and [`populate_store`] build deterministic inputs
//! from a seed so runs are comparable.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use bitdb_core::BitVector;
use bitdb_store::{BitStore, StoreError};
use bitdb_test_utils::VectorGen;

/// Shape of a benchmark workload.
#[derive(Clone, Copy, Debug)]
pub struct Profile {
    /// Human-readable name, used as the criterion group suffix.
    pub name: &'static str,
    /// Bits per vector.
    pub universe_size: usize,
    /// Probability that any given bit is set.
    pub density: f64,
    /// Vectors per workload.
    pub count: usize,
}

impl Profile {
    /// Large, mostly empty vectors.
    pub fn sparse() -> Self {
        Self {
            name: "sparse_1m",
            universe_size: 1 << 20,
            density: 0.001,
            count: 8,
        }
    }

    /// Large, half-full vectors.
    pub fn dense() -> Self {
        Self {
            name: "dense_1m",
            universe_size: 1 << 20,
            density: 0.5,
            count: 8,
        }
    }

    /// Many small vectors, the typical keyed-store shape.
    pub fn small() -> Self {
        Self {
            name: "small_4k",
            universe_size: 4096,
            density: 0.1,
            count: 256,
        }
    }

    /// `count` seeded random vectors of this shape.
    pub fn vectors(&self, seed: u64) -> Vec<BitVector> {
        let mut vgen = VectorGen::new(seed);
        (0..self.count)
            .map(|_| vgen.vector(self.universe_size, self.density))
            .collect()
    }
}

/// Key under which [`populate_store`] stores the `i`th vector.
pub fn key_for(i: usize) -> String {
    format!("vec_{i:05}")
}

/// Put every vector of `profile` into `store` under [`key_for`] keys.
pub fn populate_store(store: &mut BitStore, profile: &Profile, seed: u64) -> Result<(), StoreError> {
    for (i, v) in profile.vectors(seed).iter().enumerate() {
        store.put(&key_for(i), v)?;
    }
    Ok(())
}
