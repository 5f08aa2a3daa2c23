//! Store configuration, defaults and validation.

use crate::error::StoreError;
use crate::record::MAX_KEY_LEN;

/// When the store forces written records to stable storage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// `sync_data` after every put and delete. A call that returned `Ok`
    /// survives power loss.
    #[default]
    EveryWrite,
    /// Leave flushing to the OS until [`BitStore::sync`](crate::BitStore::sync)
    /// or [`BitStore::close`](crate::BitStore::close). Records still
    /// survive a process crash; only machine crashes can lose them.
    NoSync,
}

/// Configuration for a [`BitStore`](crate::BitStore).
///
/// Validated when the store is opened; immutable afterwards.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Durability policy for writes. Default: [`SyncMode::EveryWrite`].
    pub sync_mode: SyncMode,

    /// Fraction of the log occupied by overwritten or deleted records
    /// that triggers automatic compaction. Must be in `(0, 1]`.
    ///
    /// Default: 0.5.
    pub compaction_ratio: f64,

    /// Logs smaller than this many bytes are never compacted
    /// automatically.
    ///
    /// Default: 1 MiB.
    pub min_compaction_bytes: u64,

    /// Longest accepted key, in bytes. Must be between 1 and
    /// [`MAX_KEY_LEN`].
    ///
    /// Default: 1024.
    pub max_key_len: usize,
}

impl StoreConfig {
    /// Default compaction trigger ratio.
    pub const DEFAULT_COMPACTION_RATIO: f64 = 0.5;

    /// Default minimum log size for automatic compaction.
    pub const DEFAULT_MIN_COMPACTION_BYTES: u64 = 1024 * 1024;

    /// Default maximum key length.
    pub const DEFAULT_MAX_KEY_LEN: usize = 1024;

    /// Configuration for tests and scratch stores: no fsync, and
    /// compaction as soon as half the log is dead.
    pub fn testing() -> Self {
        Self {
            sync_mode: SyncMode::NoSync,
            min_compaction_bytes: 0,
            ..Self::default()
        }
    }

    /// Configuration that never compacts automatically.
    pub fn manual_compaction() -> Self {
        Self {
            min_compaction_bytes: u64::MAX,
            ..Self::default()
        }
    }

    /// Check all invariants.
    pub fn validate(&self) -> Result<(), StoreError> {
        if !(self.compaction_ratio > 0.0 && self.compaction_ratio <= 1.0) {
            return Err(StoreError::InvalidConfig {
                reason: format!(
                    "compaction_ratio must be in (0, 1], got {}",
                    self.compaction_ratio
                ),
            });
        }
        if self.max_key_len == 0 || self.max_key_len > MAX_KEY_LEN {
            return Err(StoreError::InvalidConfig {
                reason: format!(
                    "max_key_len must be in 1..={MAX_KEY_LEN}, got {}",
                    self.max_key_len
                ),
            });
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sync_mode: SyncMode::default(),
            compaction_ratio: Self::DEFAULT_COMPACTION_RATIO,
            min_compaction_bytes: Self::DEFAULT_MIN_COMPACTION_BYTES,
            max_key_len: Self::DEFAULT_MAX_KEY_LEN,
        }
    }
}
