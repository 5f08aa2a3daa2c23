//! Cumulative store counters.

/// Counters describing the work a [`BitStore`](crate::BitStore) has done
/// since it was opened.
///
/// Returned by value from [`BitStore::metrics`](crate::BitStore::metrics);
/// the byte totals reflect the log at the time of the call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreMetrics {
    /// Successful `put` calls.
    pub puts: u64,
    /// Successful reads of a stored vector, including those made by
    /// `count_at` and `setop_counts`.
    pub gets: u64,
    /// Successful `delete` calls.
    pub deletes: u64,
    /// Bytes appended to the log by puts and deletes.
    pub bytes_appended: u64,
    /// Committed records replayed when the store was opened.
    pub records_replayed: u64,
    /// Bytes of uncommitted tail discarded when the store was opened.
    pub torn_bytes_discarded: u64,
    /// Records found with a bad checksum ahead of committed data when the
    /// store was opened. Their keys read as
    /// [`ChecksumMismatch`](crate::StoreError::ChecksumMismatch).
    pub damaged_records: u64,
    /// Completed compactions, manual or automatic.
    pub compactions: u64,
    /// Automatic compactions that failed and were skipped.
    pub compaction_failures: u64,
    /// Bytes of the log occupied by live records.
    pub live_bytes: u64,
    /// Bytes of the log occupied by overwritten records and tombstones.
    pub dead_bytes: u64,
}
