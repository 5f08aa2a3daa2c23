//! The durable bit vector store.

use std::cell::Cell;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use bitdb_codec::{decode, encode};
use bitdb_core::{BitVector, SetOp};

use crate::config::{StoreConfig, SyncMode};
use crate::error::StoreError;
use crate::metrics::StoreMetrics;
use crate::record::{
    encode_record, read_record, RecordKind, RecordMeta, Scan, MAX_KEY_LEN, RECORD_MAGIC,
};
use crate::{FILE_HEADER_LEN, LOG_VERSION, MAGIC};

/// Where the latest record for a live key sits in the log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RecordLocation {
    /// Offset of the first byte of the record.
    offset: u64,
    /// Absolute offset of the value.
    value_offset: u64,
    value_len: u32,
    /// Total record length.
    len: u64,
    /// The record failed its checksum during replay.
    damaged: bool,
}

impl RecordLocation {
    fn new(offset: u64, meta: &RecordMeta) -> Self {
        Self {
            offset,
            value_offset: offset + meta.value_offset(),
            value_len: meta.value_len,
            len: meta.record_len(),
            damaged: false,
        }
    }
}

/// Index one replayed record. Damaged records of either kind leave their
/// key indexed as damaged, since the key's true state is unknown.
fn apply_replayed(
    index: &mut IndexMap<String, RecordLocation>,
    live_bytes: &mut u64,
    offset: u64,
    meta: RecordMeta,
    damaged: bool,
) {
    let loc = RecordLocation {
        damaged,
        ..RecordLocation::new(offset, &meta)
    };
    let old = if meta.kind == RecordKind::Put || damaged {
        let old = index.insert(meta.key, loc);
        *live_bytes += loc.len;
        old
    } else {
        index.swap_remove(&meta.key)
    };
    if let Some(old) = old {
        *live_bytes -= old.len;
    }
}

/// Read one record at an absolute offset.
fn scan_at(file: &File, offset: u64) -> io::Result<Scan> {
    let mut reader = BufReader::new(file);
    reader.seek(SeekFrom::Start(offset))?;
    read_record(&mut reader)
}

/// Offset of the first committed record starting at or after `from`, if
/// any. Used to tell a torn tail from damage in the middle of the log.
fn committed_record_after(file: &File, from: u64) -> io::Result<Option<u64>> {
    let mut candidates = Vec::new();
    {
        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(from))?;
        let mut window = [0u8; 4];
        let mut pos = from;
        let mut byte = [0u8; 1];
        while reader.read(&mut byte)? == 1 {
            window.rotate_left(1);
            window[3] = byte[0];
            pos += 1;
            if window == RECORD_MAGIC {
                candidates.push(pos - 4);
            }
        }
    }
    for offset in candidates {
        if let Scan::Record(_) = scan_at(file, offset)? {
            return Ok(Some(offset));
        }
    }
    Ok(None)
}

/// Path of the temporary file used while compacting the store at `path`.
///
/// A file at this path that survives a crash is an abandoned compaction;
/// [`BitStore::open`] removes it.
pub fn compaction_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".compact");
    PathBuf::from(name)
}

/// A keyed collection of bit vectors persisted in an append-only log.
///
/// Mutations take `&mut self`; the store does no internal locking and
/// expects a single writer per file.
///
/// # Examples
///
/// ```no_run
/// use bitdb_core::BitVector;
/// use bitdb_store::{BitStore, StoreError};
///
/// let mut store = BitStore::open("users.db")?;
/// store.put("active", &BitVector::from_indices(16, &[2, 5, 9])?)?;
/// assert_eq!(store.get("active")?.count(), 3);
/// store.close()?;
/// # Ok::<(), StoreError>(())
/// ```
pub struct BitStore {
    path: PathBuf,
    file: File,
    config: StoreConfig,
    index: IndexMap<String, RecordLocation>,
    /// End of the last committed record; appends start here.
    end: u64,
    /// Sum of the lengths of the records referenced by `index`.
    live_bytes: u64,
    /// Written since the last sync.
    dirty: bool,
    gets: Cell<u64>,
    metrics: StoreMetrics,
}

fn open_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Open {
        path: path.to_path_buf(),
        source,
    }
}

fn file_header() -> [u8; FILE_HEADER_LEN as usize] {
    let mut header = [0u8; FILE_HEADER_LEN as usize];
    header[..4].copy_from_slice(&MAGIC);
    header[4] = LOG_VERSION;
    header
}

/// Fsync the directory holding `path` so a rename into it is durable.
/// Not every platform can open a directory; failure there is ignored.
fn sync_parent_dir(path: &Path) {
    let Some(parent) = path.parent() else { return };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    if let Ok(dir) = File::open(parent) {
        let _ = dir.sync_all();
    }
}

impl BitStore {
    /// Open the store at `path` with the default configuration, creating
    /// it if absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with(path, StoreConfig::default())
    }

    /// Open the store at `path`, creating it if absent.
    ///
    /// An existing log is replayed into memory. Any uncommitted tail is
    /// truncated away. A file that is not a store, or whose log is damaged
    /// ahead of committed records in a way replay cannot skip, fails with
    /// [`StoreError::Open`] and is left as found.
    pub fn open_with(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();

        let stale = compaction_path(&path);
        if stale.exists() {
            warn!("Removing abandoned compaction file {:?}", stale);
            fs::remove_file(&stale).map_err(|e| open_error(&path, e))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| open_error(&path, e))?;

        let mut store = Self {
            path,
            file,
            config,
            index: IndexMap::new(),
            end: FILE_HEADER_LEN,
            live_bytes: 0,
            dirty: false,
            gets: Cell::new(0),
            metrics: StoreMetrics::default(),
        };
        store
            .init_header()
            .map_err(|e| open_error(&store.path, e))?;
        store.replay().map_err(|e| open_error(&store.path, e))?;

        info!(
            "Opened bit store {:?}: {} keys, {} records replayed",
            store.path,
            store.index.len(),
            store.metrics.records_replayed
        );
        Ok(store)
    }

    /// Write the header into a new file, or check the header of an
    /// existing one.
    fn init_header(&mut self) -> io::Result<()> {
        let expected = file_header();
        let len = self.file.metadata()?.len();

        let mut found = Vec::with_capacity(expected.len());
        (&self.file).take(FILE_HEADER_LEN).read_to_end(&mut found)?;
        if found[..] != expected[..found.len()] {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "not a bitdb store (bad header)",
            ));
        }

        if len < FILE_HEADER_LEN {
            // Empty, or a crash interrupted the header write.
            if len > 0 {
                warn!("Rewriting partial store header ({} bytes)", len);
            }
            self.file.set_len(0)?;
            self.file.seek(SeekFrom::Start(0))?;
            self.file.write_all(&expected)?;
            self.file.sync_all()?;
            sync_parent_dir(&self.path);
        }
        Ok(())
    }

    /// Rebuild the index from the log and drop any uncommitted tail.
    ///
    /// Only a tail with no committed record after it is truncated. A
    /// damaged record followed by a committed one is indexed as damaged;
    /// any other damage ahead of committed data fails the open and leaves
    /// the file untouched.
    fn replay(&mut self) -> io::Result<()> {
        let file_len = self.file.metadata()?.len();
        let mut reader = BufReader::new(&self.file);
        reader.seek(SeekFrom::Start(FILE_HEADER_LEN))?;

        let mut offset = FILE_HEADER_LEN;
        loop {
            let reason = match read_record(&mut reader)? {
                Scan::End => break,
                Scan::Record(meta) => {
                    let len = meta.record_len();
                    apply_replayed(
                        &mut self.index,
                        &mut self.live_bytes,
                        offset,
                        meta,
                        false,
                    );
                    self.metrics.records_replayed += 1;
                    offset += len;
                    continue;
                }
                Scan::Damaged { meta, reason } => {
                    let next = offset + meta.record_len();
                    let followed = next < file_len
                        && matches!(scan_at(&self.file, next)?, Scan::Record(_));
                    if followed {
                        warn!(
                            "Damaged record for key {:?} at offset {}: {}",
                            meta.key, offset, reason
                        );
                        apply_replayed(
                            &mut self.index,
                            &mut self.live_bytes,
                            offset,
                            meta,
                            true,
                        );
                        self.metrics.damaged_records += 1;
                        offset = next;
                        reader.seek(SeekFrom::Start(offset))?;
                        continue;
                    }
                    reason
                }
                Scan::Torn(reason) => reason,
            };

            if let Some(at) = committed_record_after(&self.file, offset + 1)? {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "corrupt record at offset {offset} ({reason}) precedes a \
                         committed record at offset {at}"
                    ),
                ));
            }
            warn!(
                "Torn record at offset {}: {}; discarding {} bytes",
                offset,
                reason,
                file_len - offset
            );
            break;
        }
        drop(reader);

        if offset < file_len {
            self.file.set_len(offset)?;
            self.file.sync_all()?;
            self.metrics.torn_bytes_discarded = file_len - offset;
        }
        self.end = offset;
        Ok(())
    }

    /// Lookups accept any key a record can carry, so keys written under a
    /// larger `max_key_len` stay reachable.
    fn check_lookup_key(key: &str) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey {
                reason: "key is empty".into(),
            });
        }
        if key.len() > MAX_KEY_LEN {
            return Err(StoreError::InvalidKey {
                reason: format!("key is {} bytes, limit is {}", key.len(), MAX_KEY_LEN),
            });
        }
        Ok(())
    }

    fn check_new_key(&self, key: &str) -> Result<(), StoreError> {
        Self::check_lookup_key(key)?;
        if key.len() > self.config.max_key_len {
            return Err(StoreError::InvalidKey {
                reason: format!(
                    "key is {} bytes, limit is {}",
                    key.len(),
                    self.config.max_key_len
                ),
            });
        }
        if key.contains('\0') {
            return Err(StoreError::InvalidKey {
                reason: "key contains a NUL byte".into(),
            });
        }
        Ok(())
    }

    /// Append one framed record at `self.end`. On failure the file is cut
    /// back so no partial record remains.
    fn append(&mut self, record: &[u8]) -> Result<(), StoreError> {
        let result = self.write_at_end(record);
        if let Err(e) = result {
            if let Err(rollback) = self.file.set_len(self.end) {
                warn!(
                    "Failed to roll back partial record at offset {}: {}",
                    self.end, rollback
                );
            }
            return Err(StoreError::Io(e));
        }
        self.end += record.len() as u64;
        self.metrics.bytes_appended += record.len() as u64;
        Ok(())
    }

    fn write_at_end(&mut self, record: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(self.end))?;
        self.file.write_all(record)?;
        match self.config.sync_mode {
            SyncMode::EveryWrite => self.file.sync_data()?,
            SyncMode::NoSync => self.dirty = true,
        }
        Ok(())
    }

    /// Bind `key` to `vector`, replacing any previous value.
    pub fn put(&mut self, key: &str, vector: &BitVector) -> Result<(), StoreError> {
        self.check_new_key(key)?;
        let value = encode(vector);
        let record = encode_record(RecordKind::Put, key, &value);
        let offset = self.end;
        self.append(&record)?;

        let meta = RecordMeta {
            kind: RecordKind::Put,
            key: key.to_owned(),
            value_len: value.len() as u32,
        };
        let loc = RecordLocation::new(offset, &meta);
        if let Some(old) = self.index.insert(meta.key, loc) {
            self.live_bytes -= old.len;
        }
        self.live_bytes += loc.len;
        self.metrics.puts += 1;
        debug!("put {:?} at offset {} ({} bytes)", key, loc.offset, loc.len);

        self.maybe_compact();
        Ok(())
    }

    fn read_value(&self, loc: &RecordLocation) -> io::Result<Vec<u8>> {
        let mut file = &self.file;
        file.seek(SeekFrom::Start(loc.value_offset))?;
        let mut buf = vec![0u8; loc.value_len as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn load(&self, key: &str, loc: &RecordLocation) -> Result<BitVector, StoreError> {
        if loc.damaged {
            return Err(StoreError::ChecksumMismatch {
                key: key.to_owned(),
                offset: loc.offset,
            });
        }
        let bytes = self.read_value(loc)?;
        let vector = decode(&bytes).map_err(|source| StoreError::Corrupt {
            key: key.to_owned(),
            source,
        })?;
        self.gets.set(self.gets.get() + 1);
        Ok(vector)
    }

    /// The vector stored under `key`.
    pub fn get(&self, key: &str) -> Result<BitVector, StoreError> {
        Self::check_lookup_key(key)?;
        let loc = self.index.get(key).ok_or_else(|| StoreError::KeyNotFound {
            key: key.to_owned(),
        })?;
        self.load(key, loc)
    }

    /// Remove `key` by appending a tombstone.
    pub fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        Self::check_lookup_key(key)?;
        if !self.index.contains_key(key) {
            return Err(StoreError::KeyNotFound {
                key: key.to_owned(),
            });
        }
        let record = encode_record(RecordKind::Delete, key, &[]);
        let offset = self.end;
        self.append(&record)?;

        if let Some(old) = self.index.swap_remove(key) {
            self.live_bytes -= old.len;
        }
        self.metrics.deletes += 1;
        debug!("delete {:?} at offset {}", key, offset);

        self.maybe_compact();
        Ok(())
    }

    /// Live keys. The order is unspecified.
    pub fn list(&self) -> Vec<String> {
        self.index.keys().cloned().collect()
    }

    /// Whether `key` has a live value.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Path of the backing log.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The configuration the store was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Population count of the vector stored under `key`.
    pub fn count_at(&self, key: &str) -> Result<usize, StoreError> {
        Ok(self.get(key)?.count())
    }

    /// `query OP stored` counted against every stored vector, as
    /// `(key, count)` pairs in [`list`](Self::list) order.
    ///
    /// Fails with [`StoreError::Bit`] at the first stored vector whose
    /// universe differs from the query's.
    pub fn setop_counts(
        &self,
        query: &BitVector,
        op: SetOp,
    ) -> Result<Vec<(String, usize)>, StoreError> {
        let mut out = Vec::with_capacity(self.index.len());
        for (key, loc) in &self.index {
            let stored = self.load(key, loc)?;
            out.push((key.clone(), query.setop_count(&stored, op)?));
        }
        Ok(out)
    }

    /// Counters since open, with the current live/dead byte split.
    pub fn metrics(&self) -> StoreMetrics {
        StoreMetrics {
            gets: self.gets.get(),
            live_bytes: self.live_bytes,
            dead_bytes: self.dead_bytes(),
            ..self.metrics.clone()
        }
    }

    fn dead_bytes(&self) -> u64 {
        self.end - FILE_HEADER_LEN - self.live_bytes
    }

    fn maybe_compact(&mut self) {
        if self.end < self.config.min_compaction_bytes {
            return;
        }
        let dead = self.dead_bytes() as f64;
        if dead / (self.end as f64) < self.config.compaction_ratio {
            return;
        }
        if let Err(e) = self.compact() {
            self.metrics.compaction_failures += 1;
            warn!("Automatic compaction of {:?} failed: {}", self.path, e);
        }
    }

    /// Rewrite the log with only live records.
    ///
    /// The new log is written to [`compaction_path`], synced, then renamed
    /// over the old one. If anything fails before the rename the store is
    /// unchanged.
    ///
    /// Fails with [`StoreError::ChecksumMismatch`] while any key is still
    /// damaged; put or delete it first.
    pub fn compact(&mut self) -> Result<(), StoreError> {
        if let Some((key, loc)) = self.index.iter().find(|(_, loc)| loc.damaged) {
            return Err(StoreError::ChecksumMismatch {
                key: key.clone(),
                offset: loc.offset,
            });
        }
        let tmp_path = compaction_path(&self.path);
        match self.write_compacted(&tmp_path) {
            Ok((file, index, end)) => {
                if let Err(e) = fs::rename(&tmp_path, &self.path) {
                    let _ = fs::remove_file(&tmp_path);
                    return Err(StoreError::Io(e));
                }
                sync_parent_dir(&self.path);

                let before = self.end;
                self.file = file;
                self.index = index;
                self.end = end;
                self.live_bytes = end - FILE_HEADER_LEN;
                self.dirty = false;
                self.metrics.compactions += 1;
                info!(
                    "Compacted bit store {:?}: {} -> {} bytes",
                    self.path, before, end
                );
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                Err(e)
            }
        }
    }

    fn write_compacted(
        &self,
        tmp_path: &Path,
    ) -> Result<(File, IndexMap<String, RecordLocation>, u64), StoreError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(tmp_path)?;

        let mut index = IndexMap::with_capacity(self.index.len());
        let mut offset = FILE_HEADER_LEN;
        {
            let mut out = BufWriter::new(&file);
            out.write_all(&file_header())?;
            for (key, loc) in &self.index {
                let value = self.read_value(loc)?;
                let record = encode_record(RecordKind::Put, key, &value);
                out.write_all(&record)?;
                let meta = RecordMeta {
                    kind: RecordKind::Put,
                    key: key.clone(),
                    value_len: loc.value_len,
                };
                index.insert(key.clone(), RecordLocation::new(offset, &meta));
                offset += record.len() as u64;
            }
            out.flush()?;
        }
        file.sync_all()?;
        Ok((file, index, offset))
    }

    /// Force every written record to stable storage.
    pub fn sync(&mut self) -> Result<(), StoreError> {
        self.file.sync_data()?;
        self.dirty = false;
        Ok(())
    }

    /// Sync and release the store.
    ///
    /// The file handle is released whether or not the final sync
    /// succeeds.
    pub fn close(mut self) -> Result<(), StoreError> {
        self.sync()
    }
}

impl Drop for BitStore {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(e) = self.file.sync_data() {
                warn!("Failed to sync {:?} on drop: {}", self.path, e);
            }
        }
    }
}

impl std::fmt::Debug for BitStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitStore")
            .field("path", &self.path)
            .field("keys", &self.index.len())
            .field("end", &self.end)
            .finish()
    }
}
