//! Log record framing.
//!
//! Each record carries its own magic, lengths and a CRC32 over everything
//! except the magic and the checksum itself. A record is committed when
//! all of its bytes are on disk and the checksum matches.

use std::io::{self, Read};

use bitdb_codec::encoded_len;
use bitdb_core::MAX_UNIVERSE_SIZE;

/// Magic bytes at the start of every record.
pub const RECORD_MAGIC: [u8; 4] = *b"BREC";

/// Length of the fixed record header: magic, kind, two lengths, checksum.
pub const RECORD_HEADER_LEN: usize = 4 + 1 + 4 + 4 + 4;

/// Hard upper bound on key length, independent of configuration.
///
/// Replay uses this bound so that lowering
/// [`StoreConfig::max_key_len`](crate::StoreConfig::max_key_len) never
/// turns existing records into torn ones.
pub const MAX_KEY_LEN: usize = 64 * 1024;

/// What a record does to its key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordKind {
    /// Bind the key to the encoded vector in the value.
    Put = 1,
    /// Remove the key. The value is empty.
    Delete = 2,
}

impl RecordKind {
    fn from_u8(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Put),
            2 => Some(Self::Delete),
            _ => None,
        }
    }
}

/// A committed record as seen during replay. The value is not retained;
/// its position is derived from the record offset and the key length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordMeta {
    /// Put or delete.
    pub kind: RecordKind,
    /// The record's key.
    pub key: String,
    /// Length of the value in bytes.
    pub value_len: u32,
}

impl RecordMeta {
    /// Total bytes this record occupies in the log.
    pub fn record_len(&self) -> u64 {
        (RECORD_HEADER_LEN + self.key.len()) as u64 + u64::from(self.value_len)
    }

    /// Offset of the value relative to the start of the record.
    pub fn value_offset(&self) -> u64 {
        (RECORD_HEADER_LEN + self.key.len()) as u64
    }
}

/// Result of reading one record from the log.
#[derive(Debug)]
pub enum Scan {
    /// A committed record.
    Record(RecordMeta),
    /// Clean end of log.
    End,
    /// A complete record whose checksum does not match. Its extent is
    /// known from the header, but its contents are untrusted.
    Damaged {
        /// The record as framed.
        meta: RecordMeta,
        /// What failed.
        reason: String,
    },
    /// The bytes at this position are not a record.
    Torn(String),
}

fn checksum(kind: u8, key: &[u8], value: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&[kind]);
    hasher.update(&(key.len() as u32).to_le_bytes());
    hasher.update(&(value.len() as u32).to_le_bytes());
    hasher.update(key);
    hasher.update(value);
    hasher.finalize()
}

/// Largest value a put record can carry: an encoded maximal vector.
fn max_value_len() -> u64 {
    encoded_len(MAX_UNIVERSE_SIZE) as u64
}

/// Frame a record. The caller guarantees the key and value lengths fit
/// in `u32`.
pub fn encode_record(kind: RecordKind, key: &str, value: &[u8]) -> Vec<u8> {
    let key = key.as_bytes();
    let mut buf = Vec::with_capacity(RECORD_HEADER_LEN + key.len() + value.len());
    buf.extend_from_slice(&RECORD_MAGIC);
    buf.push(kind as u8);
    buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
    buf.extend_from_slice(&checksum(kind as u8, key, value).to_le_bytes());
    buf.extend_from_slice(key);
    buf.extend_from_slice(value);
    buf
}

/// Fill `buf` as far as the reader allows. Returns the number of bytes
/// read, which is short only at end of input.
fn read_until_full(r: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn le_u32(bytes: &[u8]) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(b)
}

/// Read the next record.
///
/// I/O failures are returned as errors. A fully present record with a bad
/// checksum is [`Scan::Damaged`]; anything else that is not a committed
/// record (short read, bad magic, implausible lengths) comes back as
/// [`Scan::Torn`] with a description.
pub fn read_record(r: &mut dyn Read) -> io::Result<Scan> {
    let mut header = [0u8; RECORD_HEADER_LEN];
    let got = read_until_full(r, &mut header)?;
    if got == 0 {
        return Ok(Scan::End);
    }
    if got < RECORD_HEADER_LEN {
        return Ok(Scan::Torn(format!(
            "partial record header ({got} of {RECORD_HEADER_LEN} bytes)"
        )));
    }
    if header[..4] != RECORD_MAGIC {
        return Ok(Scan::Torn("bad record magic".into()));
    }
    let Some(kind) = RecordKind::from_u8(header[4]) else {
        return Ok(Scan::Torn(format!("unknown record kind {}", header[4])));
    };
    let key_len = le_u32(&header[5..9]) as usize;
    let value_len = le_u32(&header[9..13]);
    let crc = le_u32(&header[13..17]);

    if key_len == 0 || key_len > MAX_KEY_LEN {
        return Ok(Scan::Torn(format!("implausible key length {key_len}")));
    }
    if u64::from(value_len) > max_value_len() {
        return Ok(Scan::Torn(format!("implausible value length {value_len}")));
    }
    if kind == RecordKind::Delete && value_len != 0 {
        return Ok(Scan::Torn("delete record carries a value".into()));
    }

    let body_len = key_len as u64 + u64::from(value_len);
    let mut body = Vec::new();
    r.take(body_len).read_to_end(&mut body)?;
    if (body.len() as u64) < body_len {
        return Ok(Scan::Torn(format!(
            "partial record body ({} of {body_len} bytes)",
            body.len()
        )));
    }

    let (key, value) = body.split_at(key_len);
    let crc_ok = checksum(kind as u8, key, value) == crc;
    let Ok(key) = String::from_utf8(key.to_vec()) else {
        return Ok(Scan::Torn("key is not valid UTF-8".into()));
    };
    let meta = RecordMeta {
        kind,
        key,
        value_len,
    };
    if !crc_ok {
        return Ok(Scan::Damaged {
            meta,
            reason: "checksum mismatch".into(),
        });
    }
    Ok(Scan::Record(meta))
}
