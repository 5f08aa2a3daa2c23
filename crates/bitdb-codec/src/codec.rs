//! Binary encode/decode for bit vectors.
//!
//! All integers are little-endian. The primitive readers and writers are
//! public so the store's log framing uses the same conventions.

use std::io::{self, Read, Write};

use bitdb_core::{BitVector, WORD_BITS};

use crate::error::CodecError;
use crate::{FORMAT_VERSION, HEADER_LEN, MAGIC};

const WORD_BYTES: usize = WORD_BITS / 8;

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), CodecError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), CodecError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), CodecError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, CodecError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, CodecError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, CodecError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Fill `buf` from `r`, stopping early only at EOF. Returns the number of
/// bytes read.
fn read_until_full(r: &mut dyn Read, buf: &mut [u8]) -> Result<usize, CodecError> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CodecError::Io(e)),
        }
    }
    Ok(filled)
}

// ── Vector encode ───────────────────────────────────────────────

/// Exact encoded length of a vector with the given universe size.
pub fn encoded_len(universe_size: usize) -> usize {
    HEADER_LEN + universe_size.div_ceil(WORD_BITS) * WORD_BYTES
}

/// Encode a vector into a fresh buffer.
pub fn encode(vector: &BitVector) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len(vector.universe_size()));
    buf.extend_from_slice(&MAGIC);
    buf.push(FORMAT_VERSION);
    // BitVector caps universe_size at u32::MAX.
    buf.extend_from_slice(&(vector.universe_size() as u32).to_le_bytes());
    for &word in vector.words() {
        buf.extend_from_slice(&word.to_le_bytes());
    }
    buf
}

/// Encode a vector to a writer.
pub fn encode_into(w: &mut dyn Write, vector: &BitVector) -> Result<(), CodecError> {
    w.write_all(&MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;
    write_u32_le(w, vector.universe_size() as u32)?;
    for &word in vector.words() {
        write_u64_le(w, word)?;
    }
    Ok(())
}

// ── Vector decode ───────────────────────────────────────────────

/// Validate a header and return the universe size it declares.
fn parse_header(header: &[u8; HEADER_LEN]) -> Result<usize, CodecError> {
    if header[0..4] != MAGIC {
        return Err(CodecError::InvalidMagic);
    }
    let version = header[4];
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion { found: version });
    }
    let mut universe = [0u8; 4];
    universe.copy_from_slice(&header[5..9]);
    Ok(u32::from_le_bytes(universe) as usize)
}

fn words_from_le_bytes(body: &[u8]) -> Vec<u64> {
    body.chunks_exact(WORD_BYTES)
        .map(|chunk| {
            let mut word = [0u8; WORD_BYTES];
            word.copy_from_slice(chunk);
            u64::from_le_bytes(word)
        })
        .collect()
}

/// Decode a vector from a buffer holding exactly one encoded vector.
pub fn decode(bytes: &[u8]) -> Result<BitVector, CodecError> {
    let Some(header) = bytes.first_chunk::<HEADER_LEN>() else {
        return Err(CodecError::Truncated {
            expected: HEADER_LEN,
            found: bytes.len(),
        });
    };
    let universe_size = parse_header(header)?;

    let expected = encoded_len(universe_size);
    if bytes.len() < expected {
        return Err(CodecError::Truncated {
            expected,
            found: bytes.len(),
        });
    }
    if bytes.len() > expected {
        return Err(CodecError::TrailingBytes {
            expected,
            found: bytes.len(),
        });
    }

    let words = words_from_le_bytes(&bytes[HEADER_LEN..]);
    Ok(BitVector::from_words(universe_size, words)?)
}

/// Decode one vector from a reader, consuming exactly its bytes.
///
/// The body is read incrementally, so a corrupt header declaring a huge
/// universe fails with [`CodecError::Truncated`] at end of stream
/// instead of allocating the declared size up front.
pub fn decode_from(r: &mut dyn Read) -> Result<BitVector, CodecError> {
    let mut header = [0u8; HEADER_LEN];
    let got = read_until_full(r, &mut header)?;
    if got < HEADER_LEN {
        return Err(CodecError::Truncated {
            expected: HEADER_LEN,
            found: got,
        });
    }
    let universe_size = parse_header(&header)?;

    let body_len = encoded_len(universe_size) - HEADER_LEN;
    let mut body = Vec::new();
    r.take(body_len as u64).read_to_end(&mut body)?;
    if body.len() < body_len {
        return Err(CodecError::Truncated {
            expected: HEADER_LEN + body_len,
            found: HEADER_LEN + body.len(),
        });
    }

    Ok(BitVector::from_words(universe_size, words_from_le_bytes(&body))?)
}
