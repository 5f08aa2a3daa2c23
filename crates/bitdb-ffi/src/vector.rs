//! Bit vector FFI: lifecycle, bit access, set algebra and encoding.
//!
//! Vectors live in a global `VECTORS` table; the lock is held for the
//! duration of one call. Binary operations accept the same handle on both
//! sides.

use std::sync::Mutex;

use bitdb_codec::{decode, encode};
use bitdb_core::{BitVector, SetOp};

use crate::args::{copy_to_buffer, index, stage_indices, universe, write_out};
use crate::handle::HandleTable;
use crate::status::{BitSetOp, BitStatus};

static VECTORS: Mutex<HandleTable<BitVector>> = Mutex::new(HandleTable::new());

pub(crate) fn vectors() -> &'static Mutex<HandleTable<BitVector>> {
    &VECTORS
}

fn lookup(table: &HandleTable<BitVector>, handle: u64) -> Result<&BitVector, BitStatus> {
    table.get(handle).ok_or(BitStatus::InvalidHandle)
}

fn lookup_mut(
    table: &mut HandleTable<BitVector>,
    handle: u64,
) -> Result<&mut BitVector, BitStatus> {
    table.get_mut(handle).ok_or(BitStatus::InvalidHandle)
}

/// Create an all-zero vector over `universe_size` bits.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_create(universe_size: u64, out: *mut u64) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return BitStatus::InvalidArgument as i32;
        }
        let n = ffi_try!(universe(universe_size));
        let v = ffi_try!(BitVector::new(n));
        let handle = ffi_lock!(VECTORS).insert(v);
        ffi_try!(write_out(out, handle));
        BitStatus::Ok as i32
    })
}

/// Create a vector with the `n_indices` bits at `indices` set.
///
/// `indices` may be null when `n_indices` is 0.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_from_indices(
    universe_size: u64,
    indices: *const i64,
    n_indices: usize,
    out: *mut u64,
) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return BitStatus::InvalidArgument as i32;
        }
        let n = ffi_try!(universe(universe_size));
        let staged = ffi_try!(stage_indices(indices, n_indices));
        let v = ffi_try!(BitVector::from_indices(n, &staged));
        let handle = ffi_lock!(VECTORS).insert(v);
        ffi_try!(write_out(out, handle));
        BitStatus::Ok as i32
    })
}

/// Destroy a vector. Destroying a stale handle returns `InvalidHandle`
/// and has no other effect.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_destroy(handle: u64) -> i32 {
    ffi_guard!({
        match ffi_lock!(VECTORS).remove(handle) {
            Some(_) => BitStatus::Ok as i32,
            None => BitStatus::InvalidHandle as i32,
        }
    })
}

/// Copy a vector into a new handle.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_clone(handle: u64, out: *mut u64) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return BitStatus::InvalidArgument as i32;
        }
        let mut table = ffi_lock!(VECTORS);
        let copy = ffi_try!(lookup(&table, handle)).clone();
        let new = table.insert(copy);
        ffi_try!(write_out(out, new));
        BitStatus::Ok as i32
    })
}

/// Set one bit.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_set(handle: u64, bit: i64) -> i32 {
    ffi_guard!({
        let i = ffi_try!(index(bit));
        let mut table = ffi_lock!(VECTORS);
        ffi_try!(ffi_try!(lookup_mut(&mut table, handle)).set(i));
        BitStatus::Ok as i32
    })
}

/// Clear one bit.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_clear(handle: u64, bit: i64) -> i32 {
    ffi_guard!({
        let i = ffi_try!(index(bit));
        let mut table = ffi_lock!(VECTORS);
        ffi_try!(ffi_try!(lookup_mut(&mut table, handle)).clear(i));
        BitStatus::Ok as i32
    })
}

/// Read one bit into `out` as 0 or 1.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_test(handle: u64, bit: i64, out: *mut u8) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return BitStatus::InvalidArgument as i32;
        }
        let i = ffi_try!(index(bit));
        let table = ffi_lock!(VECTORS);
        let bit = ffi_try!(ffi_try!(lookup(&table, handle)).test(i));
        ffi_try!(write_out(out, u8::from(bit)));
        BitStatus::Ok as i32
    })
}

/// Set every listed bit. If any index is invalid no bit changes.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_set_many(handle: u64, indices: *const i64, n_indices: usize) -> i32 {
    ffi_guard!({
        let staged = ffi_try!(stage_indices(indices, n_indices));
        let mut table = ffi_lock!(VECTORS);
        ffi_try!(ffi_try!(lookup_mut(&mut table, handle)).set_many(&staged));
        BitStatus::Ok as i32
    })
}

/// Clear every listed bit. If any index is invalid no bit changes.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_clear_many(
    handle: u64,
    indices: *const i64,
    n_indices: usize,
) -> i32 {
    ffi_guard!({
        let staged = ffi_try!(stage_indices(indices, n_indices));
        let mut table = ffi_lock!(VECTORS);
        ffi_try!(ffi_try!(lookup_mut(&mut table, handle)).clear_many(&staged));
        BitStatus::Ok as i32
    })
}

/// Number of set bits.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_count(handle: u64, out: *mut u64) -> i32 {
    ffi_guard!({
        let table = ffi_lock!(VECTORS);
        let count = ffi_try!(lookup(&table, handle)).count();
        ffi_try!(write_out(out, count as u64));
        BitStatus::Ok as i32
    })
}

/// Number of addressable bits.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_universe_size(handle: u64, out: *mut u64) -> i32 {
    ffi_guard!({
        let table = ffi_lock!(VECTORS);
        let n = ffi_try!(lookup(&table, handle)).universe_size();
        ffi_try!(write_out(out, n as u64));
        BitStatus::Ok as i32
    })
}

fn combine(a: u64, b: u64, op: SetOp, out: *mut u64) -> i32 {
    if out.is_null() {
        return BitStatus::InvalidArgument as i32;
    }
    let mut table = ffi_lock!(VECTORS);
    let left = ffi_try!(lookup(&table, a));
    let right = ffi_try!(lookup(&table, b));
    let result = ffi_try!(left.apply(right, op));
    let handle = table.insert(result);
    ffi_try!(write_out(out, handle));
    BitStatus::Ok as i32
}

fn combine_in_place(a: u64, b: u64, op: SetOp) -> i32 {
    let mut table = ffi_lock!(VECTORS);
    if a == b {
        // x OP x needs no second borrow.
        let v = ffi_try!(lookup_mut(&mut table, a));
        let copy = v.clone();
        ffi_try!(v.apply_in_place(&copy, op));
        return BitStatus::Ok as i32;
    }
    let right = ffi_try!(lookup(&table, b)).clone();
    ffi_try!(ffi_try!(lookup_mut(&mut table, a)).apply_in_place(&right, op));
    BitStatus::Ok as i32
}

/// `out = a | b` as a new vector.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_union(a: u64, b: u64, out: *mut u64) -> i32 {
    ffi_guard!({ combine(a, b, SetOp::Union, out) })
}

/// `out = a & b` as a new vector.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_intersect(a: u64, b: u64, out: *mut u64) -> i32 {
    ffi_guard!({ combine(a, b, SetOp::Intersect, out) })
}

/// `out = a & !b` as a new vector.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_difference(a: u64, b: u64, out: *mut u64) -> i32 {
    ffi_guard!({ combine(a, b, SetOp::Difference, out) })
}

/// `out = a ^ b` as a new vector.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_symmetric_difference(a: u64, b: u64, out: *mut u64) -> i32 {
    ffi_guard!({ combine(a, b, SetOp::SymmetricDifference, out) })
}

/// `a |= b`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_union_in_place(a: u64, b: u64) -> i32 {
    ffi_guard!({ combine_in_place(a, b, SetOp::Union) })
}

/// `a &= b`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_intersect_in_place(a: u64, b: u64) -> i32 {
    ffi_guard!({ combine_in_place(a, b, SetOp::Intersect) })
}

/// `a &= !b`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_difference_in_place(a: u64, b: u64) -> i32 {
    ffi_guard!({ combine_in_place(a, b, SetOp::Difference) })
}

/// `a ^= b`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_symmetric_difference_in_place(a: u64, b: u64) -> i32 {
    ffi_guard!({ combine_in_place(a, b, SetOp::SymmetricDifference) })
}

/// Population count of `a OP b` without materialising it. `op` is a
/// [`BitSetOp`] value.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_setop_count(a: u64, b: u64, op: i32, out: *mut u64) -> i32 {
    ffi_guard!({
        let Some(op) = BitSetOp::from_code(op) else {
            return BitStatus::InvalidArgument as i32;
        };
        let table = ffi_lock!(VECTORS);
        let left = ffi_try!(lookup(&table, a));
        let right = ffi_try!(lookup(&table, b));
        let count = ffi_try!(left.setop_count(right, op));
        ffi_try!(write_out(out, count as u64));
        BitStatus::Ok as i32
    })
}

/// Write 1 to `out` if both vectors have the same universe and bits.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_equals(a: u64, b: u64, out: *mut u8) -> i32 {
    ffi_guard!({
        let table = ffi_lock!(VECTORS);
        let equal = ffi_try!(lookup(&table, a)) == ffi_try!(lookup(&table, b));
        ffi_try!(write_out(out, u8::from(equal)));
        BitStatus::Ok as i32
    })
}

/// Copy the set indices, ascending, into `buf`.
///
/// The number of set bits is always written to `len_out`; if it exceeds
/// `cap` the call fails with `BufferTooSmall` and `buf` is untouched.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_to_indices(
    handle: u64,
    buf: *mut u64,
    cap: usize,
    len_out: *mut usize,
) -> i32 {
    ffi_guard!({
        let table = ffi_lock!(VECTORS);
        let v = ffi_try!(lookup(&table, handle));
        let indices: Vec<u64> = v.iter_ones().map(|i| i as u64).collect();
        ffi_try!(copy_to_buffer(&indices, buf, cap, len_out));
        BitStatus::Ok as i32
    })
}

/// Serialize a vector into `buf`, with the same length contract as
/// [`bitdb_vector_to_indices`].
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_encode(
    handle: u64,
    buf: *mut u8,
    cap: usize,
    len_out: *mut usize,
) -> i32 {
    ffi_guard!({
        let table = ffi_lock!(VECTORS);
        let bytes = encode(ffi_try!(lookup(&table, handle)));
        ffi_try!(copy_to_buffer(&bytes, buf, cap, len_out));
        BitStatus::Ok as i32
    })
}

/// Deserialize `len` bytes into a new vector.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_vector_decode(bytes: *const u8, len: usize, out: *mut u64) -> i32 {
    ffi_guard!({
        if out.is_null() || (bytes.is_null() && len > 0) {
            return BitStatus::InvalidArgument as i32;
        }
        let data: &[u8] = if len == 0 {
            &[]
        } else {
            // SAFETY: bytes points to len readable bytes per caller contract.
            unsafe { std::slice::from_raw_parts(bytes, len) }
        };
        let v = ffi_try!(decode(data));
        let handle = ffi_lock!(VECTORS).insert(v);
        ffi_try!(write_out(out, handle));
        BitStatus::Ok as i32
    })
}
