//! Store FFI: open/close, keyed put/get/delete, enumeration, compaction.
//!
//! Stores and vectors live in separate tables. Calls that touch both lock
//! them one after the other, never together.

use std::ffi::c_char;
use std::sync::Mutex;

use bitdb_store::BitStore;

use crate::args::{c_str, copy_to_buffer, write_out};
use crate::handle::HandleTable;
use crate::status::{BitSetOp, BitStatus};
use crate::vector::vectors;

static STORES: Mutex<HandleTable<BitStore>> = Mutex::new(HandleTable::new());

fn lookup(table: &HandleTable<BitStore>, handle: u64) -> Result<&BitStore, BitStatus> {
    table.get(handle).ok_or(BitStatus::InvalidHandle)
}

fn lookup_mut(table: &mut HandleTable<BitStore>, handle: u64) -> Result<&mut BitStore, BitStatus> {
    table.get_mut(handle).ok_or(BitStatus::InvalidHandle)
}

/// Open (or create) the store at the NUL-terminated UTF-8 `path`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_store_open(path: *const c_char, out: *mut u64) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return BitStatus::InvalidArgument as i32;
        }
        let path = ffi_try!(c_str(path));
        let store = ffi_try!(BitStore::open(path));
        let handle = ffi_lock!(STORES).insert(store);
        ffi_try!(write_out(out, handle));
        BitStatus::Ok as i32
    })
}

/// Sync and close a store. The handle is invalid afterwards even if the
/// final sync fails.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_store_close(handle: u64) -> i32 {
    ffi_guard!({
        let store = match ffi_lock!(STORES).remove(handle) {
            Some(s) => s,
            None => return BitStatus::InvalidHandle as i32,
        };
        ffi_try!(store.close());
        BitStatus::Ok as i32
    })
}

/// Store a copy of `vector` under `key`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_store_put(handle: u64, key: *const c_char, vector: u64) -> i32 {
    ffi_guard!({
        let key = ffi_try!(c_str(key));
        let value = match ffi_lock!(vectors()).get(vector) {
            Some(v) => v.clone(),
            None => return BitStatus::InvalidHandle as i32,
        };
        let mut table = ffi_lock!(STORES);
        ffi_try!(ffi_try!(lookup_mut(&mut table, handle)).put(key, &value));
        BitStatus::Ok as i32
    })
}

/// Load the vector under `key` into a new vector handle.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_store_get(handle: u64, key: *const c_char, out: *mut u64) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return BitStatus::InvalidArgument as i32;
        }
        let key = ffi_try!(c_str(key));
        let value = {
            let table = ffi_lock!(STORES);
            ffi_try!(ffi_try!(lookup(&table, handle)).get(key))
        };
        let new = ffi_lock!(vectors()).insert(value);
        ffi_try!(write_out(out, new));
        BitStatus::Ok as i32
    })
}

/// Remove `key`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_store_delete(handle: u64, key: *const c_char) -> i32 {
    ffi_guard!({
        let key = ffi_try!(c_str(key));
        let mut table = ffi_lock!(STORES);
        ffi_try!(ffi_try!(lookup_mut(&mut table, handle)).delete(key));
        BitStatus::Ok as i32
    })
}

/// Write 1 to `out` if `key` has a live value.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_store_contains(handle: u64, key: *const c_char, out: *mut u8) -> i32 {
    ffi_guard!({
        let key = ffi_try!(c_str(key));
        let table = ffi_lock!(STORES);
        let found = ffi_try!(lookup(&table, handle)).contains(key);
        ffi_try!(write_out(out, u8::from(found)));
        BitStatus::Ok as i32
    })
}

/// Number of live keys.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_store_len(handle: u64, out: *mut u64) -> i32 {
    ffi_guard!({
        let table = ffi_lock!(STORES);
        let len = ffi_try!(lookup(&table, handle)).len();
        ffi_try!(write_out(out, len as u64));
        BitStatus::Ok as i32
    })
}

/// Write all live keys into `buf`, each followed by a NUL byte.
///
/// The required byte length is always written to `len_out`; if it
/// exceeds `cap` the call fails with `BufferTooSmall`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_store_list_keys(
    handle: u64,
    buf: *mut u8,
    cap: usize,
    len_out: *mut usize,
) -> i32 {
    ffi_guard!({
        let table = ffi_lock!(STORES);
        let keys = ffi_try!(lookup(&table, handle)).list();
        let mut packed = Vec::with_capacity(keys.iter().map(|k| k.len() + 1).sum());
        for key in &keys {
            packed.extend_from_slice(key.as_bytes());
            packed.push(0);
        }
        ffi_try!(copy_to_buffer(&packed, buf, cap, len_out));
        BitStatus::Ok as i32
    })
}

/// Population count of the vector stored under `key`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_store_count_at(handle: u64, key: *const c_char, out: *mut u64) -> i32 {
    ffi_guard!({
        let key = ffi_try!(c_str(key));
        let table = ffi_lock!(STORES);
        let count = ffi_try!(ffi_try!(lookup(&table, handle)).count_at(key));
        ffi_try!(write_out(out, count as u64));
        BitStatus::Ok as i32
    })
}

/// Population count of `query OP stored` for the vector under `key`.
/// `op` is a [`BitSetOp`] value.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_store_setop_count(
    handle: u64,
    key: *const c_char,
    query: u64,
    op: i32,
    out: *mut u64,
) -> i32 {
    ffi_guard!({
        let Some(op) = BitSetOp::from_code(op) else {
            return BitStatus::InvalidArgument as i32;
        };
        let key = ffi_try!(c_str(key));
        let query = match ffi_lock!(vectors()).get(query) {
            Some(v) => v.clone(),
            None => return BitStatus::InvalidHandle as i32,
        };
        let stored = {
            let table = ffi_lock!(STORES);
            ffi_try!(ffi_try!(lookup(&table, handle)).get(key))
        };
        let count = ffi_try!(query.setop_count(&stored, op));
        ffi_try!(write_out(out, count as u64));
        BitStatus::Ok as i32
    })
}

/// Rewrite the store's log without dead records.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bitdb_store_compact(handle: u64) -> i32 {
    ffi_guard!({
        let mut table = ffi_lock!(STORES);
        ffi_try!(ffi_try!(lookup_mut(&mut table, handle)).compact());
        BitStatus::Ok as i32
    })
}
