//! C FFI bindings for bitdb.
//!
//! Vectors and stores live in process-wide handle tables and are addressed
//! from C by opaque `u64` handles. Every entry point returns a
//! [`BitStatus`] code as `i32` and writes results through out-pointers.
//! Panics never cross the boundary; they surface as
//! [`BitStatus::Panicked`].
//!
//! This is the only crate in the workspace that contains `unsafe` code,
//! confined to pointer reads and writes on caller-supplied buffers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

/// Run an FFI body, converting a panic into [`BitStatus::Panicked`].
///
/// `return` inside the body returns a status from the entry point.
macro_rules! ffi_guard {
    ($body:block) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| -> i32 { $body })) {
            Ok(status) => status,
            Err(_) => $crate::status::BitStatus::Panicked as i32,
        }
    };
}

/// Lock a handle table, returning [`BitStatus::InternalError`] from the
/// enclosing body if a previous panic poisoned it.
macro_rules! ffi_lock {
    ($mutex:expr) => {
        match $mutex.lock() {
            Ok(guard) => guard,
            Err(_) => return $crate::status::BitStatus::InternalError as i32,
        }
    };
}

/// Unwrap a `Result<T, E>` where `&E` converts to [`BitStatus`],
/// returning the status from the enclosing body on error.
macro_rules! ffi_try {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => return $crate::status::BitStatus::from(&e) as i32,
        }
    };
}

mod args;
pub(crate) mod handle;
pub mod status;
pub mod store;
pub mod vector;

pub use status::{BitSetOp, BitStatus};
