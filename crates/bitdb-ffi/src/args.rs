//! Argument staging: C pointers and integers into checked Rust values.

use std::ffi::{c_char, CStr};

use smallvec::SmallVec;

use crate::status::BitStatus;

/// Host index arrays of up to this many entries are staged on the stack.
pub(crate) const INLINE_INDICES: usize = 64;

pub(crate) type Indices = SmallVec<[usize; INLINE_INDICES]>;

/// Copy `n` host indices into a staging buffer. Negative values, and
/// values that do not fit `usize`, fail with `OutOfRange`.
#[allow(unsafe_code)]
pub(crate) fn stage_indices(ptr: *const i64, n: usize) -> Result<Indices, BitStatus> {
    if n == 0 {
        return Ok(Indices::new());
    }
    if ptr.is_null() {
        return Err(BitStatus::InvalidArgument);
    }
    // SAFETY: ptr points to n valid i64 values per caller contract.
    let raw = unsafe { std::slice::from_raw_parts(ptr, n) };
    raw.iter()
        .map(|&i| usize::try_from(i).map_err(|_| BitStatus::OutOfRange))
        .collect()
}

/// Convert a host universe size.
pub(crate) fn universe(size: u64) -> Result<usize, BitStatus> {
    usize::try_from(size).map_err(|_| BitStatus::InvalidSize)
}

/// Convert a single host index.
pub(crate) fn index(i: i64) -> Result<usize, BitStatus> {
    usize::try_from(i).map_err(|_| BitStatus::OutOfRange)
}

/// Borrow a NUL-terminated UTF-8 string from the host.
#[allow(unsafe_code)]
pub(crate) fn c_str<'a>(ptr: *const c_char) -> Result<&'a str, BitStatus> {
    if ptr.is_null() {
        return Err(BitStatus::InvalidArgument);
    }
    // SAFETY: ptr is a valid NUL-terminated string per caller contract,
    // and outlives the call.
    let s = unsafe { CStr::from_ptr(ptr) };
    s.to_str().map_err(|_| BitStatus::InvalidArgument)
}

/// Write `value` through a non-null out-pointer.
#[allow(unsafe_code)]
pub(crate) fn write_out<T>(out: *mut T, value: T) -> Result<(), BitStatus> {
    if out.is_null() {
        return Err(BitStatus::InvalidArgument);
    }
    // SAFETY: out is valid for writes per caller contract.
    unsafe { out.write(value) };
    Ok(())
}

/// Copy `data` into a caller buffer of `cap` elements, reporting the
/// required length through `len_out` even when the buffer is too small.
/// `buf` may be null when `cap` is 0, to query the length.
#[allow(unsafe_code)]
pub(crate) fn copy_to_buffer<T: Copy>(
    data: &[T],
    buf: *mut T,
    cap: usize,
    len_out: *mut usize,
) -> Result<(), BitStatus> {
    write_out(len_out, data.len())?;
    if cap < data.len() {
        return Err(BitStatus::BufferTooSmall);
    }
    if data.is_empty() {
        return Ok(());
    }
    if buf.is_null() {
        return Err(BitStatus::InvalidArgument);
    }
    // SAFETY: buf points to at least cap >= data.len() writable elements.
    unsafe { std::ptr::copy_nonoverlapping(data.as_ptr(), buf, data.len()) };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn small_index_arrays_stay_inline() {
        let host: Vec<i64> = (0..INLINE_INDICES as i64).collect();
        let staged = stage_indices(host.as_ptr(), host.len()).unwrap();
        assert!(!staged.spilled());
        assert_eq!(staged.len(), INLINE_INDICES);
    }

    #[test]
    fn large_index_arrays_spill_to_heap() {
        let host: Vec<i64> = (0..1000).collect();
        let staged = stage_indices(host.as_ptr(), host.len()).unwrap();
        assert!(staged.spilled());
        assert_eq!(staged[999], 999);
    }

    #[test]
    fn negative_index_is_out_of_range() {
        let host = [1i64, -1, 2];
        assert_eq!(
            stage_indices(host.as_ptr(), host.len()),
            Err(BitStatus::OutOfRange)
        );
        assert_eq!(index(-5), Err(BitStatus::OutOfRange));
    }

    #[test]
    fn null_pointers_are_invalid_arguments() {
        assert_eq!(
            stage_indices(std::ptr::null(), 3),
            Err(BitStatus::InvalidArgument)
        );
        assert!(stage_indices(std::ptr::null(), 0).unwrap().is_empty());
        assert_eq!(c_str(std::ptr::null()), Err(BitStatus::InvalidArgument));
        assert_eq!(
            write_out(std::ptr::null_mut::<u64>(), 1),
            Err(BitStatus::InvalidArgument)
        );
    }

    #[test]
    fn c_str_rejects_invalid_utf8() {
        let bad = CString::new(vec![0xFFu8, 0xFE]).unwrap();
        assert_eq!(c_str(bad.as_ptr()), Err(BitStatus::InvalidArgument));
        let good = CString::new("key").unwrap();
        assert_eq!(c_str(good.as_ptr()), Ok("key"));
    }

    #[test]
    fn short_buffer_still_reports_length() {
        let data = [1u64, 2, 3];
        let mut buf = [0u64; 2];
        let mut len = 0usize;
        assert_eq!(
            copy_to_buffer(&data, buf.as_mut_ptr(), buf.len(), &mut len),
            Err(BitStatus::BufferTooSmall)
        );
        assert_eq!(len, 3);

        let mut buf = [0u64; 4];
        copy_to_buffer(&data, buf.as_mut_ptr(), buf.len(), &mut len).unwrap();
        assert_eq!(&buf[..3], &data);
    }
}
