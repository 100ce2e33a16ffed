//! Raw memory utilities.
//!
//! Word-wide copy and fill over raw byte addresses, used by realloc data
//! moves and by zero-on-free. Both take the 64-bit fast path when alignment
//! permits and finish with a byte tail.

use crate::layout::HEAP_SIZE;

/// Copies `bytes` bytes from `src` to `dest`. The ranges must not overlap.
///
/// Null pointers and zero lengths are tolerated and copy nothing.
///
/// # Safety
///
/// When both pointers are non-null, `src` must be readable and `dest`
/// writable for `bytes` bytes, and the two ranges must be disjoint.
pub unsafe fn copy_bytes(dest: *mut u8, src: *const u8, bytes: usize) {
    if dest.is_null() || src.is_null() || bytes == 0 {
        return;
    }

    let mut i = 0usize;
    if (dest as usize | src as usize | bytes) & 7 == 0 {
        let qwords = bytes >> 3;
        // SAFETY: both ranges are valid for `bytes` bytes and 8-byte aligned,
        // and qwords * 8 == bytes here.
        unsafe {
            let mut qdest = dest.cast::<u64>();
            let mut qsrc = src.cast::<u64>();
            for _ in 0..qwords {
                *qdest = *qsrc;
                qdest = qdest.add(1);
                qsrc = qsrc.add(1);
            }
        }
        i = qwords << 3;
    }

    // SAFETY: i <= bytes and both ranges are valid for `bytes` bytes.
    unsafe {
        while i < bytes {
            *dest.add(i) = *src.add(i);
            i += 1;
        }
    }
}

/// Fills `count` bytes at `dest` with `value`.
///
/// Null pointers and zero counts are tolerated. Counts above the heap size
/// are refused; nothing that large is ever a legitimate fill.
///
/// # Safety
///
/// When `dest` is non-null, it must be writable for `count` bytes.
pub unsafe fn fill_bytes(dest: *mut u8, value: u8, count: usize) {
    if dest.is_null() || count == 0 || count > HEAP_SIZE {
        return;
    }

    // Byte-fill up to the first 8-byte boundary.
    let mut i = 0usize;
    // SAFETY: dest is valid for `count` bytes; i < count in every write.
    unsafe {
        while i < count && (dest.add(i) as usize) & 7 != 0 {
            *dest.add(i) = value;
            i += 1;
        }
    }

    if count - i >= 8 {
        let pattern = u64::from_ne_bytes([value; 8]);
        let qwords = (count - i) / 8;
        // SAFETY: dest+i is 8-byte aligned and qwords * 8 <= count - i.
        unsafe {
            let mut qdest = dest.add(i).cast::<u64>();
            for _ in 0..qwords {
                *qdest = pattern;
                qdest = qdest.add(1);
            }
        }
        i += qwords * 8;
    }

    // SAFETY: remaining tail stays inside the `count`-byte range.
    unsafe {
        while i < count {
            *dest.add(i) = value;
            i += 1;
        }
    }
}
