//! Segment integrity verification and repair.
//!
//! Each segment can carry a guard-and-checksum record between its header and
//! user data, plus a trailing footer guard in the last four bytes of its
//! block range. Verification runs at four levels:
//!
//! - `Off`: nothing.
//! - `Basic`: magic sentinel, size plausibility.
//! - `Standard`: plus header guard and FNV-1a metadata checksum.
//! - `Thorough`: plus footer guard, back-pointer symmetry, heap bounds.
//!
//! With `repair` set, the verifier restores what it can: the magic, a size
//! reconstructed from the distance to the next header, both guards, the
//! checksum, and asymmetric list pointers. The error count reflects what was
//! found, not what was fixed.

use crate::layout::{
    BLOCK_SIZE, FOOTER_GUARD_VALUE, HEADER_GUARD_VALUE, MAX_REASONABLE_BLOCKS, SEGMENT_HEADER_SIZE,
    SEGMENT_MAGIC, Segment, SegmentIntegrity,
};
use crate::log::heap_log;
use crate::policy::{CheckLevel, RuntimePolicy};

/// FNV-1a over a byte slice (offset basis 2166136261, prime 16777619).
#[must_use]
pub fn fnv1a(data: &[u8]) -> u32 {
    let mut hash = 2_166_136_261u32;
    for &byte in data {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(16_777_619);
    }
    hash
}

/// Checksum over the packed metadata record
/// `{is_free, size, next, prev, allocation_id, magic}`.
///
/// # Safety
///
/// `s` must point to a readable segment header.
pub(crate) unsafe fn segment_checksum(s: *const Segment) -> u32 {
    // SAFETY: guaranteed by the caller.
    let seg = unsafe { &*s };
    let mut record = [0u8; 32];
    record[0..4].copy_from_slice(&u32::from(seg.is_free).to_le_bytes());
    record[4..8].copy_from_slice(&seg.size.to_le_bytes());
    record[8..16].copy_from_slice(&(seg.next as u64).to_le_bytes());
    record[16..24].copy_from_slice(&(seg.prev as u64).to_le_bytes());
    record[24..28].copy_from_slice(&seg.allocation_id.to_le_bytes());
    record[28..32].copy_from_slice(&seg.magic.to_le_bytes());
    fnv1a(&record)
}

/// Address of the integrity record, immediately after the header.
fn integrity_ptr(s: *mut Segment) -> *mut SegmentIntegrity {
    (s as usize + SEGMENT_HEADER_SIZE) as *mut SegmentIntegrity
}

/// Address of the footer guard: the last four bytes of the segment's block
/// range. `None` when the recorded size is implausible.
///
/// # Safety
///
/// `s` must point to a readable segment header.
unsafe fn footer_ptr(s: *mut Segment) -> Option<*mut u32> {
    // SAFETY: guaranteed by the caller.
    let size = unsafe { (*s).size };
    if size == 0 || size > MAX_REASONABLE_BLOCKS {
        return None;
    }
    let end = s as usize + size as usize * BLOCK_SIZE;
    Some((end - size_of::<u32>()) as *mut u32)
}

/// (Re)writes the integrity record and, at thorough level, the footer guard.
/// Called after any mutation of segment metadata.
///
/// # Safety
///
/// `s` must point to a writable segment whose recorded size covers its block
/// range.
pub(crate) unsafe fn refresh_segment(s: *mut Segment, level: CheckLevel) {
    if s.is_null() || !level.includes(CheckLevel::Standard) {
        return;
    }
    let record = integrity_ptr(s);
    // SAFETY: the layout reserves room for the record between the header and
    // the user data; `s` is valid per the caller.
    unsafe {
        (*record).header_guard = HEADER_GUARD_VALUE;
        (*record).checksum = segment_checksum(s);
    }
    if level.includes(CheckLevel::Thorough) {
        // SAFETY: `s` is valid per the caller.
        if let Some(footer) = unsafe { footer_ptr(s) } {
            // SAFETY: the footer lies inside the segment's block range, which
            // the caller guarantees is owned by this segment.
            unsafe { *footer = FOOTER_GUARD_VALUE };
        }
    }
}

/// Verifies one segment at the given level and returns the number of errors
/// found. With `repair`, each detected fault is restored in place.
///
/// `bounds` is the registered heap region, used by the thorough-level
/// containment check.
///
/// # Safety
///
/// `s` must be null or point to a readable, writable segment header whose
/// `next`/`prev` pointers are null or point to headers in the same region.
pub(crate) unsafe fn verify_segment(
    s: *mut Segment,
    level: CheckLevel,
    repair: bool,
    bounds: (usize, usize),
    policy: &RuntimePolicy,
) -> u32 {
    if s.is_null() || level == CheckLevel::Off {
        return 0;
    }

    let mut errors = 0u32;

    // SAFETY: `s` is non-null and valid per the caller; all field accesses
    // below stay inside the header or the segment's own block range.
    unsafe {
        if (*s).magic != SEGMENT_MAGIC {
            heap_log!(
                policy,
                "CORRUPTION: invalid magic in segment {s:p}: {:#010x} != {SEGMENT_MAGIC:#010x}",
                (*s).magic
            );
            errors += 1;
            if repair {
                (*s).magic = SEGMENT_MAGIC;
            }
        }

        if (*s).size == 0 || (*s).size > MAX_REASONABLE_BLOCKS {
            heap_log!(
                policy,
                "CORRUPTION: unreasonable size in segment {s:p}: {} blocks",
                (*s).size
            );
            errors += 1;
            if repair && !(*s).next.is_null() {
                // Reconstruct the size from the distance to the next header.
                let distance = ((*s).next as usize).wrapping_sub(s as usize);
                let corrected = (distance / BLOCK_SIZE) as u32;
                if corrected > 0 && corrected <= MAX_REASONABLE_BLOCKS {
                    (*s).size = corrected;
                }
            }
        }

        if !level.includes(CheckLevel::Standard) {
            return errors;
        }

        let record = integrity_ptr(s);
        if (*record).header_guard != HEADER_GUARD_VALUE {
            heap_log!(
                policy,
                "CORRUPTION: invalid header guard in segment {s:p}: {:#010x}",
                (*record).header_guard
            );
            errors += 1;
            if repair {
                (*record).header_guard = HEADER_GUARD_VALUE;
            }
        }

        let expected = segment_checksum(s);
        if (*record).checksum != expected {
            heap_log!(
                policy,
                "CORRUPTION: invalid checksum in segment {s:p}: {:#010x} != {expected:#010x}",
                (*record).checksum
            );
            errors += 1;
            if repair {
                (*record).checksum = expected;
            }
        }

        if !level.includes(CheckLevel::Thorough) {
            return errors;
        }

        if let Some(footer) = footer_ptr(s) {
            if *footer != FOOTER_GUARD_VALUE {
                heap_log!(
                    policy,
                    "CORRUPTION: invalid footer guard in segment {s:p}: {:#010x}",
                    *footer
                );
                errors += 1;
                if repair {
                    *footer = FOOTER_GUARD_VALUE;
                }
            }
        }

        let next = (*s).next;
        if !next.is_null() && (*next).prev != s {
            heap_log!(policy, "CORRUPTION: broken list: next->prev != self for {s:p}");
            errors += 1;
            if repair {
                (*next).prev = s;
            }
        }
        let prev = (*s).prev;
        if !prev.is_null() && (*prev).next != s {
            heap_log!(policy, "CORRUPTION: broken list: prev->next != self for {s:p}");
            errors += 1;
            if repair {
                (*prev).next = s;
            }
        }

        let (base, len) = bounds;
        let addr = s as usize;
        if addr < base || addr >= base + len {
            heap_log!(
                policy,
                "CORRUPTION: segment {s:p} outside heap bounds [{base:#x}, {:#x})",
                base + len
            );
            errors += 1;
            // Not repairable from here.
        }
    }

    errors
}

/// Walks the whole segment list, verifying every header.
///
/// Returns `(total_errors, segments_verified, segments_repaired)`. The walk
/// is capped at one segment per heap block, which a well-formed list can
/// never exceed.
///
/// # Safety
///
/// `head` must be null or the first header of a list whose nodes all satisfy
/// the requirements of [`verify_segment`].
pub(crate) unsafe fn verify_heap(
    head: *mut Segment,
    level: CheckLevel,
    repair: bool,
    bounds: (usize, usize),
    policy: &RuntimePolicy,
) -> (u32, usize, usize) {
    let mut total = 0u32;
    let mut verified = 0usize;
    let mut repaired = 0usize;

    let mut s = head;
    while !s.is_null() && verified < MAX_REASONABLE_BLOCKS as usize {
        // SAFETY: forwarded caller guarantee.
        let errors = unsafe { verify_segment(s, level, repair, bounds, policy) };
        total += errors;
        verified += 1;
        if errors > 0 && repair {
            repaired += 1;
        }
        // SAFETY: `s` is a valid header; `next` is null or the next header.
        s = unsafe { (*s).next };
    }

    heap_log!(
        policy,
        "heap integrity verification: {verified} segments checked, {total} errors, {repaired} repaired"
    );
    (total, verified, repaired)
}

#[cfg(test)]
mod tests {
    use crate::layout::USER_DATA_OFFSET;

    use super::*;

    // Known FNV-1a vectors.
    #[test]
    fn fnv1a_reference_values() {
        assert_eq!(fnv1a(b""), 2_166_136_261);
        assert_eq!(fnv1a(b"a"), 0xE40C_292C);
        assert_eq!(fnv1a(b"foobar"), 0xBF9C_F968);
    }

    /// Two-block scratch segment in an owned, 8-aligned buffer.
    fn scratch_segment() -> (Vec<u64>, *mut Segment) {
        let mut buf = vec![0u64; 2 * BLOCK_SIZE / 8];
        let s = buf.as_mut_ptr().cast::<Segment>();
        // SAFETY: the buffer covers two blocks and is aligned for Segment.
        unsafe {
            s.write(Segment {
                is_free: false,
                size: 2,
                next: core::ptr::null_mut(),
                prev: core::ptr::null_mut(),
                allocation_file: core::ptr::null(),
                allocation_file_len: 0,
                allocation_line: 0,
                allocation_id: 7,
                magic: SEGMENT_MAGIC,
            });
        }
        (buf, s)
    }

    fn bounds_of(s: *mut Segment) -> (usize, usize) {
        (s as usize, 2 * BLOCK_SIZE)
    }

    #[test]
    fn fresh_segment_verifies_clean() {
        let (_buf, s) = scratch_segment();
        let policy = RuntimePolicy::new();
        // SAFETY: scratch segment owns its two blocks.
        unsafe {
            refresh_segment(s, CheckLevel::Thorough);
            assert_eq!(
                verify_segment(s, CheckLevel::Thorough, false, bounds_of(s), &policy),
                0
            );
        }
    }

    #[test]
    fn checksum_changes_with_metadata() {
        let (_buf, s) = scratch_segment();
        // SAFETY: scratch segment is valid.
        unsafe {
            let before = segment_checksum(s);
            (*s).is_free = true;
            assert_ne!(segment_checksum(s), before);
        }
    }

    #[test]
    fn corrupt_checksum_found_and_repaired() {
        let (_buf, s) = scratch_segment();
        let policy = RuntimePolicy::new();
        // SAFETY: scratch segment is valid; the record sits in reserved slack.
        unsafe {
            refresh_segment(s, CheckLevel::Standard);
            let record = (s as usize + SEGMENT_HEADER_SIZE) as *mut SegmentIntegrity;
            (*record).checksum ^= 0xFFFF;

            assert_eq!(
                verify_segment(s, CheckLevel::Standard, true, bounds_of(s), &policy),
                1
            );
            assert_eq!(
                verify_segment(s, CheckLevel::Standard, false, bounds_of(s), &policy),
                0
            );
        }
    }

    #[test]
    fn magic_repair_at_basic_level() {
        let (_buf, s) = scratch_segment();
        let policy = RuntimePolicy::new();
        // SAFETY: scratch segment is valid.
        unsafe {
            (*s).magic = 0x1234_5678;
            assert_eq!(
                verify_segment(s, CheckLevel::Basic, true, bounds_of(s), &policy),
                1
            );
            assert_eq!((*s).magic, SEGMENT_MAGIC);
        }
    }

    #[test]
    fn footer_corruption_found_only_at_thorough() {
        let (_buf, s) = scratch_segment();
        let policy = RuntimePolicy::new();
        // SAFETY: scratch segment owns its two blocks, footer included.
        unsafe {
            refresh_segment(s, CheckLevel::Thorough);
            let footer = (s as usize + 2 * BLOCK_SIZE - 4) as *mut u32;
            *footer = 0;

            assert_eq!(
                verify_segment(s, CheckLevel::Standard, false, bounds_of(s), &policy),
                0
            );
            assert_eq!(
                verify_segment(s, CheckLevel::Thorough, true, bounds_of(s), &policy),
                1
            );
            assert_eq!(*footer, FOOTER_GUARD_VALUE);
        }
    }

    #[test]
    fn size_reconstructed_from_next_neighbour() {
        let mut buf = vec![0u64; 3 * BLOCK_SIZE / 8];
        let base = buf.as_mut_ptr() as usize;
        let a = base as *mut Segment;
        let b = (base + 2 * BLOCK_SIZE) as *mut Segment;
        let policy = RuntimePolicy::new();
        // SAFETY: the buffer covers three blocks; a owns two, b owns one.
        unsafe {
            a.write(Segment {
                is_free: true,
                size: 0, // corrupted
                next: b,
                prev: core::ptr::null_mut(),
                allocation_file: core::ptr::null(),
                allocation_file_len: 0,
                allocation_line: 0,
                allocation_id: 0,
                magic: SEGMENT_MAGIC,
            });
            b.write(Segment {
                is_free: false,
                size: 1,
                next: core::ptr::null_mut(),
                prev: a,
                allocation_file: core::ptr::null(),
                allocation_file_len: 0,
                allocation_line: 0,
                allocation_id: 1,
                magic: SEGMENT_MAGIC,
            });

            let errors = verify_segment(a, CheckLevel::Basic, true, (base, 3 * BLOCK_SIZE), &policy);
            assert_eq!(errors, 1);
            assert_eq!((*a).size, 2);
        }
    }

    #[test]
    fn asymmetric_back_pointer_repaired() {
        let mut buf = vec![0u64; 2 * BLOCK_SIZE / 8];
        let base = buf.as_mut_ptr() as usize;
        let a = base as *mut Segment;
        let b = (base + BLOCK_SIZE) as *mut Segment;
        let policy = RuntimePolicy::new();
        // SAFETY: the buffer covers both headers and their blocks.
        unsafe {
            a.write(Segment {
                is_free: false,
                size: 1,
                next: b,
                prev: core::ptr::null_mut(),
                allocation_file: core::ptr::null(),
                allocation_file_len: 0,
                allocation_line: 0,
                allocation_id: 1,
                magic: SEGMENT_MAGIC,
            });
            b.write(Segment {
                is_free: true,
                size: 1,
                next: core::ptr::null_mut(),
                prev: core::ptr::null_mut(), // should be a
                allocation_file: core::ptr::null(),
                allocation_file_len: 0,
                allocation_line: 0,
                allocation_id: 0,
                magic: SEGMENT_MAGIC,
            });
            refresh_segment(a, CheckLevel::Thorough);
            refresh_segment(b, CheckLevel::Thorough);

            let errors =
                verify_segment(a, CheckLevel::Thorough, true, (base, 2 * BLOCK_SIZE), &policy);
            assert_eq!(errors, 1);
            assert_eq!((*b).prev, a);
        }
    }

    #[test]
    fn user_offset_leaves_room_for_record() {
        assert!(SEGMENT_HEADER_SIZE + size_of::<SegmentIntegrity>() <= USER_DATA_OFFSET);
    }
}
