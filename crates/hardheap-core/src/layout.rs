//! Segment metadata layout and address arithmetic.
//!
//! Every allocation served by the block heap is a *segment*: a contiguous run
//! of 4 KiB blocks whose first bytes hold a [`Segment`] header, followed by a
//! [`SegmentIntegrity`] record, followed by the 16-byte-aligned user data.
//! The byte layout is:
//!
//! ```text
//! [ Segment header | integrity record | padding | user data ... | footer ]
//!   ^base            ^base+HEADER      ...        ^base+USER_DATA_OFFSET
//! ```
//!
//! The footer guard occupies the last four bytes of the segment's block range
//! and is only written at the thorough integrity level.

/// Size of the main heap backing region.
pub const HEAP_SIZE: usize = 64 * 1024 * 1024;

/// Granularity of the block heap. All segment sizes are block multiples.
pub const BLOCK_SIZE: usize = 0x1000;

/// Alignment of every pointer returned to callers.
pub const ALIGNMENT: usize = 16;

/// Requests at or below this many bytes are routed to the small pool first.
pub const SMALL_ALLOCATION_THRESHOLD: usize = 256;

/// Slot granularity of the small pool.
pub const SMALL_BLOCK_SIZE: usize = 32;

/// Size of the small-pool backing region.
pub const SMALL_POOL_SIZE: usize = 1024 * 1024;

/// Sentinel marking a live segment header.
pub const SEGMENT_MAGIC: u32 = 0xCAFE_BABE;

/// Sentinel for the integrity record's leading guard word.
pub const HEADER_GUARD_VALUE: u32 = 0xDEAD_C0DE;

/// Sentinel written to the last four bytes of a segment at thorough level.
pub const FOOTER_GUARD_VALUE: u32 = 0xFEED_FACE;

/// Upper bound on a plausible segment size, in blocks. Anything larger is
/// treated as corruption by the verifier.
pub const MAX_REASONABLE_BLOCKS: u32 = (HEAP_SIZE / BLOCK_SIZE) as u32;

/// Per-segment bookkeeping header, embedded at the base of the segment's
/// block range inside the backing region.
///
/// `next`/`prev` are raw pointers into the same region, kept strictly in
/// memory order. The list is inherently aliased with user data, so the
/// header is only ever reached through raw-pointer arithmetic, never through
/// long-lived references.
#[repr(C)]
pub struct Segment {
    /// Allocation state.
    pub is_free: bool,
    /// Length of the segment in blocks, header included.
    pub size: u32,
    /// Neighbour at the next-higher address, null at the tail.
    pub next: *mut Segment,
    /// Neighbour at the next-lower address, null at the head.
    pub prev: *mut Segment,
    /// Source file of the allocation site (raw bytes, static lifetime).
    pub allocation_file: *const u8,
    /// Length of `allocation_file` in bytes.
    pub allocation_file_len: usize,
    /// Source line of the allocation site.
    pub allocation_line: u32,
    /// Monotonically increasing id assigned at allocation time.
    pub allocation_id: u32,
    /// [`SEGMENT_MAGIC`] for a valid header.
    pub magic: u32,
}

impl Segment {
    /// Records the source site of an allocation.
    pub fn set_site(&mut self, file: &'static str, line: u32) {
        self.allocation_file = file.as_ptr();
        self.allocation_file_len = file.len();
        self.allocation_line = line;
    }

    /// Returns the recorded source file, if any.
    ///
    /// # Safety
    ///
    /// `allocation_file` must be null or point to `allocation_file_len`
    /// bytes of UTF-8 with static lifetime, as written by [`Self::set_site`].
    #[must_use]
    pub unsafe fn site(&self) -> Option<&'static str> {
        if self.allocation_file.is_null() {
            return None;
        }
        // SAFETY: guaranteed by the caller; the pointer was produced from a
        // `&'static str` by `set_site`.
        let bytes =
            unsafe { core::slice::from_raw_parts(self.allocation_file, self.allocation_file_len) };
        core::str::from_utf8(bytes).ok()
    }
}

/// Guard-and-checksum record placed between the header and the user data.
#[repr(C)]
pub struct SegmentIntegrity {
    /// [`HEADER_GUARD_VALUE`] when intact.
    pub header_guard: u32,
    /// FNV-1a over the packed header metadata.
    pub checksum: u32,
}

/// Bytes occupied by the segment header.
pub const SEGMENT_HEADER_SIZE: usize = size_of::<Segment>();

/// Bytes occupied by the integrity record.
pub const INTEGRITY_SIZE: usize = size_of::<SegmentIntegrity>();

/// Offset from a segment's base to its user data.
///
/// Reserves room for the header plus the integrity record, rounded up to
/// [`ALIGNMENT`], so the two never collide with user bytes.
pub const USER_DATA_OFFSET: usize = align_up(SEGMENT_HEADER_SIZE + INTEGRITY_SIZE, ALIGNMENT);

// The integrity record must fit between the header and the user data, and
// the whole prefix must stay well inside a single block.
const _: () = assert!(SEGMENT_HEADER_SIZE + INTEGRITY_SIZE <= USER_DATA_OFFSET);
const _: () = assert!(USER_DATA_OFFSET % ALIGNMENT == 0);
const _: () = assert!(USER_DATA_OFFSET < BLOCK_SIZE);

/// Rounds `value` up to the next multiple of `align` (a power of two).
#[must_use]
pub const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

/// Rounds `value` down to a multiple of `align` (a power of two).
#[must_use]
pub const fn align_down(value: usize, align: usize) -> usize {
    value & !(align - 1)
}

/// Converts a byte count to blocks, rounding up.
///
/// Saturates at `i32::MAX / BLOCK_SIZE` so oversized requests turn into a
/// search that cannot succeed rather than wrapped arithmetic.
#[must_use]
pub fn blocks_for(bytes: usize) -> u32 {
    if bytes > i32::MAX as usize - BLOCK_SIZE {
        return (i32::MAX as usize / BLOCK_SIZE) as u32;
    }
    ((bytes + BLOCK_SIZE - 1) / BLOCK_SIZE) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_offset_is_aligned_and_roomy() {
        assert_eq!(USER_DATA_OFFSET % ALIGNMENT, 0);
        assert!(USER_DATA_OFFSET >= SEGMENT_HEADER_SIZE + INTEGRITY_SIZE);
    }

    #[test]
    fn align_round_trips() {
        assert_eq!(align_up(0, 16), 0);
        assert_eq!(align_up(1, 16), 16);
        assert_eq!(align_up(16, 16), 16);
        assert_eq!(align_up(17, 16), 32);
        assert_eq!(align_down(17, 16), 16);
        assert_eq!(align_down(31, 16), 16);
        assert_eq!(align_down(32, 16), 32);
    }

    #[test]
    fn blocks_round_up() {
        assert_eq!(blocks_for(1), 1);
        assert_eq!(blocks_for(BLOCK_SIZE), 1);
        assert_eq!(blocks_for(BLOCK_SIZE + 1), 2);
        assert_eq!(blocks_for(3 * BLOCK_SIZE), 3);
    }

    #[test]
    fn blocks_saturate_on_huge_requests() {
        assert_eq!(blocks_for(usize::MAX), (i32::MAX as usize / BLOCK_SIZE) as u32);
        assert_eq!(
            blocks_for(i32::MAX as usize),
            (i32::MAX as usize / BLOCK_SIZE) as u32
        );
    }

    #[test]
    fn site_round_trip() {
        let mut s = Segment {
            is_free: false,
            size: 1,
            next: core::ptr::null_mut(),
            prev: core::ptr::null_mut(),
            allocation_file: core::ptr::null(),
            allocation_file_len: 0,
            allocation_line: 0,
            allocation_id: 0,
            magic: SEGMENT_MAGIC,
        };
        // SAFETY: no site recorded yet, pointer is null.
        assert!(unsafe { s.site() }.is_none());
        s.set_site("engine.rs", 42);
        // SAFETY: set_site stored a static literal.
        assert_eq!(unsafe { s.site() }, Some("engine.rs"));
        assert_eq!(s.allocation_line, 42);
    }
}
