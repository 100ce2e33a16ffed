//! Static backing regions.
//!
//! The engine owns two process-wide byte regions for its whole lifetime: the
//! 64 MiB main heap and the 1 MiB small pool. Both live in `.bss`, require no
//! dynamic acquisition, and are never returned to the operating system.
//!
//! All access goes through the allocator mutex; the regions themselves only
//! hand out their base address.

use core::cell::UnsafeCell;

use crate::layout::{ALIGNMENT, HEAP_SIZE, SMALL_POOL_SIZE};

/// Fixed byte region with the platform alignment the allocator hands out.
#[repr(C, align(16))]
pub struct BackingRegion<const N: usize>(UnsafeCell<[u8; N]>);

// SAFETY: the region is plain bytes. Every read and write happens behind the
// global allocator mutex (or inside a test that owns a private instance), so
// shared references to the wrapper never race on the interior.
unsafe impl<const N: usize> Sync for BackingRegion<N> {}

// The wrapper's declared alignment must match what the allocator promises.
const _: () = assert!(align_of::<BackingRegion<0>>() == ALIGNMENT);

impl<const N: usize> BackingRegion<N> {
    /// Creates a zeroed region.
    #[must_use]
    pub const fn new() -> Self {
        Self(UnsafeCell::new([0; N]))
    }

    /// Base address of the region.
    #[must_use]
    pub fn base(&self) -> usize {
        self.0.get() as usize
    }

    /// Length of the region in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for BackingRegion<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide main heap, installed on first use unless the caller
/// registered a region of their own.
pub static MAIN_HEAP: BackingRegion<HEAP_SIZE> = BackingRegion::new();

/// The process-wide small-object pool.
pub static SMALL_POOL: BackingRegion<SMALL_POOL_SIZE> = BackingRegion::new();

/// Half-open containment test for `addr` in `[base, base + len)`.
#[must_use]
pub fn in_range(addr: usize, base: usize, len: usize) -> bool {
    addr >= base && addr < base.wrapping_add(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statics_are_aligned() {
        assert_eq!(MAIN_HEAP.base() % ALIGNMENT, 0);
        assert_eq!(SMALL_POOL.base() % ALIGNMENT, 0);
    }

    #[test]
    fn statics_do_not_overlap() {
        let (mb, ml) = (MAIN_HEAP.base(), MAIN_HEAP.len());
        let (sb, sl) = (SMALL_POOL.base(), SMALL_POOL.len());
        assert!(mb + ml <= sb || sb + sl <= mb);
    }

    #[test]
    fn range_test_is_half_open() {
        assert!(in_range(100, 100, 10));
        assert!(in_range(109, 100, 10));
        assert!(!in_range(110, 100, 10));
        assert!(!in_range(99, 100, 10));
    }
}
