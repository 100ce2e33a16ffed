//! Bitmap-managed pool for small objects.
//!
//! Requests at or below [`SMALL_ALLOCATION_THRESHOLD`] bytes are served from
//! a dedicated region carved into fixed 32-byte slots, one bitmap bit per
//! slot. An allocation takes a run of consecutive slots; a release clears the
//! run starting at the given address. This keeps tiny objects out of the
//! block heap, where each of them would otherwise pin a whole 4 KiB block.
//!
//! The linear first-fit scan is deliberate: the pool is bounded at 32 Ki
//! slots and the pool is not a hot path. A freelist of runs would be the
//! next step if it ever becomes one.

use crate::layout::{SMALL_ALLOCATION_THRESHOLD, SMALL_BLOCK_SIZE, SMALL_POOL_SIZE};
use crate::region::in_range;

/// Total slots the bitmap can describe.
pub const SLOT_CAPACITY: usize = SMALL_POOL_SIZE / SMALL_BLOCK_SIZE;

/// 32-bit words backing the bitmap.
const BITMAP_WORDS: usize = SLOT_CAPACITY / 32;

/// Small-object pool over a fixed region. Bit set = slot in use.
pub struct SmallPool {
    base: usize,
    slot_count: usize,
    bitmap: [u32; BITMAP_WORDS],
}

impl SmallPool {
    /// Binds the pool to a region at `base` of `len` bytes. Regions larger
    /// than the bitmap can describe are truncated.
    #[must_use]
    pub fn new(base: usize, len: usize) -> Self {
        Self {
            base,
            slot_count: (len / SMALL_BLOCK_SIZE).min(SLOT_CAPACITY),
            bitmap: [0; BITMAP_WORDS],
        }
    }

    /// True if `addr` lies inside the pool region.
    #[must_use]
    pub fn contains(&self, addr: usize) -> bool {
        in_range(addr, self.base, self.slot_count * SMALL_BLOCK_SIZE)
    }

    fn is_set(&self, slot: usize) -> bool {
        self.bitmap[slot / 32] & (1 << (slot % 32)) != 0
    }

    fn set(&mut self, slot: usize) {
        self.bitmap[slot / 32] |= 1 << (slot % 32);
    }

    fn clear(&mut self, slot: usize) {
        self.bitmap[slot / 32] &= !(1 << (slot % 32));
    }

    /// Reserves a run of slots for `size` bytes and returns its address, or
    /// `None` when the request is over threshold or no run fits.
    pub fn allocate(&mut self, size: usize) -> Option<usize> {
        if size == 0 || size > SMALL_ALLOCATION_THRESHOLD {
            return None;
        }

        let needed = (size + SMALL_BLOCK_SIZE - 1) / SMALL_BLOCK_SIZE;
        let mut run = 0usize;
        let mut start = 0usize;

        for slot in 0..self.slot_count {
            if self.is_set(slot) {
                run = 0;
                continue;
            }
            if run == 0 {
                start = slot;
            }
            run += 1;
            if run >= needed {
                for s in start..start + needed {
                    self.set(s);
                }
                return Some(self.base + start * SMALL_BLOCK_SIZE);
            }
        }
        None
    }

    /// Length in bytes of the allocated run starting at `addr`, derived by
    /// scanning forward until the first clear bit. Zero when the address is
    /// outside the pool or its slot is not in use.
    #[must_use]
    pub fn run_bytes(&self, addr: usize) -> usize {
        if !self.contains(addr) {
            return 0;
        }
        let start = (addr - self.base) / SMALL_BLOCK_SIZE;
        let mut slots = 0;
        while start + slots < self.slot_count && self.is_set(start + slots) {
            slots += 1;
        }
        slots * SMALL_BLOCK_SIZE
    }

    /// Clears the run starting at `addr` and returns the bytes released.
    pub fn release(&mut self, addr: usize) -> usize {
        let bytes = self.run_bytes(addr);
        if bytes == 0 {
            return 0;
        }
        let start = (addr - self.base) / SMALL_BLOCK_SIZE;
        for slot in start..start + bytes / SMALL_BLOCK_SIZE {
            self.clear(slot);
        }
        bytes
    }

    /// Total bytes the pool can serve.
    #[must_use]
    pub fn capacity_bytes(&self) -> usize {
        self.slot_count * SMALL_BLOCK_SIZE
    }

    /// Number of slots currently in use.
    #[must_use]
    pub fn used_slots(&self) -> usize {
        self.bitmap
            .iter()
            .map(|word| word.count_ones() as usize)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> SmallPool {
        // The unit tests only exercise the bitmap, never the backing bytes,
        // so an arbitrary aligned base is enough.
        SmallPool::new(0x10000, 64 * SMALL_BLOCK_SIZE)
    }

    #[test]
    fn single_slot_round_trip() {
        let mut p = pool();
        let addr = p.allocate(1).unwrap();
        assert_eq!(addr, 0x10000);
        assert_eq!(p.run_bytes(addr), SMALL_BLOCK_SIZE);
        assert_eq!(p.release(addr), SMALL_BLOCK_SIZE);
        assert_eq!(p.used_slots(), 0);
    }

    #[test]
    fn run_spans_consecutive_slots() {
        let mut p = pool();
        let addr = p.allocate(100).unwrap();
        assert_eq!(p.run_bytes(addr), 4 * SMALL_BLOCK_SIZE);
        assert_eq!(p.used_slots(), 4);
    }

    #[test]
    fn over_threshold_rejected() {
        let mut p = pool();
        assert!(p.allocate(SMALL_ALLOCATION_THRESHOLD + 1).is_none());
        assert!(p.allocate(0).is_none());
        assert_eq!(p.allocate(SMALL_ALLOCATION_THRESHOLD).map(|_| ()), Some(()));
    }

    #[test]
    fn first_fit_reuses_freed_hole() {
        let mut p = pool();
        let a = p.allocate(32).unwrap();
        let b = p.allocate(32).unwrap();
        let _c = p.allocate(32).unwrap();
        assert_eq!(b, a + SMALL_BLOCK_SIZE);

        p.release(a);
        let again = p.allocate(32).unwrap();
        assert_eq!(again, a);
    }

    #[test]
    fn exhaustion_returns_none() {
        let mut p = pool();
        let mut held = Vec::new();
        while let Some(addr) = p.allocate(SMALL_BLOCK_SIZE) {
            held.push(addr);
        }
        assert_eq!(held.len(), 64);
        assert!(p.allocate(1).is_none());

        p.release(held[10]);
        assert_eq!(p.allocate(1), Some(held[10]));
    }

    #[test]
    fn fragmented_pool_skips_short_runs() {
        let mut p = pool();
        let slots: Vec<usize> = (0..8).map(|_| p.allocate(SMALL_BLOCK_SIZE).unwrap()).collect();
        // Free every other slot; no two-slot run exists below the tail.
        for addr in slots.iter().step_by(2) {
            p.release(*addr);
        }
        let two = p.allocate(2 * SMALL_BLOCK_SIZE).unwrap();
        assert_eq!(two, slots[7] + SMALL_BLOCK_SIZE);
    }

    #[test]
    fn foreign_addresses_release_nothing() {
        let mut p = pool();
        assert_eq!(p.run_bytes(0xdead_0000), 0);
        assert_eq!(p.release(0xdead_0000), 0);
        let addr = p.allocate(32).unwrap();
        // An in-pool address whose slot is clear frees nothing either.
        assert_eq!(p.release(addr + SMALL_BLOCK_SIZE), 0);
    }
}
