//! Allocation statistics.
//!
//! One shared record of live counters, updated by every allocate and release.
//! Arithmetic clamps instead of wrapping: the free path can legitimately see
//! a larger byte count than is on the books (block rounding, repairs), and a
//! corrupted count must never underflow into nonsense.

use crate::layout::{HEAP_SIZE, SMALL_POOL_SIZE};

/// Ceiling for `total_allocated`: the engine cannot hand out more bytes than
/// the two regions hold.
const ALLOCATED_CEILING: usize = HEAP_SIZE + SMALL_POOL_SIZE;

/// Live allocation counters.
#[derive(Debug, Default, Clone)]
pub struct AllocationStats {
    /// Bytes currently allocated, block-rounded.
    pub total_allocated: usize,
    /// Bytes freed since start.
    pub total_freed: usize,
    /// Number of outstanding allocations.
    pub allocation_count: usize,
    /// High-water mark of `total_allocated`.
    pub peak_allocation: usize,
    /// Estimated fragmentation bytes. Kept for layout compatibility, unused.
    pub fragmentation_bytes: usize,
    /// Bytes currently in use inside the small pool.
    pub small_pool_used: usize,
}

impl AllocationStats {
    /// Zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fresh allocation of `bytes` granted bytes.
    pub fn record_allocate(&mut self, bytes: usize) {
        self.total_allocated = self
            .total_allocated
            .saturating_add(bytes)
            .min(ALLOCATED_CEILING);
        self.allocation_count += 1;
        if self.total_allocated > self.peak_allocation {
            self.peak_allocation = self.total_allocated;
        }
    }

    /// Records a release of `bytes` granted bytes.
    pub fn record_free(&mut self, bytes: usize) {
        if bytes > self.total_allocated {
            self.total_freed = self.total_freed.saturating_add(self.total_allocated);
            self.total_allocated = 0;
        } else {
            self.total_allocated -= bytes;
            self.total_freed = self.total_freed.saturating_add(bytes);
        }
        self.allocation_count = self.allocation_count.saturating_sub(1);
    }

    /// Records an in-place growth of an existing allocation. The outstanding
    /// count is unchanged.
    pub fn grow_in_place(&mut self, bytes: usize) {
        self.total_allocated = self
            .total_allocated
            .saturating_add(bytes)
            .min(ALLOCATED_CEILING);
        if self.total_allocated > self.peak_allocation {
            self.peak_allocation = self.total_allocated;
        }
    }

    /// Records an in-place shrink of an existing allocation. The outstanding
    /// count is unchanged.
    pub fn shrink_in_place(&mut self, bytes: usize) {
        if bytes > self.total_allocated {
            self.total_freed = self.total_freed.saturating_add(self.total_allocated);
            self.total_allocated = 0;
        } else {
            self.total_allocated -= bytes;
            self.total_freed = self.total_freed.saturating_add(bytes);
        }
    }

    /// Point-in-time copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_allocated: self.total_allocated,
            total_freed: self.total_freed,
            allocation_count: self.allocation_count,
            peak_allocation: self.peak_allocation,
            small_pool_used: self.small_pool_used,
        }
    }
}

/// Copyable snapshot of the statistics record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total_allocated: usize,
    pub total_freed: usize,
    pub allocation_count: usize,
    pub peak_allocation: usize,
    pub small_pool_used: usize,
}

/// Fragmentation estimate over the free list: `1 - 1/k` for `k` free
/// segments.
///
/// A single free segment scores 0; a heavily fragmented heap approaches 1.
/// The value ignores segment sizes entirely, so it is a coarse heuristic of
/// free-list shattering, not a heterogeneity measure.
#[must_use]
pub fn fragmentation_ratio(free_segments: usize, free_bytes: usize) -> f32 {
    if free_bytes == 0 || free_segments == 0 {
        return 0.0;
    }
    let avg = free_bytes as f32 / free_segments as f32;
    1.0 - avg / free_bytes as f32
}
