//! The heap engine.
//!
//! [`Allocator`] owns all process-wide allocator state: the block-heap
//! segment list, the free-segment search hint, the small pool, the
//! statistics record, and the runtime policy. Public entry points dispatch
//! by size and by pointer location: requests at or below the small threshold
//! try the small pool first; `free`/`realloc` route by the pointer's region.
//!
//! The segment list is embedded in the backing region and ordered strictly
//! by address. List surgery happens in exactly two places, [`cut`] and
//! [`merge`], and both restore the integrity records of every header they
//! touch, so checksums stay consistent after each public operation.
//!
//! [`cut`]: Allocator::cut_segment
//! [`merge`]: Allocator::merge_segment

use core::ptr;

use crate::integrity::{refresh_segment, verify_heap, verify_segment};
use crate::layout::{
    ALIGNMENT, BLOCK_SIZE, HEAP_SIZE, SEGMENT_MAGIC, SMALL_ALLOCATION_THRESHOLD, SMALL_BLOCK_SIZE,
    Segment, USER_DATA_OFFSET, align_down, align_up, blocks_for,
};
use crate::log::heap_log;
use crate::policy::RuntimePolicy;
use crate::region::{MAIN_HEAP, SMALL_POOL};
use crate::small::SmallPool;
use crate::stats::{AllocationStats, StatsSnapshot, fragmentation_ratio};
use crate::util::{copy_bytes, fill_bytes};

/// The allocator: block heap, small pool, statistics, and policy in one
/// place, guarded externally by the global mutex.
///
/// The block heap initializes lazily: the first `malloc`/`free`/`realloc`
/// installs the region recorded at construction unless `init` registered a
/// caller-supplied one earlier.
pub struct Allocator {
    /// Address of the first segment header; 0 before initialization.
    head: usize,
    /// Address of the cached free segment, 0 when unset. A search hint
    /// only — never required for correctness.
    hint: usize,
    /// Base of the registered block-heap region.
    heap_base: usize,
    /// Length of the registered block-heap region.
    heap_len: usize,
    initialized: bool,
    next_allocation_id: u32,
    small: SmallPool,
    pub(crate) stats: AllocationStats,
    pub(crate) policy: RuntimePolicy,
}

impl Allocator {
    /// Allocator bound to the process-wide static regions. Intended to be
    /// constructed exactly once, by the global instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            head: 0,
            hint: 0,
            heap_base: MAIN_HEAP.base(),
            heap_len: MAIN_HEAP.len(),
            initialized: false,
            next_allocation_id: 1,
            small: SmallPool::new(SMALL_POOL.base(), SMALL_POOL.len()),
            stats: AllocationStats::new(),
            policy: RuntimePolicy::new(),
        }
    }

    /// Allocator over caller-supplied regions, for tests that need private
    /// instances.
    ///
    /// # Safety
    ///
    /// Both regions must be valid for reads and writes for their full length,
    /// 16-byte aligned, disjoint, and unused by anything else for the
    /// lifetime of the returned value.
    #[must_use]
    pub unsafe fn with_regions(
        heap_base: *mut u8,
        heap_len: usize,
        small_base: *mut u8,
        small_len: usize,
    ) -> Self {
        Self {
            head: 0,
            hint: 0,
            heap_base: heap_base as usize,
            heap_len,
            initialized: false,
            next_allocation_id: 1,
            small: SmallPool::new(small_base as usize, small_len),
            stats: AllocationStats::new(),
            policy: RuntimePolicy::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------------

    /// Registers `len` bytes at `base` as the block-heap backing store and
    /// resets the statistics. A misaligned base is rounded up and the length
    /// reduced accordingly; a region too small for one header plus one block
    /// is rejected silently.
    ///
    /// Re-registering replaces the region and invalidates all outstanding
    /// block-heap pointers.
    ///
    /// # Safety
    ///
    /// The region must be valid for reads and writes for `len` bytes and
    /// unused by anything else for the allocator's lifetime.
    pub unsafe fn init(&mut self, base: usize, len: usize) {
        if base == 0 || len < USER_DATA_OFFSET + BLOCK_SIZE {
            heap_log!(
                self.policy,
                "heap initialization rejected: base={base:#x}, len={len}"
            );
            return;
        }

        let aligned = align_up(base, ALIGNMENT);
        let len = len - (aligned - base);
        let blocks = (len / BLOCK_SIZE) as u32;

        let s = aligned as *mut Segment;
        // SAFETY: the caller vouches for the region; the header fits well
        // inside the first block.
        unsafe {
            s.write(Segment {
                is_free: true,
                size: blocks,
                next: ptr::null_mut(),
                prev: ptr::null_mut(),
                allocation_file: ptr::null(),
                allocation_file_len: 0,
                allocation_line: 0,
                allocation_id: 0,
                magic: SEGMENT_MAGIC,
            });
            refresh_segment(s, self.policy.check_level);
        }

        self.heap_base = aligned;
        self.heap_len = len;
        self.head = aligned;
        self.hint = aligned;
        self.initialized = true;
        self.stats = AllocationStats::new();

        heap_log!(
            self.policy,
            "heap initialized: base={aligned:#x}, {len} bytes, {blocks} blocks"
        );
    }

    fn ensure_initialized(&mut self) {
        if !self.initialized {
            // SAFETY: the pending region was recorded at construction and is
            // owned by this allocator for its whole lifetime.
            unsafe { self.init(self.heap_base, self.heap_len) };
        }
    }

    // -----------------------------------------------------------------------
    // Segment addressing
    // -----------------------------------------------------------------------

    /// User pointer for a segment: header plus reserved integrity space,
    /// already a multiple of the platform alignment.
    fn segment_to_ptr(s: *mut Segment) -> *mut u8 {
        (s as usize + USER_DATA_OFFSET) as *mut u8
    }

    /// Recovers the owning segment of a user pointer, or `None` when the
    /// address cannot belong to this heap or its header fails the magic
    /// check. Under debug mode the header is repair-checked first.
    fn ptr_to_segment(&self, ptr: *mut u8) -> Option<*mut Segment> {
        if ptr.is_null() {
            return None;
        }
        let addr = align_down(ptr as usize, ALIGNMENT);
        let seg_addr = addr.checked_sub(USER_DATA_OFFSET)?;
        if seg_addr < self.heap_base || seg_addr + USER_DATA_OFFSET > self.heap_base + self.heap_len
        {
            return None;
        }

        let s = seg_addr as *mut Segment;
        self.check_corruption(s);
        // SAFETY: seg_addr lies inside the registered region with room for a
        // full header before the user data.
        if unsafe { (*s).magic } != SEGMENT_MAGIC {
            heap_log!(
                self.policy,
                "CRITICAL: invalid magic recovering segment for {ptr:p}"
            );
            return None;
        }
        Some(s)
    }

    /// Debug-mode corruption sweep for one segment: verify with repair at
    /// the configured level. A no-op unless debug mode is on.
    fn check_corruption(&self, s: *mut Segment) {
        if !self.policy.debug_mode || s.is_null() {
            return;
        }
        // SAFETY: callers only pass headers inside the registered region.
        let errors = unsafe {
            verify_segment(
                s,
                self.policy.check_level,
                true,
                (self.heap_base, self.heap_len),
                &self.policy,
            )
        };
        if errors > 0 {
            heap_log!(
                self.policy,
                "CORRUPTION: found and repaired {errors} errors in segment {s:p}"
            );
        }
    }

    // -----------------------------------------------------------------------
    // Free-list search and list surgery
    // -----------------------------------------------------------------------

    /// Best-fit walk from `start`: the smallest free segment with at least
    /// `required` blocks wins, a perfect fit short-circuits.
    fn search_free(&self, start: *mut Segment, required: u32) -> Option<*mut Segment> {
        let mut best: *mut Segment = ptr::null_mut();
        let mut best_size = u32::MAX;

        let mut s = start;
        while !s.is_null() {
            // SAFETY: list nodes all live inside the registered region.
            unsafe {
                if (*s).is_free && (*s).size >= required {
                    self.check_corruption(s);
                    if (*s).size < best_size {
                        best = s;
                        best_size = (*s).size;
                        if best_size == required {
                            return Some(s);
                        }
                    }
                }
                s = (*s).next;
            }
        }
        (!best.is_null()).then_some(best)
    }

    /// Splits `size_to_cut` blocks off the high end of `s` into a new
    /// segment and links it after `s`. The new header inherits the
    /// allocation state of `s`; a cut of everything (or more) is a no-op
    /// returning `s`.
    ///
    /// # Safety
    ///
    /// `s` must be a live header inside the registered region whose recorded
    /// size covers its block range.
    unsafe fn cut_segment(&mut self, s: *mut Segment, size_to_cut: u32) -> *mut Segment {
        // SAFETY: per the caller; the new header lands inside s's old range.
        unsafe {
            if (*s).size <= size_to_cut {
                heap_log!(
                    self.policy,
                    "cannot cut segment {s:p}: size {} <= cut {size_to_cut}",
                    (*s).size
                );
                return s;
            }

            let addr = s as usize + ((*s).size - size_to_cut) as usize * BLOCK_SIZE;
            let addr = align_up(addr, ALIGNMENT);
            let result = addr as *mut Segment;

            (*s).size -= size_to_cut;
            result.write(Segment {
                is_free: (*s).is_free,
                size: size_to_cut,
                next: (*s).next,
                prev: s,
                allocation_file: ptr::null(),
                allocation_file_len: 0,
                allocation_line: 0,
                allocation_id: 0,
                magic: SEGMENT_MAGIC,
            });
            if !(*result).next.is_null() {
                (*(*result).next).prev = result;
            }
            (*s).next = result;

            let level = self.policy.check_level;
            refresh_segment(s, level);
            refresh_segment(result, level);
            refresh_segment((*result).next, level);
            result
        }
    }

    /// Collapses `second` into `first` (its lower-addressed neighbour). The
    /// hint is fixed up when it pointed at the vanished header.
    ///
    /// # Safety
    ///
    /// Both must be live adjacent headers with `first.next == second`.
    unsafe fn merge_segment(&mut self, first: *mut Segment, second: *mut Segment) -> *mut Segment {
        if first.is_null() || second.is_null() {
            return first;
        }
        self.check_corruption(first);
        self.check_corruption(second);

        // SAFETY: per the caller.
        unsafe {
            if self.hint == second as usize {
                self.hint = if (*first).is_free { first as usize } else { 0 };
            }

            (*first).size += (*second).size;
            (*first).next = (*second).next;
            if !(*first).next.is_null() {
                (*(*first).next).prev = first;
            }
            if self.policy.debug_mode {
                (*second).magic = 0;
            }

            let level = self.policy.check_level;
            refresh_segment(first, level);
            refresh_segment((*first).next, level);
            first
        }
    }

    // -----------------------------------------------------------------------
    // Allocation
    // -----------------------------------------------------------------------

    /// Allocates `size` bytes. Zero-size and unsatisfiable requests return
    /// `None`; successful results are 16-byte aligned.
    pub fn malloc(&mut self, size: usize) -> Option<*mut u8> {
        if size == 0 {
            heap_log!(self.policy, "zero-size allocation requested");
            return None;
        }

        if size <= SMALL_ALLOCATION_THRESHOLD {
            if let Some(ptr) = self.allocate_small(size) {
                return Some(ptr);
            }
            heap_log!(
                self.policy,
                "small pool exhausted, falling back to block heap"
            );
        }

        self.ensure_initialized();
        if !self.initialized {
            return None;
        }

        let required = blocks_for(size.checked_add(USER_DATA_OFFSET)?);

        let mut found = if self.hint != 0 {
            self.search_free(self.hint as *mut Segment, required)
        } else {
            None
        };
        if found.is_none() {
            found = self.search_free(self.head as *mut Segment, required);
        }
        let Some(s) = found else {
            heap_log!(self.policy, "allocation failed: no segment for {size} bytes");
            return None;
        };

        // SAFETY: `s` came from the free-list walk, so it is a live header.
        unsafe {
            let granted = if (*s).size > required + 1 {
                // Hand the caller the tail; the head keeps the surplus,
                // stays free, and remains a stable hint target.
                let tail = self.cut_segment(s, required);
                self.hint = s as usize;
                tail
            } else {
                if self.hint == s as usize {
                    self.hint = 0;
                }
                s
            };

            (*granted).is_free = false;
            (*granted).allocation_id = self.next_allocation_id;
            self.next_allocation_id = self.next_allocation_id.wrapping_add(1);
            (*granted).allocation_file = ptr::null();
            (*granted).allocation_file_len = 0;
            (*granted).allocation_line = 0;
            refresh_segment(granted, self.policy.check_level);

            self.stats
                .record_allocate((*granted).size as usize * BLOCK_SIZE);

            let user = Self::segment_to_ptr(granted);
            heap_log!(
                self.policy,
                "allocated {size} bytes at {user:p} (segment {granted:p}, id {})",
                (*granted).allocation_id
            );
            Some(user)
        }
    }

    /// As [`Self::malloc`], recording the allocation site on block-heap
    /// grants when tracking is enabled.
    pub fn malloc_tracked(&mut self, size: usize, file: &'static str, line: u32) -> Option<*mut u8> {
        // SAFETY: `file` has static lifetime.
        unsafe { self.malloc_tracked_raw(size, file.as_ptr(), file.len(), line) }
    }

    /// Raw-pointer form of [`Self::malloc_tracked`] for the C surface.
    ///
    /// # Safety
    ///
    /// `file` must be null or point to `file_len` bytes of UTF-8 that outlive
    /// the allocation (a string literal in practice).
    pub unsafe fn malloc_tracked_raw(
        &mut self,
        size: usize,
        file: *const u8,
        file_len: usize,
        line: u32,
    ) -> Option<*mut u8> {
        let user = self.malloc(size)?;
        if self.policy.track_allocations && !self.small.contains(user as usize) {
            if let Some(s) = self.ptr_to_segment(user) {
                // SAFETY: `s` is the live header just allocated.
                unsafe {
                    (*s).allocation_file = file;
                    (*s).allocation_file_len = file_len;
                    (*s).allocation_line = line;
                    refresh_segment(s, self.policy.check_level);
                }
            }
        }
        Some(user)
    }

    fn allocate_small(&mut self, size: usize) -> Option<*mut u8> {
        let addr = self.small.allocate(size)?;
        let granted = ((size + SMALL_BLOCK_SIZE - 1) / SMALL_BLOCK_SIZE) * SMALL_BLOCK_SIZE;
        self.stats.small_pool_used += granted;
        self.stats.record_allocate(granted);
        heap_log!(
            self.policy,
            "small allocation: {granted} bytes at {addr:#x}"
        );
        Some(addr as *mut u8)
    }

    // -----------------------------------------------------------------------
    // Release
    // -----------------------------------------------------------------------

    /// Releases an allocation. Null is a no-op; unrecognized pointers and
    /// double frees are refused silently (logged under debug).
    pub fn free(&mut self, ptr: *mut u8) {
        if ptr.is_null() {
            heap_log!(self.policy, "ignoring free of null pointer");
            return;
        }

        if self.small.contains(ptr as usize) {
            self.free_small(ptr);
            return;
        }

        if !self.initialized {
            heap_log!(
                self.policy,
                "free of unrecognized pointer {ptr:p}: heap not initialized"
            );
            return;
        }

        let Some(s) = self.ptr_to_segment(ptr) else {
            heap_log!(self.policy, "invalid pointer for free: {ptr:p}");
            return;
        };

        // SAFETY: `s` was validated by pointer recovery.
        unsafe {
            if (*s).is_free {
                heap_log!(self.policy, "WARNING: double free detected for {ptr:p}");
                return;
            }

            let user_size = ((*s).size as usize * BLOCK_SIZE).saturating_sub(USER_DATA_OFFSET);
            let span = self
                .policy
                .zero_depth
                .span(user_size, self.policy.shallow_zero_size);
            if span > 0 {
                heap_log!(self.policy, "zeroing {span} bytes on free at {ptr:p}");
                // SAFETY: the user region extends `user_size` bytes from
                // `ptr`, and span <= user_size.
                fill_bytes(ptr, 0, span);
            }

            self.stats.record_free((*s).size as usize * BLOCK_SIZE);
            (*s).is_free = true;
            refresh_segment(s, self.policy.check_level);

            let mut survivor = s;
            let next = (*survivor).next;
            if !next.is_null() && (*next).is_free {
                survivor = self.merge_segment(survivor, next);
            }
            let prev = (*survivor).prev;
            if !prev.is_null() && (*prev).is_free {
                survivor = self.merge_segment(prev, survivor);
            }
            self.hint = survivor as usize;
        }
    }

    fn free_small(&mut self, ptr: *mut u8) {
        let addr = ptr as usize;
        let bytes = self.small.run_bytes(addr);
        if bytes == 0 {
            heap_log!(self.policy, "no slots freed from small pool for {ptr:p}");
            return;
        }

        let span = self
            .policy
            .zero_depth
            .span(bytes, self.policy.shallow_zero_size);
        if span > 0 {
            // SAFETY: the run extends `bytes` bytes from `ptr` inside the
            // small-pool region, and span <= bytes.
            unsafe { fill_bytes(ptr, 0, span) };
        }

        self.small.release(addr);
        self.stats.small_pool_used = self.stats.small_pool_used.saturating_sub(bytes);
        self.stats.record_free(bytes);
        heap_log!(self.policy, "small free: {bytes} bytes at {ptr:p}");
    }

    // -----------------------------------------------------------------------
    // Resize
    // -----------------------------------------------------------------------

    /// Resizes an allocation.
    ///
    /// Null behaves as `malloc`; zero size behaves as `free` and returns
    /// `None`; requests above half the heap are refused. Growth prefers
    /// merging with a free right-hand neighbour; shrinking splits the excess
    /// off in place. On a failed move the original pointer stays valid.
    pub fn realloc(&mut self, ptr: *mut u8, size: usize) -> Option<*mut u8> {
        if ptr.is_null() {
            return self.malloc(size);
        }
        if size == 0 {
            self.free(ptr);
            return None;
        }
        if size > HEAP_SIZE / 2 {
            heap_log!(self.policy, "realloc refused: {size} bytes exceeds limit");
            return None;
        }

        if self.small.contains(ptr as usize) {
            return self.realloc_small(ptr, size);
        }

        self.ensure_initialized();
        if !self.initialized {
            return None;
        }

        let s = self.ptr_to_segment(ptr)?;
        // SAFETY: `s` was validated by pointer recovery.
        unsafe {
            if (*s).is_free {
                heap_log!(
                    self.policy,
                    "WARNING: realloc of already freed pointer {ptr:p}"
                );
                return None;
            }

            let current_data = ((*s).size as usize * BLOCK_SIZE)
                .checked_sub(USER_DATA_OFFSET)
                .unwrap_or(0);
            let required = blocks_for(size.checked_add(USER_DATA_OFFSET)?);

            if (*s).size == required {
                return Some(ptr);
            }

            if (*s).size > required {
                // Shrink in place, splitting the excess off when it is worth
                // a header of its own.
                if (*s).size > required + blocks_for(USER_DATA_OFFSET) {
                    let tail = self.cut_segment(s, (*s).size - required);
                    (*tail).is_free = true;
                    refresh_segment(tail, self.policy.check_level);
                    self.hint = tail as usize;
                    self.stats
                        .shrink_in_place((*tail).size as usize * BLOCK_SIZE);
                }
                return Some(ptr);
            }

            let next = (*s).next;
            if !next.is_null()
                && (*next).is_free
                && (*s).size.saturating_add((*next).size) >= required
            {
                let old_blocks = (*s).size;
                let merged = self.merge_segment(s, next);
                if (*merged).size > required + blocks_for(USER_DATA_OFFSET) {
                    let tail = self.cut_segment(merged, (*merged).size - required);
                    (*tail).is_free = true;
                    refresh_segment(tail, self.policy.check_level);
                    self.hint = tail as usize;
                }
                self.stats
                    .grow_in_place(((*merged).size - old_blocks) as usize * BLOCK_SIZE);
                heap_log!(self.policy, "realloc expanded {ptr:p} in place");
                return Some(ptr);
            }

            // Move: allocate fresh, copy what fits, release the original.
            let new_ptr = self.malloc(size)?;
            let copy = size.min(current_data);
            if copy > 0 {
                // SAFETY: `new_ptr` is valid for `size` bytes, the old user
                // region for `current_data`; a fresh grant never overlaps a
                // live one.
                copy_bytes(new_ptr, ptr, copy);
            }
            self.free(ptr);
            Some(new_ptr)
        }
    }

    /// Small allocations always move: the run cannot grow in place, so the
    /// old length is derived from the bitmap and the data relocated.
    fn realloc_small(&mut self, ptr: *mut u8, size: usize) -> Option<*mut u8> {
        let old = self.small.run_bytes(ptr as usize);
        let new_ptr = self.malloc(size)?;
        let copy = size.min(old);
        if copy > 0 {
            // SAFETY: the old run holds `old` bytes, the grant `size`; a
            // fresh grant never overlaps a live run.
            unsafe { copy_bytes(new_ptr, ptr, copy) };
        }
        self.free(ptr);
        heap_log!(
            self.policy,
            "small realloc: {ptr:p} -> {new_ptr:p}, copied {copy} bytes"
        );
        Some(new_ptr)
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Snapshot of the statistics counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Fragmentation estimate over the free list, in `[0, 1)`.
    #[must_use]
    pub fn fragmentation(&self) -> f32 {
        if !self.initialized {
            return 0.0;
        }
        let mut free_segments = 0usize;
        let mut free_bytes = 0usize;
        let mut s = self.head as *const Segment;
        // SAFETY: the list is embedded in the registered region.
        unsafe {
            while !s.is_null() {
                if (*s).is_free {
                    free_segments += 1;
                    free_bytes += (*s).size as usize * BLOCK_SIZE;
                }
                s = (*s).next;
            }
        }
        fragmentation_ratio(free_segments, free_bytes)
    }

    /// Walks the whole heap verifying every segment at the configured level.
    /// Returns the error count, or -1 when the heap is not initialized.
    pub fn verify_integrity(&mut self, repair: bool) -> i32 {
        if !self.initialized {
            heap_log!(self.policy, "cannot verify integrity: heap not initialized");
            return -1;
        }
        // SAFETY: `head` is the live list head inside the registered region.
        let (errors, verified, repaired) = unsafe {
            verify_heap(
                self.head as *mut Segment,
                self.policy.check_level,
                repair,
                (self.heap_base, self.heap_len),
                &self.policy,
            )
        };
        heap_log!(
            self.policy,
            "integrity verification: {verified} segments, {errors} errors, {repaired} repaired"
        );
        errors as i32
    }

    /// Emits a status report through the configured sink. Unlike the
    /// diagnostics, this writes whenever called, debug mode or not.
    pub fn print_status(&self) {
        let emit = self.policy.log_sink;
        if !self.initialized {
            emit("heap not initialized");
            return;
        }

        emit("=== Memory Allocator Status ===");
        emit(&format!(
            "Total allocated: {} bytes",
            self.stats.total_allocated
        ));
        emit(&format!("Total freed: {} bytes", self.stats.total_freed));
        emit(&format!(
            "Active allocations: {}",
            self.stats.allocation_count
        ));
        emit(&format!(
            "Peak memory usage: {} bytes",
            self.stats.peak_allocation
        ));
        emit(&format!(
            "Small pool usage: {}/{} bytes",
            self.stats.small_pool_used,
            self.small.capacity_bytes()
        ));
        emit(&format!(
            "Fragmentation: {:.2}%",
            self.fragmentation() * 100.0
        ));
        emit(&format!("Zero-on-free depth: {}", self.policy.zero_depth_label()));
        if self.policy.zero_depth == crate::policy::ZeroDepth::Shallow {
            emit(&format!(
                "Shallow zero size: {} bytes",
                self.policy.shallow_zero_size
            ));
        }
        emit(&format!(
            "Thread safety: {}",
            if self.policy.thread_safety {
                "enabled"
            } else {
                "disabled"
            }
        ));

        if self.policy.track_allocations {
            emit("");
            emit("=== Active Allocations ===");
            let mut s = self.head as *const Segment;
            // SAFETY: the list is embedded in the registered region, and the
            // site pointer is null or a static literal written by set_site.
            unsafe {
                while !s.is_null() {
                    if !(*s).is_free {
                        match (*s).site() {
                            Some(file) => emit(&format!(
                                "ID: {}, Size: {} blocks, Location: {}:{}",
                                (*s).allocation_id,
                                (*s).size,
                                file,
                                (*s).allocation_line
                            )),
                            None => emit(&format!(
                                "ID: {}, Size: {} blocks, Location: unknown",
                                (*s).allocation_id,
                                (*s).size
                            )),
                        }
                    }
                    s = (*s).next;
                }
            }
        }
        emit("==============================");
    }

    /// True when `ptr` lies inside the small-pool region.
    #[must_use]
    pub fn is_small_allocation(&self, ptr: *mut u8) -> bool {
        self.small.contains(ptr as usize)
    }

    /// Number of segments in the block heap, free and in use. Zero before
    /// initialization.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        let mut count = 0;
        let mut s = self.head as *const Segment;
        // SAFETY: the list is embedded in the registered region.
        unsafe {
            while !s.is_null() {
                count += 1;
                s = (*s).next;
            }
        }
        count
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}
