//! Process-wide allocator instance and the public operation surface.
//!
//! All state lives in one [`Allocator`] behind a mutex, created on first
//! use. Every public operation locks, runs to completion, and unlocks;
//! nothing suspends and nothing blocks beyond the lock itself.

use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::heap::Allocator;
use crate::log::LogSink;
use crate::policy::{CheckLevel, ZeroDepth};
use crate::stats::StatsSnapshot;

/// The process-wide allocator.
fn global() -> &'static Mutex<Allocator> {
    static ALLOCATOR: OnceLock<Mutex<Allocator>> = OnceLock::new();
    ALLOCATOR.get_or_init(|| Mutex::new(Allocator::new()))
}

/// Registers a caller-supplied region as the block-heap backing store.
///
/// Not required: the first allocation installs the built-in static region.
/// Re-registering replaces the region and invalidates every outstanding
/// block-heap pointer, so it is best done once, before any allocation.
///
/// # Safety
///
/// The region must be valid for reads and writes for `size` bytes and
/// reserved for the allocator for the rest of the program's lifetime.
pub unsafe fn heap_init(buf: *mut u8, size: usize) {
    // SAFETY: forwarded caller guarantee.
    unsafe { global().lock().init(buf as usize, size) };
}

/// Allocates `size` bytes. Returns `None` for zero-size or unsatisfiable
/// requests; successful results are aligned to 16 bytes.
pub fn malloc(size: usize) -> Option<*mut u8> {
    global().lock().malloc(size)
}

/// As [`malloc`], recording the allocation site when tracking is enabled.
pub fn malloc_tracked(size: usize, file: &'static str, line: u32) -> Option<*mut u8> {
    global().lock().malloc_tracked(size, file, line)
}

/// Raw-pointer form of [`malloc_tracked`] for the C surface.
///
/// # Safety
///
/// `file` must be null or point to `file_len` bytes of UTF-8 that outlive
/// the allocation (a string literal in practice).
pub unsafe fn malloc_tracked_raw(
    size: usize,
    file: *const u8,
    file_len: usize,
    line: u32,
) -> Option<*mut u8> {
    // SAFETY: forwarded caller guarantee.
    unsafe { global().lock().malloc_tracked_raw(size, file, file_len, line) }
}

/// Releases an allocation. Null is a no-op; unrecognized pointers are
/// ignored silently.
pub fn free(ptr: *mut u8) {
    global().lock().free(ptr);
}

/// Resizes an allocation. On a failed grow the original pointer remains
/// valid and `None` is returned.
pub fn realloc(ptr: *mut u8, size: usize) -> Option<*mut u8> {
    global().lock().realloc(ptr, size)
}

/// Toggles debug mode: corruption sweeps on the hot paths plus diagnostic
/// log emission.
pub fn enable_debug(enable: bool) {
    global().lock().policy.debug_mode = enable;
}

/// Toggles allocation-site recording for tracked allocations.
pub fn enable_tracking(enable: bool) {
    global().lock().policy.track_allocations = enable;
}

/// Records the thread-safety preference. The state lock is unconditional;
/// the flag only shows up in the status report.
pub fn enable_thread_safety(enable: bool) {
    global().lock().policy.thread_safety = enable;
}

/// Log-emission toggle. Emission is tied to debug mode, so this is an alias
/// for [`enable_debug`].
pub fn enable_logging(enable: bool) {
    enable_debug(enable);
}

/// Installs a diagnostic sink.
pub fn set_log_sink(sink: LogSink) {
    global().lock().policy.log_sink = sink;
}

/// Configures zero-on-free. Invalid depths reset to no zeroing; a zero
/// `shallow_size` keeps the current shallow span.
pub fn set_zero_on_free(depth: i32, shallow_size: usize) {
    let mut state = global().lock();
    state.policy.zero_depth = ZeroDepth::from_raw(depth);
    if shallow_size > 0 {
        state.policy.shallow_zero_size = shallow_size;
    }
}

/// Sets the integrity check level (0-3). Out-of-range values leave the
/// level unchanged.
pub fn set_integrity_check_level(level: i32) {
    if let Some(level) = CheckLevel::from_raw(level) {
        global().lock().policy.check_level = level;
    }
}

/// Snapshot of the statistics counters.
#[must_use]
pub fn stats() -> StatsSnapshot {
    global().lock().stats()
}

/// Fragmentation estimate over the free list, in `[0, 1)`.
#[must_use]
pub fn fragmentation() -> f32 {
    global().lock().fragmentation()
}

/// Verifies every segment at the configured level, optionally repairing.
/// Returns the error count, or -1 when the heap is not initialized.
pub fn verify_integrity(repair: bool) -> i32 {
    global().lock().verify_integrity(repair)
}

/// Emits a status report through the configured sink.
pub fn print_status() {
    global().lock().print_status();
}

/// True when `ptr` lies inside the small-pool region.
#[must_use]
pub fn is_small_allocation(ptr: *mut u8) -> bool {
    global().lock().is_small_allocation(ptr)
}
