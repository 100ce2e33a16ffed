//! ABI layer for the heap engine's public operations.
//!
//! The exported symbols match the original C header: `HeapInit`, `_malloc`,
//! `_free`, `_realloc`, `_malloc_debug`, and the `Heap*` debug and policy
//! surface. Out-parameters tolerate null; failures surface as null returns,
//! never as unwinding.

use std::ffi::{CStr, c_char, c_float, c_int, c_void};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Caller-installed printf-style sink, stored as a raw function address.
/// Zero means none installed.
static C_LOG_SINK: AtomicUsize = AtomicUsize::new(0);

/// Bridges the engine's `&str` diagnostics to the installed C sink.
fn c_sink_trampoline(message: &str) {
    let raw = C_LOG_SINK.load(Ordering::Relaxed);
    if raw == 0 {
        return;
    }
    let Ok(line) = std::ffi::CString::new(message) else {
        return;
    };
    // SAFETY: `raw` was stored from a function pointer of exactly this type
    // in `HeapSetLogFunction`; the format string consumes one `%s` argument.
    unsafe {
        let sink: unsafe extern "C" fn(*const c_char, ...) =
            std::mem::transmute::<usize, unsafe extern "C" fn(*const c_char, ...)>(raw);
        sink(c"%s\n".as_ptr(), line.as_ptr());
    }
}

/// Registers a caller-supplied region as the heap backing store.
///
/// Optional: the engine installs its built-in 64 MiB region on first use.
///
/// # Safety
///
/// `buf` must be valid for reads and writes for `size` bytes and reserved
/// for the allocator for the rest of the program's lifetime.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "C" fn HeapInit(buf: *mut c_void, size: usize) {
    // SAFETY: forwarded caller guarantee.
    unsafe { hardheap_core::heap_init(buf.cast(), size) };
}

/// Allocates `size` bytes, 16-byte aligned. Returns null for zero-size or
/// unsatisfiable requests.
///
/// # Safety
///
/// The returned pointer must be released through `_free`/`_realloc` of this
/// allocator, not the platform one.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _malloc(size: usize) -> *mut c_void {
    match hardheap_core::malloc(size) {
        Some(ptr) => ptr.cast(),
        None => std::ptr::null_mut(),
    }
}

/// Releases memory previously returned by `_malloc`/`_realloc`. Null is a
/// no-op; unrecognized pointers are ignored.
///
/// # Safety
///
/// `ptr` must be null or a pointer previously returned by this allocator
/// that has not been released since.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _free(ptr: *mut c_void) {
    hardheap_core::free(ptr.cast());
}

/// Resizes an allocation.
///
/// - Null `ptr` behaves as `_malloc(size)`.
/// - Zero `size` behaves as `_free(ptr)` and returns null.
/// - On a failed grow the original pointer stays valid and null is returned.
///
/// # Safety
///
/// `ptr` must be null or a live pointer from this allocator.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _realloc(ptr: *mut c_void, size: usize) -> *mut c_void {
    match hardheap_core::realloc(ptr.cast(), size) {
        Some(ptr) => ptr.cast(),
        None => std::ptr::null_mut(),
    }
}

/// As `_malloc`, recording the call site when tracking is enabled.
///
/// # Safety
///
/// `file` must be null or a NUL-terminated string that outlives the
/// allocation (`__FILE__` in practice). `ptr` release rules match `_malloc`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _malloc_debug(
    size: usize,
    file: *const c_char,
    line: c_int,
) -> *mut c_void {
    let (file_ptr, file_len) = if file.is_null() {
        (std::ptr::null(), 0)
    } else {
        // SAFETY: `file` is NUL-terminated per the caller.
        let bytes = unsafe { CStr::from_ptr(file) }.to_bytes();
        (bytes.as_ptr(), bytes.len())
    };
    // SAFETY: the string bytes outlive the allocation per the caller.
    let grant = unsafe {
        hardheap_core::malloc_tracked_raw(size, file_ptr, file_len, line.max(0) as u32)
    };
    match grant {
        Some(ptr) => ptr.cast(),
        None => std::ptr::null_mut(),
    }
}

/// Toggles debug mode (corruption sweeps plus diagnostic logging).
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn HeapEnableDebug(enable: c_int) {
    hardheap_core::enable_debug(enable != 0);
}

/// Toggles allocation-site recording for `_malloc_debug`.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn HeapEnableTracking(enable: c_int) {
    hardheap_core::enable_tracking(enable != 0);
}

/// Records the thread-safety preference. The engine's lock is always on;
/// the flag is advisory and reported by `HeapPrintStatus`.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn HeapEnableThreadSafety(enable: c_int) {
    hardheap_core::enable_thread_safety(enable != 0);
}

/// Log-emission toggle; equivalent to `HeapEnableDebug`.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn HeapEnableLogging(enable: c_int) {
    hardheap_core::enable_logging(enable != 0);
}

/// Snapshots the statistics counters. Null out-parameters are skipped.
///
/// # Safety
///
/// Each out-parameter must be null or valid for one `usize` write.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "C" fn HeapGetStats(
    allocated: *mut usize,
    freed: *mut usize,
    count: *mut usize,
    peak: *mut usize,
) {
    let snapshot = hardheap_core::stats();
    // SAFETY: each pointer is null or writable per the caller.
    unsafe {
        if !allocated.is_null() {
            *allocated = snapshot.total_allocated;
        }
        if !freed.is_null() {
            *freed = snapshot.total_freed;
        }
        if !count.is_null() {
            *count = snapshot.allocation_count;
        }
        if !peak.is_null() {
            *peak = snapshot.peak_allocation;
        }
    }
}

/// Fragmentation estimate over the free list, in `[0, 1)`.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn HeapGetFragmentation() -> c_float {
    hardheap_core::fragmentation()
}

/// Emits a status report through the configured sink.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn HeapPrintStatus() {
    hardheap_core::print_status();
}

/// Installs a printf-style log sink. Null restores the default (stderr).
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn HeapSetLogFunction(log_fn: Option<unsafe extern "C" fn(*const c_char, ...)>) {
    match log_fn {
        Some(f) => {
            C_LOG_SINK.store(f as usize, Ordering::Relaxed);
            hardheap_core::set_log_sink(c_sink_trampoline);
        }
        None => {
            C_LOG_SINK.store(0, Ordering::Relaxed);
            hardheap_core::set_log_sink(hardheap_core::stderr_sink);
        }
    }
}

/// Configures zero-on-free: depths 0-3, invalid depths reset to 0. A zero
/// `shallow_size` keeps the current shallow span.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn HeapSetZeroOnFree(depth: c_int, shallow_size: usize) {
    hardheap_core::set_zero_on_free(depth, shallow_size);
}

/// Sets the integrity check level (0-3). Out-of-range values are ignored.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn HeapSetIntegrityCheckLevel(level: c_int) {
    hardheap_core::set_integrity_check_level(level);
}

/// Verifies every segment at the configured level, repairing when `repair`
/// is nonzero. Returns the error count, or -1 before initialization.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn HeapVerifyIntegrity(repair: c_int) -> c_int {
    hardheap_core::verify_integrity(repair != 0)
}
