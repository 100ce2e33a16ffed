//! # hardheap-core
//!
//! A self-contained dynamic memory allocator over fixed, statically owned
//! backing regions, for environments where the platform allocator is
//! unavailable or must be replaced: embedded targets, sandboxes, custom
//! runtimes, security-sensitive data handling.
//!
//! Two pools cooperate:
//! - **Block heap** (`heap`): coalescing best-fit allocator over a
//!   doubly-linked list of variable-sized segments, 4 KiB granularity,
//!   embedded in a 64 MiB region.
//! - **Small pool** (`small`): bitmap-managed 32-byte slots in a dedicated
//!   1 MiB region for requests up to 256 bytes.
//!
//! Around them sit the optional subsystems: per-segment guard-and-checksum
//! records with four verification levels (`integrity`), configurable
//! zero-on-free (`policy`), live statistics (`stats`), and an installable
//! diagnostic sink (`log`).
//!
//! The engine is single-threaded by design; the global instance in `api`
//! serialises callers with a mutex so misuse stays memory-safe.
//!
//! No `unsafe` outside the modules that do raw region arithmetic.

#![deny(unsafe_code)]

#[allow(unsafe_code)]
pub mod api;
#[allow(unsafe_code)]
pub mod heap;
#[allow(unsafe_code)]
mod integrity;
#[allow(unsafe_code)]
pub mod layout;
mod log;
pub mod policy;
#[allow(unsafe_code)]
pub mod region;
pub mod small;
pub mod stats;
#[allow(unsafe_code)]
pub mod util;

pub use api::{
    enable_debug, enable_logging, enable_thread_safety, enable_tracking, fragmentation, free,
    heap_init, is_small_allocation, malloc, malloc_tracked, malloc_tracked_raw, print_status,
    realloc, set_integrity_check_level, set_log_sink, set_zero_on_free, stats, verify_integrity,
};
pub use heap::Allocator;
pub use integrity::fnv1a;
pub use layout::{
    ALIGNMENT, BLOCK_SIZE, FOOTER_GUARD_VALUE, HEAP_SIZE, HEADER_GUARD_VALUE,
    SEGMENT_HEADER_SIZE, SEGMENT_MAGIC, SMALL_ALLOCATION_THRESHOLD, SMALL_BLOCK_SIZE,
    SMALL_POOL_SIZE, USER_DATA_OFFSET,
};
pub use log::{LogSink, null_sink, stderr_sink};
pub use policy::{CheckLevel, ZeroDepth};
pub use stats::StatsSnapshot;
