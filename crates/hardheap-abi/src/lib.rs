//! # hardheap-abi
//!
//! C ABI surface over `hardheap-core`: the allocation entry points and the
//! debug/policy toggles, exported under the names the C header declares
//! (`HeapInit`, `_malloc`, `_free`, `_realloc`, `_malloc_debug`, and the
//! `Heap*` configuration calls).
//!
//! Every function here is a thin translation layer: raw C arguments in,
//! engine call, raw C results out. No allocator logic lives in this crate.

pub mod heap_abi;
