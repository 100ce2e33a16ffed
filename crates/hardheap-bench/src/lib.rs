//! Benchmark crate for the hardheap engine. See `benches/`.
