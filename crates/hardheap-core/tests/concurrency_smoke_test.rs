//! Threaded churn through the global API.
//!
//! The engine's ordering contract is single-threaded, but the global mutex
//! keeps concurrent callers memory-safe. This smoke test hammers the public
//! surface from several threads and then checks that the heap walks clean.

use std::thread;

#[derive(Clone, Copy)]
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }
}

fn worker(id: u64, rounds: usize) {
    let mut rng = XorShift64::new(0x9E37_79B9_7F4A_7C15 ^ (id + 1));
    let tag = 0x40 + id as u8;
    let mut live: Vec<(*mut u8, usize)> = Vec::new();

    for _ in 0..rounds {
        match rng.next_u64() % 3 {
            0 => {
                let size = 1 + (rng.next_u64() as usize % 8192);
                if let Some(p) = hardheap_core::malloc(size) {
                    // SAFETY: the grant is valid for `size` bytes.
                    unsafe { p.write_bytes(tag, size) };
                    live.push((p, size));
                }
            }
            1 => {
                if let Some((p, size)) = live.pop() {
                    // SAFETY: our own live grant.
                    unsafe {
                        assert_eq!(*p, tag);
                        assert_eq!(*p.add(size - 1), tag);
                    }
                    hardheap_core::free(p);
                }
            }
            _ => {
                if let Some((p, size)) = live.pop() {
                    let new_size = 1 + (rng.next_u64() as usize % 8192);
                    match hardheap_core::realloc(p, new_size) {
                        Some(q) => {
                            // SAFETY: the resized grant keeps the smaller of
                            // the two payloads.
                            unsafe {
                                assert_eq!(*q, tag);
                                q.write_bytes(tag, new_size);
                            }
                            live.push((q, new_size));
                        }
                        None => live.push((p, size)),
                    }
                }
            }
        }
    }

    for (p, _) in live {
        hardheap_core::free(p);
    }
}

#[test]
fn threaded_churn_stays_consistent() {
    hardheap_core::enable_thread_safety(true);
    let baseline = hardheap_core::stats().allocation_count;

    let handles: Vec<_> = (0..4)
        .map(|id| thread::spawn(move || worker(id, 2000)))
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    assert_eq!(hardheap_core::stats().allocation_count, baseline);
    assert_eq!(hardheap_core::verify_integrity(false), 0);
    assert_eq!(hardheap_core::fragmentation(), 0.0);

    hardheap_core::enable_thread_safety(false);
}
