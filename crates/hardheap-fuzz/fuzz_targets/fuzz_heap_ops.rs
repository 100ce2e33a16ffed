#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Interpret the input as a sequence of allocator operations:
    // [op, size_lo, size_hi, index] per 4-byte chunk.
    if data.len() < 4 {
        return;
    }

    let mut grants: Vec<(*mut u8, usize)> = Vec::new();

    for chunk in data.chunks(4) {
        if chunk.len() < 4 {
            break;
        }
        let op = chunk[0] % 5;
        let size = u16::from_le_bytes([chunk[1], chunk[2]]) as usize;
        let index = chunk[3] as usize;

        match op {
            0 => {
                if let Some(p) = hardheap_core::malloc(size.clamp(1, 65536)) {
                    // Touch the grant so bad pointers crash here, not later.
                    unsafe { p.write_bytes(0x5A, size.clamp(1, 65536)) };
                    grants.push((p, size.clamp(1, 65536)));
                }
            }
            1 => {
                if let Some((p, _)) = grants.pop() {
                    hardheap_core::free(p);
                }
            }
            2 => {
                if !grants.is_empty() {
                    let slot = index % grants.len();
                    let (p, _) = grants[slot];
                    let new_size = size.clamp(1, 65536);
                    if let Some(q) = hardheap_core::realloc(p, new_size) {
                        grants[slot] = (q, new_size);
                    }
                }
            }
            3 => {
                let _ = hardheap_core::verify_integrity(true);
            }
            _ => {
                hardheap_core::set_zero_on_free((chunk[1] % 4) as i32, 64);
            }
        }
    }

    for (p, _) in grants {
        hardheap_core::free(p);
    }
});
