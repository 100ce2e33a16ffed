//! Zero-on-free behaviour at all four depths, on both pools.
//!
//! The trick every test relies on: freeing the most recent grant and
//! re-allocating the same size lands on the same address (tail cut of the
//! same free segment, or first-fit over the same slot run), so the reused
//! region exposes exactly what the previous free left behind.

static TEST_LOCK: parking_lot::Mutex<()> = parking_lot::Mutex::new(());

fn fill(ptr: *mut u8, value: u8, len: usize) {
    // SAFETY: every grant is valid for the requested length.
    unsafe { ptr.write_bytes(value, len) };
}

fn byte_at(ptr: *const u8, index: usize) -> u8 {
    // SAFETY: as in `fill`.
    unsafe { *ptr.add(index) }
}

#[test]
fn depth_none_leaves_data_in_place() {
    let _guard = TEST_LOCK.lock();
    hardheap_core::set_zero_on_free(0, 0);

    let p = hardheap_core::malloc(4096).expect("allocation");
    fill(p, 0xFF, 4096);
    hardheap_core::free(p);

    let q = hardheap_core::malloc(4096).expect("reuse");
    assert_eq!(q, p, "the freed tail slot should be reused");
    assert_eq!(byte_at(q, 0), 0xFF);
    assert_eq!(byte_at(q, 4095), 0xFF);

    hardheap_core::free(q);
}

#[test]
fn depth_deep_wipes_entire_region() {
    let _guard = TEST_LOCK.lock();
    hardheap_core::set_zero_on_free(3, 0);

    let p = hardheap_core::malloc(4096).expect("allocation");
    fill(p, 0xFF, 4096);
    hardheap_core::free(p);

    let q = hardheap_core::malloc(4096).expect("reuse");
    assert_eq!(q, p);
    for i in 0..4096 {
        assert_eq!(byte_at(q, i), 0, "byte {i} must read zero after deep free");
    }

    hardheap_core::free(q);
    hardheap_core::set_zero_on_free(0, 0);
}

#[test]
fn depth_shallow_wipes_configured_prefix() {
    let _guard = TEST_LOCK.lock();
    hardheap_core::set_zero_on_free(1, 128);

    let p = hardheap_core::malloc(4096).expect("allocation");
    fill(p, 0xEE, 4096);
    hardheap_core::free(p);

    let q = hardheap_core::malloc(4096).expect("reuse");
    assert_eq!(q, p);
    for i in 0..128 {
        assert_eq!(byte_at(q, i), 0, "prefix byte {i}");
    }
    assert_eq!(byte_at(q, 128), 0xEE, "bytes past the shallow span survive");
    assert_eq!(byte_at(q, 4095), 0xEE);

    hardheap_core::free(q);
    hardheap_core::set_zero_on_free(0, 0);
}

#[test]
fn depth_medium_wipes_half_of_small_run() {
    let _guard = TEST_LOCK.lock();
    hardheap_core::set_zero_on_free(2, 0);

    let p = hardheap_core::malloc(64).expect("small allocation");
    assert!(hardheap_core::is_small_allocation(p));
    fill(p, 0xDD, 64);
    hardheap_core::free(p);

    let q = hardheap_core::malloc(64).expect("reuse");
    assert_eq!(q, p, "first fit lands on the same freed run");
    for i in 0..32 {
        assert_eq!(byte_at(q, i), 0, "first half byte {i}");
    }
    for i in 32..64 {
        assert_eq!(byte_at(q, i), 0xDD, "second half byte {i}");
    }

    hardheap_core::free(q);
    hardheap_core::set_zero_on_free(0, 0);
}

#[test]
fn depth_deep_wipes_small_runs_too() {
    let _guard = TEST_LOCK.lock();
    hardheap_core::set_zero_on_free(3, 0);

    let p = hardheap_core::malloc(200).expect("small allocation");
    assert!(hardheap_core::is_small_allocation(p));
    fill(p, 0xBB, 200);
    hardheap_core::free(p);

    let q = hardheap_core::malloc(200).expect("reuse");
    assert_eq!(q, p);
    // The whole run is zeroed, block-rounded past the request.
    for i in 0..200 {
        assert_eq!(byte_at(q, i), 0, "byte {i}");
    }

    hardheap_core::free(q);
    hardheap_core::set_zero_on_free(0, 0);
}

#[test]
fn invalid_depth_resets_to_none() {
    let _guard = TEST_LOCK.lock();
    hardheap_core::set_zero_on_free(7, 0);

    let p = hardheap_core::malloc(1024).expect("allocation");
    fill(p, 0x99, 1024);
    hardheap_core::free(p);

    let q = hardheap_core::malloc(1024).expect("reuse");
    assert_eq!(q, p);
    assert_eq!(byte_at(q, 0), 0x99, "an invalid depth must mean no zeroing");

    hardheap_core::free(q);
    hardheap_core::set_zero_on_free(0, 0);
}
