//! Integration tests for the multipool allocator

use core::alloc::Layout;

use poolkit::allocator::{
    AllocConfig, Allocator, MemoryUsage, MultipoolAllocator, OversizePolicy, Resettable,
};
use poolkit::error::MemoryError;
use poolkit::store::BackingStore;

fn bytes(size: usize) -> Layout {
    Layout::from_size_align(size, 1).unwrap()
}

#[test]
fn requests_are_served_by_the_smallest_covering_class() {
    let store = BackingStore::new(4096).unwrap();
    let pool = MultipoolAllocator::new(&store, &[8, 32, 128]).unwrap();

    unsafe {
        pool.allocate(bytes(1)).unwrap();
        pool.allocate(bytes(8)).unwrap();
        pool.allocate(bytes(9)).unwrap();
        pool.allocate(bytes(32)).unwrap();
        pool.allocate(bytes(100)).unwrap();
    }

    let stats = pool.class_stats();
    assert_eq!(stats[0].carved_blocks, 2); // 1 and 8
    assert_eq!(stats[1].carved_blocks, 2); // 9 and 32
    assert_eq!(stats[2].carved_blocks, 1); // 100
}

#[test]
fn freed_blocks_are_reused_before_carving() {
    let store = BackingStore::new(4096).unwrap();
    let pool = MultipoolAllocator::new(&store, &[8, 32, 128]).unwrap();

    unsafe {
        let first = pool.allocate(bytes(20)).unwrap();
        let addr = first.cast::<u8>().as_ptr() as usize;
        pool.deallocate(first.cast(), bytes(20));

        // A request for a different size in the same class reuses the block.
        let second = pool.allocate(bytes(32)).unwrap();
        assert_eq!(second.cast::<u8>().as_ptr() as usize, addr);
        assert_eq!(pool.class_stats()[1].carved_blocks, 1);
    }
}

#[test]
fn small_request_round_trips_through_the_smallest_class() {
    let store = BackingStore::new(4096).unwrap();
    let pool = MultipoolAllocator::new(&store, &[8, 32, 128]).unwrap();

    unsafe {
        let ptr = pool.allocate(bytes(5)).unwrap();
        let addr = ptr.cast::<u8>().as_ptr() as usize;
        assert_eq!(pool.class_stats()[0].carved_blocks, 1);

        pool.deallocate(ptr.cast(), bytes(5));
        let again = pool.allocate(bytes(5)).unwrap();
        assert_eq!(again.cast::<u8>().as_ptr() as usize, addr);
    }
}

#[test]
fn oversize_requests_fail_under_reject() {
    let store = BackingStore::new(4096).unwrap();
    let pool = MultipoolAllocator::new(&store, &[8, 32, 128]).unwrap();
    assert_eq!(pool.oversize_policy(), OversizePolicy::Reject);

    unsafe {
        let err = pool.allocate(bytes(200)).unwrap_err();
        assert_eq!(
            err,
            MemoryError::ExceedsMaxSize {
                size: 200,
                max_size: 128,
            }
        );
    }
    // Nothing was consumed by the failed request.
    assert_eq!(pool.used_memory(), 0);
}

#[test]
fn oversize_requests_fall_through_under_fallback() {
    let store = BackingStore::new(4096).unwrap();
    let pool = MultipoolAllocator::with_config(
        &store,
        &[8, 32, 128],
        OversizePolicy::Fallback,
        AllocConfig::production(),
    )
    .unwrap();

    unsafe {
        let big = pool.allocate(bytes(200)).unwrap();
        assert!(pool.contains(big.cast::<u8>().as_ptr()));

        // Freeing an oversize block feeds no class list.
        pool.deallocate(big.cast(), bytes(200));
        let total_free: usize = pool.class_stats().iter().map(|c| c.free_blocks).sum();
        assert_eq!(total_free, 0);
    }
}

#[test]
fn exhaustion_propagates_from_the_internal_arena() {
    // Room for exactly two 128-byte blocks.
    let store = BackingStore::new(256).unwrap();
    let pool = MultipoolAllocator::with_config(
        &store,
        &[128],
        OversizePolicy::Reject,
        AllocConfig::production(),
    )
    .unwrap();

    unsafe {
        pool.allocate(bytes(128)).unwrap();
        pool.allocate(bytes(128)).unwrap();
        let err = pool.allocate(bytes(128)).unwrap_err();
        assert!(err.is_out_of_memory());
    }
}

#[test]
fn free_lists_survive_heavy_churn() {
    let store = BackingStore::new(8192).unwrap();
    let pool = MultipoolAllocator::new(&store, &[8, 32, 128]).unwrap();

    unsafe {
        for _ in 0..100 {
            let a = pool.allocate(bytes(8)).unwrap();
            let b = pool.allocate(bytes(32)).unwrap();
            let c = pool.allocate(bytes(128)).unwrap();
            pool.deallocate(c.cast(), bytes(128));
            pool.deallocate(b.cast(), bytes(32));
            pool.deallocate(a.cast(), bytes(8));
        }
    }

    // Steady state: one block per class, carved exactly once.
    for class in pool.class_stats() {
        assert_eq!(class.carved_blocks, 1);
        assert_eq!(class.free_blocks, 1);
    }
    assert_eq!(pool.used_memory(), 0);
}

#[test]
fn class_alignment_guarantee_is_capped() {
    let store = BackingStore::new(4096).unwrap();
    let pool = MultipoolAllocator::new(&store, &[8, 32, 128]).unwrap();

    unsafe {
        // Alignment within the class guarantee works.
        let ptr = pool
            .allocate(Layout::from_size_align(32, 16).unwrap())
            .unwrap();
        assert_eq!(ptr.cast::<u8>().as_ptr() as usize % 16, 0);

        // Beyond the cap, the request is rejected, not misaligned.
        let err = pool
            .allocate(Layout::from_size_align(32, 64).unwrap())
            .unwrap_err();
        assert!(matches!(err, MemoryError::InvalidLayout { .. }));
    }
}

#[test]
fn reset_returns_every_byte() {
    let store = BackingStore::new(4096).unwrap();
    let pool = MultipoolAllocator::new(&store, &[8, 32]).unwrap();

    unsafe {
        for _ in 0..10 {
            pool.allocate(bytes(8)).unwrap();
            pool.allocate(bytes(32)).unwrap();
        }
        pool.reset();
    }

    assert_eq!(pool.used_memory(), 0);
    assert_eq!(pool.available_memory(), Some(4096));
    for class in pool.class_stats() {
        assert_eq!(class.free_blocks, 0);
        assert_eq!(class.carved_blocks, 0);
    }
}
