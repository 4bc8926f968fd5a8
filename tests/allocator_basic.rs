//! Integration tests for the bump allocation strategies

use core::alloc::Layout;

use poolkit::allocator::{
    AlignedBumpAllocator, AllocConfig, Allocator, BumpAllocator, MemoryUsage, Resettable,
};
use poolkit::error::MemoryError;
use poolkit::store::BackingStore;

fn bytes(size: usize) -> Layout {
    Layout::from_size_align(size, 1).unwrap()
}

#[test]
fn bump_hands_out_sequential_disjoint_blocks() {
    let store = BackingStore::new(64).unwrap();
    let arena = BumpAllocator::new(&store);
    let base = store.start_addr();

    unsafe {
        let a = arena.allocate(bytes(10)).unwrap().cast::<u8>();
        let b = arena.allocate(bytes(10)).unwrap().cast::<u8>();
        let c = arena.allocate(bytes(10)).unwrap().cast::<u8>();

        assert_eq!(a.as_ptr() as usize, base);
        assert_eq!(b.as_ptr() as usize, base + 10);
        assert_eq!(c.as_ptr() as usize, base + 20);

        // Write through all three; nothing may alias.
        core::ptr::write_bytes(a.as_ptr(), 0x11, 10);
        core::ptr::write_bytes(b.as_ptr(), 0x22, 10);
        core::ptr::write_bytes(c.as_ptr(), 0x33, 10);
        assert_eq!(*a.as_ptr(), 0x11);
        assert_eq!(*b.as_ptr(), 0x22);
        assert_eq!(*c.as_ptr(), 0x33);
    }

    assert_eq!(arena.used(), 30);
    assert_eq!(arena.available(), 34);
}

#[test]
fn bump_fails_cleanly_when_exhausted() {
    let store = BackingStore::new(64).unwrap();
    let arena = BumpAllocator::new(&store);

    unsafe {
        for _ in 0..3 {
            arena.allocate(bytes(10)).unwrap();
        }
        // 30 used; a 40-byte request would need 70 total.
        let err = arena.allocate(bytes(40)).unwrap_err();
        assert_eq!(
            err,
            MemoryError::ArenaExhausted {
                requested: 40,
                available: 34,
            }
        );

        // The failed request consumed nothing.
        assert_eq!(arena.used(), 30);
        arena.allocate(bytes(34)).unwrap();
        assert_eq!(arena.available(), 0);
    }
}

#[test]
fn bump_deallocate_is_noop_reset_reclaims_everything() {
    let store = BackingStore::new(128).unwrap();
    let arena = BumpAllocator::new(&store);

    unsafe {
        let layout = Layout::from_size_align(16, 8).unwrap();
        let ptr = arena.allocate(layout).unwrap();
        arena.deallocate(ptr.cast(), layout);
        assert_eq!(arena.used(), 16);

        arena.reset();
        assert_eq!(arena.used(), 0);
        assert_eq!(arena.available(), 128);
    }
}

#[test]
fn bump_tracks_peak_and_counters() {
    let store = BackingStore::new(256).unwrap();
    let arena = BumpAllocator::with_config(&store, AllocConfig::debug());

    unsafe {
        arena.allocate(bytes(100)).unwrap();
        arena.allocate(bytes(100)).unwrap();
        assert_eq!(arena.peak_usage(), 200);
        assert_eq!(arena.allocation_count(), 2);

        let _ = arena.allocate(bytes(100)).unwrap_err();
        assert_eq!(arena.failed_allocation_count(), 1);

        arena.reset();
    }
    assert_eq!(arena.peak_usage(), 0);
    assert_eq!(arena.allocation_count(), 0);
}

#[test]
fn bump_usage_through_trait() {
    let store = BackingStore::new(64).unwrap();
    let arena = BumpAllocator::new(&store);

    unsafe {
        arena.allocate(bytes(24)).unwrap();
    }
    assert_eq!(arena.used_memory(), 24);
    assert_eq!(arena.available_memory(), Some(40));
    assert_eq!(arena.total_memory(), Some(64));
}

#[test]
fn aligned_bump_places_every_block_on_the_boundary() {
    let store = BackingStore::new(256).unwrap();
    let arena = AlignedBumpAllocator::new(&store, 64).unwrap();
    let base = store.start_addr();

    unsafe {
        let a = arena.allocate(bytes(10)).unwrap().cast::<u8>();
        let b = arena.allocate(bytes(10)).unwrap().cast::<u8>();
        let c = arena.allocate(bytes(10)).unwrap().cast::<u8>();

        assert_eq!(a.as_ptr() as usize, base);
        assert_eq!(b.as_ptr() as usize, base + 64);
        assert_eq!(c.as_ptr() as usize, base + 128);
    }

    // Two gaps of 54 bytes each.
    assert_eq!(arena.wasted_padding(), 108);
    assert_eq!(arena.used(), 138);
}

#[test]
fn aligned_bump_rejects_bad_alignment_up_front() {
    let store = BackingStore::new(64).unwrap();

    for bad in [0, 3, 12, 100] {
        let err = AlignedBumpAllocator::new(&store, bad).unwrap_err();
        assert_eq!(err, MemoryError::InvalidAlignment { alignment: bad });
    }

    // Power of two is accepted, including 1.
    assert!(AlignedBumpAllocator::new(&store, 1).is_ok());
    assert!(AlignedBumpAllocator::new(&store, 4096).is_ok());
}

#[test]
fn aligned_bump_honors_stricter_layout_alignment() {
    let store = BackingStore::new(1024).unwrap();
    let arena = AlignedBumpAllocator::new(&store, 16).unwrap();

    unsafe {
        let _ = arena.allocate(bytes(1)).unwrap();
        let strict = arena
            .allocate(Layout::from_size_align(32, 256).unwrap())
            .unwrap();
        assert_eq!(strict.cast::<u8>().as_ptr() as usize % 256, 0);
    }
}

#[test]
fn aligned_bump_reset_clears_padding_accounting() {
    let store = BackingStore::new(256).unwrap();
    let arena = AlignedBumpAllocator::new(&store, 64).unwrap();

    unsafe {
        arena.allocate(bytes(10)).unwrap();
        arena.allocate(bytes(10)).unwrap();
        assert!(arena.wasted_padding() > 0);

        arena.reset();
    }
    assert_eq!(arena.wasted_padding(), 0);
    assert_eq!(arena.used(), 0);
}
