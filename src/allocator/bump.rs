//! Monotonic (bump) allocator
//!
//! Hands out successive slices of a [`BackingStore`] by advancing a cursor.
//! Individual blocks are never reclaimed: `deallocate` is a no-op and the
//! memory only returns to availability when the allocator is reset or
//! dropped. This is the zero-bookkeeping arena baseline the benchmarks
//! compare everything else against.
//!
//! # Safety
//!
//! - Allocated regions never overlap (the cursor only moves forward)
//! - All returned pointers lie within `[start_addr, end_addr)`
//! - Single-threaded by design: the cursor is a plain `Cell`, and the type
//!   is `!Sync`; sharing an instance across threads does not compile
//!
//! ## Invariants
//!
//! - `start_addr <= cursor <= end_addr` at all times
//! - The cursor is non-decreasing between resets

use core::alloc::Layout;
use core::cell::Cell;
use core::ptr::NonNull;

use crate::allocator::config::AllocConfig;
use crate::allocator::traits::{Allocator, MemoryUsage, Resettable};
use crate::error::{AllocError, AllocResult};
use crate::store::BackingStore;
use crate::utils::align_up;

/// Arena allocator: O(1) allocation, no per-block bookkeeping, no reuse.
pub struct BumpAllocator<'s> {
    store: &'s BackingStore,
    start_addr: usize,
    end_addr: usize,
    cursor: Cell<usize>,
    peak_usage: Cell<usize>,
    allocations: Cell<usize>,
    failed_allocations: Cell<usize>,
    config: AllocConfig,
}

impl<'s> BumpAllocator<'s> {
    /// Creates a bump allocator over the given store with a configuration.
    ///
    /// The store must underlie only this allocator for the allocator's
    /// lifetime.
    pub fn with_config(store: &'s BackingStore, config: AllocConfig) -> Self {
        let start_addr = store.start_addr();
        Self {
            store,
            start_addr,
            end_addr: store.end_addr(),
            cursor: Cell::new(start_addr),
            peak_usage: Cell::new(0),
            allocations: Cell::new(0),
            failed_allocations: Cell::new(0),
            config,
        }
    }

    /// Creates a bump allocator with the default configuration.
    pub fn new(store: &'s BackingStore) -> Self {
        Self::with_config(store, AllocConfig::default())
    }

    /// Total capacity of the underlying store
    #[inline]
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Bytes consumed so far, alignment padding included
    #[inline]
    pub fn used(&self) -> usize {
        self.cursor.get() - self.start_addr
    }

    /// Bytes still available
    #[inline]
    pub fn available(&self) -> usize {
        self.end_addr - self.cursor.get()
    }

    /// High-water mark of `used()` since the last reset
    #[inline]
    pub fn peak_usage(&self) -> usize {
        self.peak_usage.get()
    }

    /// Number of successful allocations (only tracked with
    /// [`AllocConfig::track_stats`])
    #[inline]
    pub fn allocation_count(&self) -> usize {
        self.allocations.get()
    }

    /// Number of failed allocations (only tracked with
    /// [`AllocConfig::track_stats`])
    #[inline]
    pub fn failed_allocation_count(&self) -> usize {
        self.failed_allocations.get()
    }

    /// Checks whether a pointer was carved from this allocator's store
    #[inline]
    pub fn contains(&self, ptr: *const u8) -> bool {
        self.store.contains(ptr as usize)
    }

    /// Cursor walk shared by this allocator and the overaligned variant.
    pub(crate) fn try_bump(&self, size: usize, align: usize) -> AllocResult<NonNull<u8>> {
        let current = self.cursor.get();
        let aligned = align_up(current, align);
        let new_cursor = aligned
            .checked_add(size)
            .ok_or(AllocError::size_overflow("bump cursor advance"))?;

        if new_cursor > self.end_addr {
            if self.config.track_stats {
                self.failed_allocations
                    .set(self.failed_allocations.get() + 1);
            }
            return Err(AllocError::arena_exhausted(size, self.available()));
        }

        self.cursor.set(new_cursor);
        let usage = new_cursor - self.start_addr;
        if usage > self.peak_usage.get() {
            self.peak_usage.set(usage);
        }
        if self.config.track_stats {
            self.allocations.set(self.allocations.get() + 1);
        }

        let offset = aligned - self.start_addr;
        // SAFETY: Deriving the block pointer from the store base.
        // - offset < new_cursor - start_addr <= capacity (checked above)
        // - [aligned, new_cursor) was exclusively reserved by the cursor
        //   advance; no other live allocation overlaps it
        let ptr = unsafe { self.store.base_ptr().add(offset) };

        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: Writing the debug pattern to the freshly reserved,
            // uninitialized range [aligned, aligned + size).
            unsafe {
                core::ptr::write_bytes(ptr, pattern, size);
            }
        }

        // ptr is non-null: store base comes from a live Box plus an
        // in-bounds offset.
        NonNull::new(ptr).ok_or(AllocError::allocation_failed(size, align))
    }
}

// SAFETY: BumpAllocator implements Allocator via bump pointer allocation.
// - allocate() reserves exclusive, in-bounds, properly aligned ranges
// - deallocate() is intentionally a no-op (arena semantics)
unsafe impl Allocator for BumpAllocator<'_> {
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<[u8]>> {
        if layout.size() == 0 {
            let ptr = NonNull::<u8>::dangling();
            return Ok(NonNull::slice_from_raw_parts(ptr, 0));
        }

        let ptr = self.try_bump(layout.size(), layout.align())?;
        Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
    }

    /// Documented no-op: the arena never reclaims individual blocks; memory
    /// returns to availability only on [`Resettable::reset`] or drop.
    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}
}

impl MemoryUsage for BumpAllocator<'_> {
    fn used_memory(&self) -> usize {
        self.used()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.available())
    }
}

impl Resettable for BumpAllocator<'_> {
    /// # Safety
    ///
    /// Caller must ensure no outstanding references to allocated memory
    /// exist; every pointer previously returned becomes invalid.
    unsafe fn reset(&self) {
        if let Some(pattern) = self.config.dealloc_pattern {
            let used = self.used();
            if used > 0 {
                // SAFETY: [start_addr, cursor) was previously allocated and
                // the caller guarantees nothing references it anymore.
                unsafe {
                    core::ptr::write_bytes(self.store.base_ptr(), pattern, used);
                }
            }
        }

        self.cursor.set(self.start_addr);
        self.peak_usage.set(0);
        self.allocations.set(0);
        self.failed_allocations.set(0);
    }
}

impl core::fmt::Debug for BumpAllocator<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BumpAllocator")
            .field("capacity", &self.capacity())
            .field("used", &self.used())
            .field("peak_usage", &self.peak_usage())
            .finish()
    }
}
