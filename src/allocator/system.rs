//! Global-heap allocator
//!
//! Thin shim over `std::alloc` so the benchmarks can run the same container
//! workloads against the process heap and the pooled strategies through one
//! interface. Unbounded: [`MemoryUsage`] reports what this instance handed
//! out, not what the heap holds.

use core::alloc::Layout;
use core::cell::Cell;
use core::ptr::NonNull;

use crate::allocator::traits::{Allocator, MemoryUsage};
use crate::error::{AllocError, AllocResult};

/// Allocator backed by the process heap.
#[derive(Debug, Default)]
pub struct SystemAllocator {
    allocated: Cell<usize>,
}

impl SystemAllocator {
    /// Creates a system allocator
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes currently outstanding through this instance
    #[inline]
    pub fn allocated(&self) -> usize {
        self.allocated.get()
    }
}

// SAFETY: Delegates to the global allocator, which satisfies validity,
// alignment, and disjointness for every successful allocation.
unsafe impl Allocator for SystemAllocator {
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<[u8]>> {
        if layout.size() == 0 {
            let ptr = NonNull::<u8>::dangling();
            return Ok(NonNull::slice_from_raw_parts(ptr, 0));
        }

        // SAFETY: layout has a non-zero size (checked above).
        let raw = unsafe { std::alloc::alloc(layout) };
        let ptr = NonNull::new(raw)
            .ok_or(AllocError::allocation_failed(layout.size(), layout.align()))?;

        self.allocated.set(self.allocated.get() + layout.size());
        Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }

        // SAFETY: caller guarantees ptr came from allocate() on this
        // instance with the same layout, which forwarded to alloc().
        unsafe {
            std::alloc::dealloc(ptr.as_ptr(), layout);
        }
        self.allocated
            .set(self.allocated.get().saturating_sub(layout.size()));
    }
}

impl MemoryUsage for SystemAllocator {
    fn used_memory(&self) -> usize {
        self.allocated.get()
    }

    /// Unbounded
    fn available_memory(&self) -> Option<usize> {
        None
    }
}
