//! Overaligned bump allocator
//!
//! A [`BumpAllocator`] variant that enforces a configured minimum alignment
//! on every block it hands out. The cost of the stricter guarantee shows up
//! as padding between consecutive blocks, which the allocator counts so the
//! benchmarks can report space overhead next to the timing numbers.

use core::alloc::Layout;
use core::cell::Cell;
use core::ptr::NonNull;

use crate::allocator::bump::BumpAllocator;
use crate::allocator::config::AllocConfig;
use crate::allocator::traits::{Allocator, MemoryUsage, Resettable};
use crate::error::{AllocResult, MemoryError};
use crate::store::BackingStore;
use crate::utils::is_power_of_two;

/// Bump allocator whose blocks all start on a configured boundary.
///
/// Every allocation is aligned to `max(alignment, layout.align())`, so the
/// guarantee never weakens what the layout itself asks for.
pub struct AlignedBumpAllocator<'s> {
    inner: BumpAllocator<'s>,
    alignment: usize,
    wasted_padding: Cell<usize>,
}

impl<'s> AlignedBumpAllocator<'s> {
    /// Creates an overaligned bump allocator with a configuration.
    ///
    /// # Errors
    /// Returns [`MemoryError::InvalidAlignment`] unless `alignment` is a
    /// power of two.
    pub fn with_config(
        store: &'s BackingStore,
        alignment: usize,
        config: AllocConfig,
    ) -> AllocResult<Self> {
        if !is_power_of_two(alignment) {
            return Err(MemoryError::invalid_alignment(alignment));
        }

        Ok(Self {
            inner: BumpAllocator::with_config(store, config),
            alignment,
            wasted_padding: Cell::new(0),
        })
    }

    /// Creates an overaligned bump allocator with the default configuration.
    ///
    /// # Errors
    /// Returns [`MemoryError::InvalidAlignment`] unless `alignment` is a
    /// power of two.
    pub fn new(store: &'s BackingStore, alignment: usize) -> AllocResult<Self> {
        Self::with_config(store, alignment, AllocConfig::default())
    }

    /// The configured minimum alignment
    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Total capacity of the underlying store
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Bytes consumed so far, padding included
    #[inline]
    pub fn used(&self) -> usize {
        self.inner.used()
    }

    /// Bytes still available
    #[inline]
    pub fn available(&self) -> usize {
        self.inner.available()
    }

    /// Bytes lost to alignment padding since the last reset
    #[inline]
    pub fn wasted_padding(&self) -> usize {
        self.wasted_padding.get()
    }

    /// Checks whether a pointer was carved from this allocator's store
    #[inline]
    pub fn contains(&self, ptr: *const u8) -> bool {
        self.inner.contains(ptr)
    }
}

// SAFETY: Delegates to the inner bump allocator with a widened alignment;
// the inner allocator upholds validity, alignment, and disjointness.
unsafe impl Allocator for AlignedBumpAllocator<'_> {
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<[u8]>> {
        if layout.size() == 0 {
            let ptr = NonNull::<u8>::dangling();
            return Ok(NonNull::slice_from_raw_parts(ptr, 0));
        }

        let effective_align = self.alignment.max(layout.align());
        let used_before = self.inner.used();
        let ptr = self.inner.try_bump(layout.size(), effective_align)?;

        // Whatever the cursor moved beyond the block itself was padding.
        let padding = self.inner.used() - used_before - layout.size();
        self.wasted_padding.set(self.wasted_padding.get() + padding);

        Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
    }

    /// No-op, same arena semantics as [`BumpAllocator::deallocate`].
    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}
}

impl MemoryUsage for AlignedBumpAllocator<'_> {
    fn used_memory(&self) -> usize {
        self.inner.used()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.inner.available())
    }
}

impl Resettable for AlignedBumpAllocator<'_> {
    unsafe fn reset(&self) {
        // SAFETY: same contract as the inner allocator's reset; forwarded
        // directly from our caller.
        unsafe {
            self.inner.reset();
        }
        self.wasted_padding.set(0);
    }
}

impl core::fmt::Debug for AlignedBumpAllocator<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AlignedBumpAllocator")
            .field("alignment", &self.alignment)
            .field("capacity", &self.capacity())
            .field("used", &self.used())
            .field("wasted_padding", &self.wasted_padding())
            .finish()
    }
}
