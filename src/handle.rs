//! Allocator handle
//!
//! A cheap, copyable reference to any allocation strategy. Containers store
//! a handle instead of a concrete allocator type, so the same container code
//! runs against every strategy in the crate. Copying a handle never copies
//! allocator state; both copies route to the same instance.

use core::alloc::Layout;
use core::ptr::NonNull;

use crate::allocator::Allocator;
use crate::error::AllocResult;

/// Copyable, type-erased reference to an allocator.
///
/// The lifetime ties every handle (and everything allocated through it) to
/// the allocator it points at, so a container holding a handle cannot
/// outlive its allocator.
#[derive(Clone, Copy)]
pub struct AllocHandle<'a> {
    inner: &'a dyn Allocator,
}

impl<'a> AllocHandle<'a> {
    /// Wraps an allocator in a handle
    #[inline]
    pub fn new(allocator: &'a dyn Allocator) -> Self {
        Self { inner: allocator }
    }

    /// Allocates through the underlying allocator
    ///
    /// # Safety
    /// Same contract as [`Allocator::allocate`].
    ///
    /// # Errors
    /// Propagates the underlying allocator's failure unchanged.
    #[inline]
    pub unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<[u8]>> {
        // SAFETY: forwarded from our caller, same contract.
        unsafe { self.inner.allocate(layout) }
    }

    /// Deallocates through the underlying allocator
    ///
    /// # Safety
    /// Same contract as [`Allocator::deallocate`].
    #[inline]
    pub unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded from our caller, same contract.
        unsafe { self.inner.deallocate(ptr, layout) }
    }
}

// SAFETY: Pure delegation; the underlying allocator upholds the contract.
unsafe impl Allocator for AllocHandle<'_> {
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<[u8]>> {
        // SAFETY: forwarded from our caller, same contract.
        unsafe { self.inner.allocate(layout) }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded from our caller, same contract.
        unsafe { self.inner.deallocate(ptr, layout) }
    }
}

/// Two handles are equal when they refer to the same allocator instance.
impl PartialEq for AllocHandle<'_> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::addr_eq(self.inner as *const dyn Allocator, other.inner)
    }
}

impl Eq for AllocHandle<'_> {}

impl core::fmt::Debug for AllocHandle<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AllocHandle")
            .field("allocator", &(self.inner as *const dyn Allocator))
            .finish()
    }
}
