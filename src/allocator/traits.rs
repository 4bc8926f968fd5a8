//! Allocator traits
//!
//! The uniform allocator interface every strategy in this crate implements,
//! plus the capability traits the containers and benchmarks observe through.
//!
//! # Safety
//!
//! All unsafe traits in this module impose strict contracts on implementors:
//! - **Allocator**: returned pointers must be valid, aligned, and refer to
//!   regions disjoint from every other live allocation
//! - Deallocation only with a pointer previously returned by the same
//!   instance and the original layout; double-free is undefined behavior
//!
//! Blanket impls for `&T` forward all calls to the underlying `T`, so the
//! contracts are preserved through delegation.

use core::alloc::Layout;
use core::ptr::NonNull;

use crate::error::AllocResult;

/// Uniform allocation interface
///
/// The layout carries the requested size together with its alignment; the
/// allocator may return more than `layout.size()` bytes but never fewer.
///
/// # Safety Requirements
///
/// Implementors must ensure that:
/// - Returned pointers are valid for reads and writes of `layout.size()` bytes
/// - Memory is properly aligned according to the layout
/// - Returned regions never overlap while both are live
/// - Deallocation only occurs for previously allocated pointers with a
///   matching layout
pub unsafe trait Allocator {
    /// Allocates memory with the given layout
    ///
    /// # Safety
    /// - Returned memory is uninitialized and must be initialized before use
    /// - The pointer must not be used after the allocator is reset or dropped
    ///
    /// # Errors
    /// Returns an error if memory cannot be allocated; failures propagate to
    /// the caller, which must fail its own operation rather than proceed
    /// with a partial allocation.
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<[u8]>>;

    /// Deallocates memory at the given pointer with the specified layout
    ///
    /// Arena-style allocators implement this as a no-op; pooled allocators
    /// return the block for reuse.
    ///
    /// # Safety
    /// - `ptr` must have been allocated by this allocator instance
    /// - `layout` must match the original allocation layout exactly
    /// - After this call, `ptr` becomes invalid and must not be used
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// Memory tracking capabilities
pub trait MemoryUsage {
    /// Bytes currently handed out (including internal padding/rounding)
    fn used_memory(&self) -> usize;

    /// Bytes still available, if the allocator is bounded
    fn available_memory(&self) -> Option<usize>;

    /// Total capacity, if the allocator is bounded
    fn total_memory(&self) -> Option<usize> {
        match self.available_memory() {
            Some(available) => Some(self.used_memory() + available),
            None => None,
        }
    }
}

/// Allocator reset capability
///
/// Resetting returns every byte to availability at once, without visiting
/// individual allocations.
pub trait Resettable {
    /// Resets the allocator to its initial state
    ///
    /// # Safety
    /// Caller must ensure no outstanding references to allocated memory
    /// exist; every pointer previously returned becomes invalid.
    unsafe fn reset(&self);
}

/// Type-safe allocation helpers layered over [`Allocator`]
///
/// `alloc_typed` returns raw, uninitialized storage; `alloc_init` is the
/// separate finalize step that writes a value into it. Skipping
/// finalization (or skipping `drop_in_place` before `dealloc_typed`) is
/// only safe when the object holds no externally-owned resources.
pub trait TypedAllocator: Allocator {
    /// Allocates uninitialized storage for a single `T`
    ///
    /// # Safety
    /// The caller must initialize the memory before reading from it, and
    /// must release it with [`TypedAllocator::dealloc_typed`].
    #[inline]
    unsafe fn alloc_typed<T>(&self) -> AllocResult<NonNull<T>> {
        let layout = Layout::new::<T>();
        // SAFETY: layout is derived from T at compile time; allocate
        // returns a valid pointer or an error.
        let ptr = unsafe { self.allocate(layout)? };
        Ok(ptr.cast::<T>())
    }

    /// Allocates storage for a `T` and moves `value` into it
    ///
    /// # Safety
    /// The caller must release the memory with
    /// [`TypedAllocator::dealloc_typed`], running the destructor first if
    /// `T` owns resources.
    #[inline]
    unsafe fn alloc_init<T>(&self, value: T) -> AllocResult<NonNull<T>> {
        // SAFETY: alloc_typed returns valid, aligned, uninitialized storage.
        let ptr = unsafe { self.alloc_typed::<T>()? };
        // SAFETY: ptr is valid for writes and properly aligned for T; write
        // moves value into the allocation without reading the old bytes.
        unsafe {
            ptr.as_ptr().write(value);
        }
        Ok(ptr)
    }

    /// Deallocates storage for a single `T`
    ///
    /// # Safety
    /// - `ptr` must come from `alloc_typed::<T>()` or `alloc_init::<T>()`
    ///   on this allocator
    /// - `ptr` must not be used after this call
    /// - If `T` has a destructor, the caller must run it first
    #[inline]
    unsafe fn dealloc_typed<T>(&self, ptr: NonNull<T>) {
        let layout = Layout::new::<T>();
        // SAFETY: layout matches the original allocation (derived from T);
        // cast() converts NonNull<T> to NonNull<u8> safely.
        unsafe { self.deallocate(ptr.cast(), layout) }
    }
}

/// Every allocator gets the typed helpers for free.
impl<A: Allocator + ?Sized> TypedAllocator for A {}

// ============================================================================
// Blanket implementations for references
// ============================================================================

// SAFETY: Forwards all calls to the underlying T: Allocator; no new unsafe
// operations are introduced and the contracts are preserved by delegation.
unsafe impl<T: Allocator + ?Sized> Allocator for &T {
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<[u8]>> {
        // SAFETY: same contract as T::allocate.
        unsafe { (**self).allocate(layout) }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: same contract as T::deallocate.
        unsafe { (**self).deallocate(ptr, layout) }
    }
}

impl<T: MemoryUsage + ?Sized> MemoryUsage for &T {
    fn used_memory(&self) -> usize {
        (**self).used_memory()
    }

    fn available_memory(&self) -> Option<usize> {
        (**self).available_memory()
    }

    fn total_memory(&self) -> Option<usize> {
        (**self).total_memory()
    }
}

impl<T: Resettable + ?Sized> Resettable for &T {
    unsafe fn reset(&self) {
        // SAFETY: same contract as T::reset.
        unsafe { (**self).reset() }
    }
}
