//! Allocator-aware dynamic array
//!
//! A growable, contiguous array that takes every byte from an
//! [`AllocHandle`] instead of the global heap. Growth reallocates at
//! doubling capacity and copies the elements across; against an arena
//! allocator the abandoned buffer stays consumed until reset, which is
//! exactly the overhead the benchmarks measure.
//!
//! All fallible operations return `Result` and leave the container
//! unchanged on failure, so an exhausted arena degrades into an error, not
//! a crash.

use core::alloc::Layout;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};
use core::ptr::NonNull;

use crate::error::{AllocResult, MemoryError};
use crate::handle::AllocHandle;

/// First capacity a growing vector jumps to.
const MIN_NON_ZERO_CAP: usize = 4;

/// Dynamic array whose storage lives in a pooled allocator.
///
/// The lifetime `'a` ties the vector to its allocator; the compiler rejects
/// any use after the allocator is gone.
pub struct PoolVec<'a, T> {
    ptr: NonNull<T>,
    len: usize,
    cap: usize,
    handle: AllocHandle<'a>,
    _marker: PhantomData<T>,
}

impl<'a, T> PoolVec<'a, T> {
    /// Creates an empty vector; no allocation happens until the first push.
    pub fn new(handle: AllocHandle<'a>) -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            cap: if size_of::<T>() == 0 { usize::MAX } else { 0 },
            handle,
            _marker: PhantomData,
        }
    }

    /// Creates an empty vector with room for `capacity` elements.
    ///
    /// # Errors
    /// Propagates allocation failure from the underlying allocator.
    pub fn try_with_capacity(handle: AllocHandle<'a>, capacity: usize) -> AllocResult<Self> {
        let mut vec = Self::new(handle);
        vec.try_reserve(capacity)?;
        Ok(vec)
    }

    /// The handle this vector allocates through
    #[inline]
    pub fn allocator(&self) -> AllocHandle<'a> {
        self.handle
    }

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the vector holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Elements the vector can hold without reallocating
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Appends an element.
    ///
    /// # Errors
    /// Fails when growth is needed and the allocator cannot satisfy it; the
    /// vector is left unchanged and `value` is dropped with the error.
    pub fn try_push(&mut self, value: T) -> AllocResult<()> {
        if self.len == self.cap {
            self.grow(1)?;
        }

        // SAFETY: len < cap after the growth check, so the slot is inside
        // the allocation and unoccupied.
        unsafe {
            self.ptr.as_ptr().add(self.len).write(value);
        }
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the last element
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the slot at the old len - 1 holds an initialized element
        // that the vector no longer tracks after the decrement.
        Some(unsafe { self.ptr.as_ptr().add(self.len).read() })
    }

    /// Ensures room for at least `additional` more elements.
    ///
    /// # Errors
    /// Returns [`MemoryError::SizeOverflow`] when the required capacity
    /// overflows, otherwise propagates allocation failure.
    pub fn try_reserve(&mut self, additional: usize) -> AllocResult<()> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or(MemoryError::size_overflow("vector capacity"))?;
        if required <= self.cap {
            return Ok(());
        }
        self.grow(required - self.cap)
    }

    /// Drops all elements, keeping the allocation
    pub fn clear(&mut self) {
        let len = self.len;
        // Set first so a panicking Drop cannot double-drop.
        self.len = 0;
        // SAFETY: the first len slots hold initialized elements.
        unsafe {
            core::ptr::drop_in_place(core::ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), len));
        }
    }

    /// Appends every element of `other`, cloning.
    ///
    /// # Errors
    /// Propagates allocation failure; elements pushed before the failure
    /// remain in the vector.
    pub fn try_extend_from_slice(&mut self, other: &[T]) -> AllocResult<()>
    where
        T: Clone,
    {
        self.try_reserve(other.len())?;
        for item in other {
            self.try_push(item.clone())?;
        }
        Ok(())
    }

    /// Clones the vector into fresh storage from the same allocator.
    ///
    /// This is the copy half of the copy-versus-move dichotomy: it costs
    /// one allocation plus an element-wise clone, where moving the vector
    /// costs nothing.
    ///
    /// # Errors
    /// Propagates allocation failure from the underlying allocator.
    pub fn try_clone(&self) -> AllocResult<Self>
    where
        T: Clone,
    {
        let mut clone = Self::try_with_capacity(self.handle, self.len)?;
        clone.try_extend_from_slice(self)?;
        Ok(clone)
    }

    fn grow(&mut self, additional: usize) -> AllocResult<()> {
        debug_assert!(additional > 0);
        if size_of::<T>() == 0 {
            return Ok(());
        }

        let required = self
            .cap
            .checked_add(additional)
            .ok_or(MemoryError::size_overflow("vector capacity"))?;
        let new_cap = self
            .cap
            .saturating_mul(2)
            .max(required)
            .max(MIN_NON_ZERO_CAP);

        let new_layout = Layout::array::<T>(new_cap)
            .map_err(|_| MemoryError::size_overflow("vector byte size"))?;

        // SAFETY: new_layout has non-zero size (T is not a ZST, new_cap > 0).
        let new_ptr = unsafe { self.handle.allocate(new_layout)? }.cast::<T>();

        if self.cap > 0 {
            // SAFETY: both buffers are valid for len elements and disjoint
            // (the allocator never overlaps live allocations).
            unsafe {
                core::ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), self.len);
            }
            let old_layout = Layout::array::<T>(self.cap)
                .map_err(|_| MemoryError::size_overflow("vector byte size"))?;
            // SAFETY: ptr came from allocate() on this handle with
            // old_layout.
            unsafe {
                self.handle.deallocate(self.ptr.cast(), old_layout);
            }
        }

        self.ptr = new_ptr;
        self.cap = new_cap;
        Ok(())
    }
}

impl<T> Deref for PoolVec<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        // SAFETY: the first len slots hold initialized elements.
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T> DerefMut for PoolVec<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: the first len slots hold initialized elements, and &mut
        // self guarantees exclusive access.
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T> Drop for PoolVec<'_, T> {
    fn drop(&mut self) {
        self.clear();
        if self.cap > 0 && size_of::<T>() > 0 {
            if let Ok(layout) = Layout::array::<T>(self.cap) {
                // SAFETY: ptr came from allocate() on this handle with this
                // layout; all elements were dropped by clear().
                unsafe {
                    self.handle.deallocate(self.ptr.cast(), layout);
                }
            }
        }
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for PoolVec<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'b, T> IntoIterator for &'b PoolVec<'_, T> {
    type Item = &'b T;
    type IntoIter = core::slice::Iter<'b, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
