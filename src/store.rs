//! Fixed-capacity backing store underlying the allocators
//!
//! A [`BackingStore`] is nothing but bytes plus a size: it owns a
//! fixed-capacity buffer and hands out its base address. All allocation
//! logic lives in the allocators borrowing it.
//!
//! # Safety
//!
//! The buffer is held as `Box<UnsafeCell<[u8]>>` so allocators can write
//! through shared references without creating intermediate `&mut [u8]`
//! references that would alias outstanding allocations. The heap allocation
//! never moves for the lifetime of the store, so addresses derived from
//! [`BackingStore::base_ptr`] stay valid even if the store value itself is
//! moved.
//!
//! ## Invariants
//!
//! - The buffer is never resized or reallocated after construction
//! - A store underlies at most one allocator instance at a time (documented
//!   precondition, not enforced)

use core::cell::UnsafeCell;

use crate::error::{MemoryError, MemoryResult};
use crate::utils::padding_needed;

/// Alignment guaranteed for the first byte of every store.
///
/// Keeps block offsets predictable for any allocator alignment up to a
/// cache line; stricter requests are still honored by address arithmetic.
pub const STORE_ALIGN: usize = 64;

/// Fixed-capacity byte buffer that physically holds allocated objects.
pub struct BackingStore {
    memory: Box<UnsafeCell<[u8]>>,
    /// Offset of the first [`STORE_ALIGN`]-aligned byte in the buffer
    offset: usize,
    capacity: usize,
}

impl BackingStore {
    /// Creates a store with the given capacity in bytes, zero-filled.
    ///
    /// The first byte is aligned to [`STORE_ALIGN`].
    ///
    /// # Errors
    /// Returns [`MemoryError::InvalidConfig`] for a zero capacity and
    /// [`MemoryError::SizeOverflow`] when the padded size overflows.
    pub fn new(capacity: usize) -> MemoryResult<Self> {
        if capacity == 0 {
            return Err(MemoryError::invalid_config("backing store capacity is zero"));
        }

        // Slack so an aligned start always fits inside the buffer.
        let raw_len = capacity
            .checked_add(STORE_ALIGN - 1)
            .ok_or(MemoryError::size_overflow("backing store size"))?;

        let boxed_slice = vec![0u8; raw_len].into_boxed_slice();
        let len = boxed_slice.len();
        let ptr = Box::into_raw(boxed_slice).cast::<u8>();
        // SAFETY: Transmuting Box<[u8]> to Box<UnsafeCell<[u8]>>.
        // - UnsafeCell is repr(transparent), identical layout to inner type
        // - ptr is a valid Box<[u8]> pointer from Box::into_raw
        // - Length is preserved (len from original boxed_slice)
        // - Box ownership transferred correctly (from_raw after into_raw)
        let memory: Box<UnsafeCell<[u8]>> = unsafe {
            Box::from_raw(core::ptr::slice_from_raw_parts_mut(ptr, len) as *mut UnsafeCell<[u8]>)
        };

        // The heap allocation never moves, so the aligned offset is fixed.
        let offset = padding_needed(memory.get().cast::<u8>() as usize, STORE_ALIGN);

        Ok(Self {
            memory,
            offset,
            capacity,
        })
    }

    /// Total capacity in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Base pointer of the buffer
    ///
    /// Writing through this pointer is only sound for callers that own a
    /// disjoint region of the buffer, which is exactly what the allocators
    /// hand out.
    #[inline]
    pub fn base_ptr(&self) -> *mut u8 {
        // SAFETY: offset < STORE_ALIGN <= buffer length, so the result
        // stays inside the allocation.
        unsafe { self.memory.get().cast::<u8>().add(self.offset) }
    }

    /// Address of the first byte
    #[inline]
    pub fn start_addr(&self) -> usize {
        self.base_ptr() as usize
    }

    /// Address one past the last byte
    #[inline]
    pub fn end_addr(&self) -> usize {
        self.start_addr() + self.capacity
    }

    /// Checks whether an address falls inside the buffer
    #[inline]
    pub fn contains(&self, addr: usize) -> bool {
        addr >= self.start_addr() && addr < self.end_addr()
    }
}

impl core::fmt::Debug for BackingStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BackingStore")
            .field("capacity", &self.capacity)
            .field("start_addr", &self.start_addr())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_bounds() {
        let store = BackingStore::new(64).unwrap();
        assert_eq!(store.capacity(), 64);
        assert_eq!(store.end_addr() - store.start_addr(), 64);
        assert!(store.contains(store.start_addr()));
        assert!(store.contains(store.end_addr() - 1));
        assert!(!store.contains(store.end_addr()));
    }

    #[test]
    fn test_start_is_aligned() {
        let store = BackingStore::new(64).unwrap();
        assert_eq!(store.start_addr() % STORE_ALIGN, 0);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = BackingStore::new(0).unwrap_err();
        assert_eq!(err.code(), "MEM:CONFIG:INVALID");
    }

    #[test]
    fn test_base_address_stable_across_moves() {
        let store = BackingStore::new(128).unwrap();
        let addr = store.start_addr();
        let moved = store;
        assert_eq!(moved.start_addr(), addr);
    }
}
