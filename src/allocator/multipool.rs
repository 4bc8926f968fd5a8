//! Multipool allocator with segregated free lists
//!
//! Maintains one pool per configured block size. Each pool is an intrusive
//! singly-linked free list threaded through the freed blocks themselves, so
//! the lists cost no memory beyond the blocks. A request is served by the
//! smallest class whose block size covers it; deallocated blocks go back on
//! their class list and are reused in LIFO order.
//!
//! Fresh blocks are carved from an internal [`BumpAllocator`] over the same
//! backing store, which means carving is as cheap as a cursor bump and the
//! whole structure resets in O(number of classes).
//!
//! # Safety
//!
//! - Free-list nodes are written only into blocks the arena handed out, so
//!   every node pointer is valid and properly aligned for a pointer write
//! - A block is on at most one free list at a time (LIFO push/pop)
//! - Single-threaded: all mutable state is in `Cell`s, the type is `!Sync`

use core::alloc::Layout;
use core::cell::Cell;
use core::ptr::NonNull;

use crate::allocator::bump::BumpAllocator;
use crate::allocator::config::AllocConfig;
use crate::allocator::traits::{Allocator, MemoryUsage, Resettable};
use crate::error::{AllocError, AllocResult, MemoryError};
use crate::store::BackingStore;
use crate::utils::{align_up, next_power_of_two};

/// Largest alignment a size class ever guarantees.
///
/// Requests with a stricter layout alignment are rejected rather than
/// silently misaligned.
pub const MAX_CLASS_ALIGN: usize = 16;

/// What to do with a request larger than the largest size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OversizePolicy {
    /// Fail the allocation with an error (the benchmarks want every byte
    /// accounted to a class)
    #[default]
    Reject,
    /// Serve the request straight from the internal arena; such blocks are
    /// never reclaimed before reset
    Fallback,
}

/// Free-list node stored inside a freed block.
#[repr(C)]
struct FreeBlock {
    next: *mut FreeBlock,
}

/// One segregated pool: a block size plus its intrusive free list.
struct SizeClass {
    /// Largest request this class serves
    block_size: usize,
    /// Alignment every block of this class starts on
    block_align: usize,
    /// Bytes actually consumed per block (covers the free-list node)
    stride: usize,
    free_head: Cell<*mut FreeBlock>,
    free_count: Cell<usize>,
    carved: Cell<usize>,
}

impl SizeClass {
    fn new(block_size: usize) -> Self {
        let block_align = next_power_of_two(block_size)
            .min(MAX_CLASS_ALIGN)
            .max(align_of::<FreeBlock>());
        let stride = align_up(block_size.max(size_of::<FreeBlock>()), block_align);
        Self {
            block_size,
            block_align,
            stride,
            free_head: Cell::new(core::ptr::null_mut()),
            free_count: Cell::new(0),
            carved: Cell::new(0),
        }
    }
}

/// Per-class counters exposed for benchmark reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassStats {
    /// Largest request the class serves
    pub block_size: usize,
    /// Alignment of every block in the class
    pub block_align: usize,
    /// Blocks currently sitting on the free list
    pub free_blocks: usize,
    /// Blocks ever carved from the arena for this class
    pub carved_blocks: usize,
}

/// Segregated free-list allocator over a fixed set of block sizes.
pub struct MultipoolAllocator<'s> {
    classes: Box<[SizeClass]>,
    arena: BumpAllocator<'s>,
    policy: OversizePolicy,
    config: AllocConfig,
    /// Bytes served past the largest class under [`OversizePolicy::Fallback`];
    /// they stay counted as used until reset because the arena never
    /// reclaims them
    oversize_bytes: Cell<usize>,
}

impl<'s> MultipoolAllocator<'s> {
    /// Creates a multipool allocator with explicit policy and configuration.
    ///
    /// Class sizes are sorted ascending and deduplicated; their order in
    /// `class_sizes` does not matter.
    ///
    /// # Errors
    /// Returns [`MemoryError::InvalidConfig`] when `class_sizes` is empty or
    /// contains a zero.
    pub fn with_config(
        store: &'s BackingStore,
        class_sizes: &[usize],
        policy: OversizePolicy,
        config: AllocConfig,
    ) -> AllocResult<Self> {
        if class_sizes.is_empty() {
            return Err(MemoryError::invalid_config("no size classes configured"));
        }
        if class_sizes.contains(&0) {
            return Err(MemoryError::invalid_config("zero-sized class"));
        }

        let mut sizes = class_sizes.to_vec();
        sizes.sort_unstable();
        sizes.dedup();

        let classes = sizes
            .into_iter()
            .map(SizeClass::new)
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self {
            classes,
            arena: BumpAllocator::with_config(store, config.clone()),
            policy,
            config,
            oversize_bytes: Cell::new(0),
        })
    }

    /// Creates a multipool allocator with the default configuration and the
    /// [`OversizePolicy::Reject`] policy.
    pub fn new(store: &'s BackingStore, class_sizes: &[usize]) -> AllocResult<Self> {
        Self::with_config(
            store,
            class_sizes,
            OversizePolicy::default(),
            AllocConfig::default(),
        )
    }

    /// Number of configured size classes
    #[inline]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Largest request any class serves
    #[inline]
    pub fn max_block_size(&self) -> usize {
        // Classes are sorted and non-empty by construction.
        self.classes[self.classes.len() - 1].block_size
    }

    /// The configured oversize policy
    #[inline]
    pub fn oversize_policy(&self) -> OversizePolicy {
        self.policy
    }

    /// Per-class counters, ascending by block size
    pub fn class_stats(&self) -> Vec<ClassStats> {
        self.classes
            .iter()
            .map(|class| ClassStats {
                block_size: class.block_size,
                block_align: class.block_align,
                free_blocks: class.free_count.get(),
                carved_blocks: class.carved.get(),
            })
            .collect()
    }

    /// Blocks currently free in the class serving `size`, if any class does
    pub fn free_blocks(&self, size: usize) -> Option<usize> {
        self.class_for(size).map(|class| class.free_count.get())
    }

    /// Checks whether a pointer was carved from this allocator's store
    #[inline]
    pub fn contains(&self, ptr: *const u8) -> bool {
        self.arena.contains(ptr)
    }

    /// Smallest class whose block size covers `size`.
    fn class_for(&self, size: usize) -> Option<&SizeClass> {
        self.classes.iter().find(|class| class.block_size >= size)
    }

    fn pop_free(&self, class: &SizeClass) -> Option<NonNull<u8>> {
        let head = class.free_head.get();
        let node = NonNull::new(head)?;
        // SAFETY: head was pushed by deallocate, which wrote a valid
        // FreeBlock into a block this allocator owns; nobody else touched
        // it while it sat on the list.
        let next = unsafe { (*node.as_ptr()).next };
        class.free_head.set(next);
        class.free_count.set(class.free_count.get() - 1);
        Some(node.cast::<u8>())
    }

    fn push_free(&self, class: &SizeClass, ptr: NonNull<u8>) {
        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: ptr addresses a full block of class.stride bytes that
            // the caller has relinquished; the pattern write precedes the
            // node write so the node survives.
            unsafe {
                core::ptr::write_bytes(ptr.as_ptr(), pattern, class.stride);
            }
        }

        let node = ptr.cast::<FreeBlock>();
        // SAFETY: the block is at least size_of::<FreeBlock>() bytes and
        // aligned to at least align_of::<FreeBlock>() (enforced by stride
        // and block_align at construction).
        unsafe {
            (*node.as_ptr()).next = class.free_head.get();
        }
        class.free_head.set(node.as_ptr());
        class.free_count.set(class.free_count.get() + 1);
    }
}

// SAFETY: Blocks come either from a class free list (previously carved,
// currently unowned) or from the internal arena (fresh, disjoint). Either
// way the returned region is valid, aligned to the class guarantee, and
// disjoint from every live allocation.
unsafe impl Allocator for MultipoolAllocator<'_> {
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<[u8]>> {
        if layout.size() == 0 {
            let ptr = NonNull::<u8>::dangling();
            return Ok(NonNull::slice_from_raw_parts(ptr, 0));
        }

        let Some(class) = self.class_for(layout.size()) else {
            return match self.policy {
                OversizePolicy::Reject => Err(AllocError::allocation_too_large(
                    layout.size(),
                    self.max_block_size(),
                )),
                // Oversize fallback blocks bypass the free lists entirely.
                OversizePolicy::Fallback => {
                    // SAFETY: forwarded from our caller, same contract.
                    let ptr = unsafe { self.arena.allocate(layout)? };
                    self.oversize_bytes
                        .set(self.oversize_bytes.get() + layout.size());
                    Ok(ptr)
                }
            };
        };

        if layout.align() > class.block_align {
            return Err(AllocError::invalid_layout(
                "alignment exceeds size class guarantee",
            ));
        }

        let ptr = match self.pop_free(class) {
            Some(ptr) => {
                if let Some(pattern) = self.config.alloc_pattern {
                    // SAFETY: the block was free; its stride bytes belong
                    // to the new owner now.
                    unsafe {
                        core::ptr::write_bytes(ptr.as_ptr(), pattern, class.stride);
                    }
                }
                ptr
            }
            None => {
                let ptr = self.arena.try_bump(class.stride, class.block_align)?;
                class.carved.set(class.carved.get() + 1);
                ptr
            }
        };

        Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }

        let Some(class) = self.class_for(layout.size()) else {
            // Oversize fallback block: arena semantics, reclaimed on reset.
            return;
        };

        debug_assert!(
            self.arena.contains(ptr.as_ptr()),
            "pointer does not belong to this allocator"
        );
        debug_assert!(
            ptr.as_ptr() as usize % class.block_align == 0,
            "pointer is not aligned to its size class"
        );

        self.push_free(class, ptr);
    }
}

impl MemoryUsage for MultipoolAllocator<'_> {
    /// Bytes in blocks currently owned by callers, plus unreclaimed
    /// oversize fallback bytes. Carve padding between classes is not
    /// counted as used.
    fn used_memory(&self) -> usize {
        let in_use: usize = self
            .classes
            .iter()
            .map(|class| (class.carved.get() - class.free_count.get()) * class.stride)
            .sum();
        in_use + self.oversize_bytes.get()
    }

    fn available_memory(&self) -> Option<usize> {
        let free_bytes: usize = self
            .classes
            .iter()
            .map(|class| class.free_count.get() * class.stride)
            .sum();
        Some(self.arena.available() + free_bytes)
    }
}

impl Resettable for MultipoolAllocator<'_> {
    /// # Safety
    ///
    /// Caller must ensure no outstanding references to allocated memory
    /// exist; every pointer previously returned becomes invalid.
    unsafe fn reset(&self) {
        for class in &self.classes {
            class.free_head.set(core::ptr::null_mut());
            class.free_count.set(0);
            class.carved.set(0);
        }
        self.oversize_bytes.set(0);
        // SAFETY: forwarded from our caller, same contract.
        unsafe {
            self.arena.reset();
        }
    }
}

impl core::fmt::Debug for MultipoolAllocator<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MultipoolAllocator")
            .field("classes", &self.class_stats())
            .field("policy", &self.policy)
            .field("arena_used", &self.arena.used())
            .finish()
    }
}
