//! Pooled memory allocation strategies and the containers to exercise them
//!
//! This crate provides fixed-capacity allocation strategies built for
//! head-to-head benchmarking against the process heap:
//!
//! - Monotonic (bump) arena allocation
//! - Overaligned bump allocation with padding accounting
//! - Multipool allocation over segregated free lists
//! - Allocator-aware containers (dynamic array, doubly-linked list)
//!
//! # Features
//!
//! - `logging` (default): Emits diagnostics through `tracing` on allocation
//!   failures
//!
//! # Example
//!
//! ```
//! use poolkit::allocator::BumpAllocator;
//! use poolkit::container::PoolVec;
//! use poolkit::handle::AllocHandle;
//! use poolkit::store::BackingStore;
//!
//! fn main() -> poolkit::Result<()> {
//!     let store = BackingStore::new(4096)?;
//!     let arena = BumpAllocator::new(&store);
//!     let handle = AllocHandle::new(&arena);
//!
//!     let mut values = PoolVec::new(handle);
//!     for i in 0..100u32 {
//!         values.try_push(i)?;
//!     }
//!
//!     assert_eq!(values.len(), 100);
//!     assert!(arena.used() >= 400);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod allocator;
pub mod container;
pub mod error;
pub mod handle;
pub mod store;
pub mod utils;

// Re-export common types for convenience
pub use allocator::{
    AlignedBumpAllocator, AllocConfig, Allocator, BumpAllocator, MemoryUsage, MultipoolAllocator,
    OversizePolicy, Resettable, SystemAllocator, TypedAllocator,
};
pub use container::{PoolList, PoolVec};
pub use error::{MemoryError, MemoryResult};
pub use handle::AllocHandle;
pub use store::BackingStore;

/// Convenience alias matching the crate's error type
pub type Result<T> = MemoryResult<T>;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
