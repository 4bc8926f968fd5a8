//! Allocation strategies
//!
//! Every strategy implements the same [`Allocator`] trait so the containers
//! and benchmarks treat them interchangeably:
//!
//! - [`BumpAllocator`]: monotonic arena, no reclamation, cheapest possible
//!   allocation
//! - [`AlignedBumpAllocator`]: arena with a configured minimum alignment on
//!   every block
//! - [`MultipoolAllocator`]: segregated free lists over fixed size classes,
//!   with per-block reuse
//! - [`SystemAllocator`]: the process heap, as the comparison baseline

mod aligned;
mod bump;
mod config;
mod multipool;
mod system;
mod traits;

pub use aligned::AlignedBumpAllocator;
pub use bump::BumpAllocator;
pub use config::AllocConfig;
pub use multipool::{ClassStats, MultipoolAllocator, OversizePolicy, MAX_CLASS_ALIGN};
pub use system::SystemAllocator;
pub use traits::{Allocator, MemoryUsage, Resettable, TypedAllocator};
