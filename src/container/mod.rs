//! Allocator-aware containers
//!
//! Containers that take every allocation from an [`AllocHandle`] instead of
//! the global heap. Both are deliberately minimal: enough surface for the
//! benchmark workloads, with fallible `try_*` operations wherever memory is
//! acquired.
//!
//! [`AllocHandle`]: crate::handle::AllocHandle

mod list;
mod vec;

pub use list::{Iter as ListIter, PoolList};
pub use vec::PoolVec;
