//! Error types for poolkit
//!
//! Uses thiserror for clean, idiomatic Rust error definitions. All allocator
//! and container operations report failures through [`MemoryError`]; nothing
//! is swallowed silently.

use core::alloc::Layout;
use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::{error, warn};

/// Memory management errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    // --- Allocation errors ---
    /// The underlying memory source could not satisfy the request
    #[error("memory allocation failed: {size} bytes with {align} byte alignment")]
    AllocationFailed {
        /// Requested size in bytes
        size: usize,
        /// Requested alignment
        align: usize,
    },

    /// A bounded arena ran out of space
    #[error("arena exhausted: requested {requested} bytes, {available} available")]
    ArenaExhausted {
        /// Requested size in bytes
        requested: usize,
        /// Bytes the arena still had
        available: usize,
    },

    /// The request was larger than the largest configured size class
    #[error("allocation exceeds largest size class: {size} bytes (max: {max_size})")]
    ExceedsMaxSize {
        /// Requested size in bytes
        size: usize,
        /// Largest size any class serves
        max_size: usize,
    },

    /// Size arithmetic overflowed
    #[error("size overflow during operation: {operation}")]
    SizeOverflow {
        /// What was being computed
        operation: &'static str,
    },

    /// A configured alignment was not a power of two
    #[error("invalid alignment: {alignment} (must be a power of two)")]
    InvalidAlignment {
        /// The rejected alignment value
        alignment: usize,
    },

    /// The request's layout cannot be honored by this allocator
    #[error("invalid memory layout: {reason}")]
    InvalidLayout {
        /// Why the layout was rejected
        reason: &'static str,
    },

    // --- Configuration errors ---
    /// An allocator or store was constructed with unusable parameters
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Why the configuration was rejected
        reason: &'static str,
    },
}

impl MemoryError {
    /// Check if the caller can plausibly recover by retrying with a
    /// different allocator or a larger configuration.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ArenaExhausted { .. } | Self::ExceedsMaxSize { .. }
        )
    }

    /// Error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllocationFailed { .. } => "MEM:ALLOC:FAILED",
            Self::ArenaExhausted { .. } => "MEM:ARENA:EXHAUSTED",
            Self::ExceedsMaxSize { .. } => "MEM:ALLOC:MAX",
            Self::SizeOverflow { .. } => "MEM:ALLOC:OVERFLOW",
            Self::InvalidAlignment { .. } => "MEM:ALLOC:ALIGN",
            Self::InvalidLayout { .. } => "MEM:ALLOC:LAYOUT",
            Self::InvalidConfig { .. } => "MEM:CONFIG:INVALID",
        }
    }

    // ------------------------------------------------------------------
    // Convenience constructors
    // ------------------------------------------------------------------

    /// Create allocation failed error
    pub fn allocation_failed(size: usize, align: usize) -> Self {
        #[cfg(feature = "logging")]
        error!("memory allocation failed: {size} bytes with {align} alignment");

        Self::AllocationFailed { size, align }
    }

    /// Create allocation failed error from a layout
    #[must_use]
    pub fn allocation_failed_with_layout(layout: Layout) -> Self {
        Self::allocation_failed(layout.size(), layout.align())
    }

    /// Create arena exhausted error
    pub fn arena_exhausted(requested: usize, available: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!("arena exhausted: requested {requested}, available {available}");

        Self::ArenaExhausted {
            requested,
            available,
        }
    }

    /// Create allocation too large error
    pub fn allocation_too_large(size: usize, max_size: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!("allocation exceeds largest size class: {size} > {max_size}");

        Self::ExceedsMaxSize { size, max_size }
    }

    /// Create size overflow error
    #[must_use]
    pub fn size_overflow(operation: &'static str) -> Self {
        Self::SizeOverflow { operation }
    }

    /// Create invalid alignment error
    #[must_use]
    pub fn invalid_alignment(alignment: usize) -> Self {
        Self::InvalidAlignment { alignment }
    }

    /// Create invalid layout error
    #[must_use]
    pub fn invalid_layout(reason: &'static str) -> Self {
        Self::InvalidLayout { reason }
    }

    /// Create invalid config error
    #[must_use]
    pub fn invalid_config(reason: &'static str) -> Self {
        Self::InvalidConfig { reason }
    }

    /// Check if this is an invalid alignment error
    #[must_use]
    pub fn is_invalid_alignment(&self) -> bool {
        matches!(self, Self::InvalidAlignment { .. })
    }

    /// Check if this is an exhaustion error
    #[must_use]
    pub fn is_out_of_memory(&self) -> bool {
        matches!(
            self,
            Self::ArenaExhausted { .. } | Self::AllocationFailed { .. }
        )
    }
}

/// Result type for memory operations
pub type MemoryResult<T> = core::result::Result<T, MemoryError>;

/// Alias used throughout the allocator module
pub type AllocError = MemoryError;

/// Result alias used throughout the allocator module
pub type AllocResult<T> = MemoryResult<T>;
