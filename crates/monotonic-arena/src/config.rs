//! Storage configuration parameters.

use crate::error::ArenaError;
use crate::raw::BLOCK_ALIGN;

/// Default capacity of the inline buffer in bytes (8 KiB).
pub const DEFAULT_INLINE_SIZE: usize = 8 * 1024;

/// Configuration for the heap-overflow side of a storage.
///
/// The inline capacity is a const generic on the storage type; everything
/// that governs heap growth lives here. Validated when a registry is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    /// Smallest heap block requested from the system allocator, in bytes.
    ///
    /// Default: 32 KiB. Must be non-zero.
    pub min_heap_increment: usize,

    /// Multiplier applied to the previous block's capacity when a new heap
    /// block is opened.
    ///
    /// Default: 2. A value of 1 keeps every block at
    /// `max(request, min_heap_increment)`. Must be at least 1.
    pub growth_factor: usize,

    /// Upper bound on the total capacity of retained heap blocks, in bytes.
    ///
    /// `None` (the default) means growth is limited only by the system
    /// allocator.
    pub heap_limit: Option<usize>,
}

impl StorageConfig {
    /// Default minimum heap increment: 32 KiB.
    pub const DEFAULT_MIN_HEAP_INCREMENT: usize = 32 * 1024;

    /// Default growth factor for successive heap blocks.
    pub const DEFAULT_GROWTH_FACTOR: usize = 2;

    /// Create a config with default values.
    pub const fn new() -> Self {
        Self {
            min_heap_increment: Self::DEFAULT_MIN_HEAP_INCREMENT,
            growth_factor: Self::DEFAULT_GROWTH_FACTOR,
            heap_limit: None,
        }
    }

    /// Set the minimum heap increment.
    pub const fn with_min_heap_increment(mut self, bytes: usize) -> Self {
        self.min_heap_increment = bytes;
        self
    }

    /// Set the block growth factor.
    pub const fn with_growth_factor(mut self, factor: usize) -> Self {
        self.growth_factor = factor;
        self
    }

    /// Cap the total heap capacity a storage may retain.
    pub const fn with_heap_limit(mut self, bytes: usize) -> Self {
        self.heap_limit = Some(bytes);
        self
    }

    /// Check the config for values that would make growth impossible.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.min_heap_increment == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "min_heap_increment must be non-zero",
            });
        }
        if self.growth_factor == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "growth_factor must be at least 1",
            });
        }
        Ok(())
    }

    /// Capacity of the next heap block given the request size and the
    /// capacity of the most recently opened block.
    ///
    /// Rounded up to a multiple of the block alignment, so blocks coalesced
    /// by a reset pack the same requests without extra padding.
    pub(crate) fn next_block_size(&self, request: usize, last_block: usize) -> usize {
        let scaled = last_block.saturating_mul(self.growth_factor);
        let size = request.max(self.min_heap_increment).max(scaled).max(1);
        size.checked_next_multiple_of(BLOCK_ALIGN).unwrap_or(size)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new()
    }
}
